use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// Cancer category. The set is closed and [`Cancer::ALL`] gives the tab order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Cancer {
    Prostate,
    #[serde(rename = "Vessie")]
    Bladder,
    #[serde(rename = "Rein")]
    Kidney,
}

impl Cancer {
    pub const ALL: [Cancer; 3] = [Cancer::Prostate, Cancer::Bladder, Cancer::Kidney];

    /// Label shown on the category tab and used in the catalogue document.
    pub fn label(self) -> &'static str {
        match self {
            Cancer::Prostate => "Prostate",
            Cancer::Bladder => "Vessie",
            Cancer::Kidney => "Rein",
        }
    }
}

impl fmt::Display for Cancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cancer {
    type Err = CommonError;

    /// Accepts the catalogue label or the English name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Cancer::ALL
            .into_iter()
            .find(|c| {
                c.label().eq_ignore_ascii_case(s) || format!("{c:?}").eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| CommonError::UnknownCategory(s.to_string()))
    }
}

/// Blinding of a trial arm assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Blinding {
    #[serde(rename = "Open-label", alias = "Ouvert")]
    OpenLabel,
    #[serde(rename = "Single-blind", alias = "Simple-insu")]
    SingleBlind,
    #[serde(rename = "Double-insu", alias = "Double-blind")]
    DoubleBlind,
}

impl Blinding {
    pub fn label(self) -> &'static str {
        match self {
            Blinding::OpenLabel => "Open-label",
            Blinding::SingleBlind => "Single-blind",
            Blinding::DoubleBlind => "Double-insu",
        }
    }
}

impl fmt::Display for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Study contact (usually the research nurse). Either part may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// A single study in the catalogue, in canonical shape.
///
/// Absent optional data is `None` for scalars and an empty `Vec` for lists; blank
/// strings never survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProtocolRecord {
    /// Stable identifier, e.g. "pr25", "mk5684_003"
    pub id: String,
    pub cancer: Cancer,
    /// Stage label; expected to be one of the category's timeline stages
    pub stage: String,
    pub title: String,
    /// Trial phase label, e.g. "Phase III", "Observationnelle"
    pub phase: Option<String>,
    pub randomized: bool,
    pub blinding: Option<Blinding>,
    /// Recruitment halted
    pub suspended: bool,
    /// One-line design text shown on the card
    pub design_short: String,
    /// Full design text shown in the detail overlay
    pub design_full: String,
    pub population: String,
    /// Inclusion criteria, never empty
    pub inclusion: Vec<String>,
    pub exclusion: Vec<String>,
    pub primary_endpoints: Vec<String>,
    pub secondary_endpoints: Vec<String>,
    /// Short tags shown on the card
    pub highlights: Vec<String>,
    /// Study schema image paths, in display order
    pub schemas: Vec<String>,
    /// Path to the full protocol document (PDF)
    pub protocol_document: Option<String>,
    pub contact: Option<Contact>,
}

/// Ordered stage timeline per cancer category.
///
/// Every category in [`Cancer::ALL`] has at least one stage; the first one is the
/// default when the category is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMap {
    stages: BTreeMap<Cancer, Vec<String>>,
}

impl StageMap {
    pub fn new(stages: BTreeMap<Cancer, Vec<String>>) -> Result<Self, CommonError> {
        for cancer in Cancer::ALL {
            if stages.get(&cancer).map_or(true, |s| s.is_empty()) {
                return Err(CommonError::EmptyStages(cancer));
            }
        }
        Ok(Self { stages })
    }

    pub fn stages(&self, cancer: Cancer) -> &[String] {
        self.stages.get(&cancer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first_stage(&self, cancer: Cancer) -> &str {
        self.stages(cancer)
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn contains(&self, cancer: Cancer, stage: &str) -> bool {
        self.stages(cancer).iter().any(|s| s == stage)
    }

    /// Categories in tab order with their stages.
    pub fn iter(&self) -> impl Iterator<Item = (Cancer, &[String])> {
        self.stages.iter().map(|(c, s)| (*c, s.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_map() -> StageMap {
        StageMap::new(BTreeMap::from([
            (Cancer::Prostate, vec!["Localisé".to_string(), "mCRPC".to_string()]),
            (Cancer::Bladder, vec!["NMIBC".to_string()]),
            (Cancer::Kidney, vec!["Localisé".to_string()]),
        ]))
        .unwrap()
    }

    #[test]
    fn parse_cancer_labels() {
        assert_eq!("Prostate".parse::<Cancer>().unwrap(), Cancer::Prostate);
        assert_eq!("vessie".parse::<Cancer>().unwrap(), Cancer::Bladder);
        assert_eq!(" REIN ".parse::<Cancer>().unwrap(), Cancer::Kidney);
        assert_eq!("kidney".parse::<Cancer>().unwrap(), Cancer::Kidney);
        assert!(matches!(
            "Poumon".parse::<Cancer>(),
            Err(CommonError::UnknownCategory(c)) if c == "Poumon"
        ));
    }

    #[test]
    fn cancer_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Cancer::Bladder).unwrap(), "\"Vessie\"");
        let c: Cancer = serde_json::from_str("\"Rein\"").unwrap();
        assert_eq!(c, Cancer::Kidney);
    }

    #[test]
    fn blinding_accepts_english_double_blind() {
        let b: Blinding = serde_json::from_str("\"Double-blind\"").unwrap();
        assert_eq!(b, Blinding::DoubleBlind);
        assert_eq!(b.label(), "Double-insu");
    }

    #[test]
    fn stage_map_first_stage() {
        let map = stage_map();
        assert_eq!(map.first_stage(Cancer::Prostate), "Localisé");
        assert_eq!(map.first_stage(Cancer::Bladder), "NMIBC");
        assert!(map.contains(Cancer::Prostate, "mCRPC"));
        assert!(!map.contains(Cancer::Bladder, "mCRPC"));
    }

    #[test]
    fn stage_map_iterates_in_tab_order() {
        let order: Vec<Cancer> = stage_map().iter().map(|(c, _)| c).collect();
        assert_eq!(order, Cancer::ALL.to_vec());
    }

    #[test]
    fn stage_map_rejects_missing_or_empty_category() {
        let missing = StageMap::new(BTreeMap::from([
            (Cancer::Prostate, vec!["mCRPC".to_string()]),
            (Cancer::Bladder, vec!["NMIBC".to_string()]),
        ]));
        assert!(matches!(missing, Err(CommonError::EmptyStages(Cancer::Kidney))));

        let empty = StageMap::new(BTreeMap::from([
            (Cancer::Prostate, vec![]),
            (Cancer::Bladder, vec!["NMIBC".to_string()]),
            (Cancer::Kidney, vec!["Localisé".to_string()]),
        ]));
        assert!(matches!(empty, Err(CommonError::EmptyStages(Cancer::Prostate))));
    }
}
