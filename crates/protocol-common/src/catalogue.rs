/// The protocol catalogue: every study record plus the stage timelines.
///
/// Built once from the catalogue document and never mutated. The per-(category, stage)
/// card lists are derived at load time, so `filter` is a lookup and always reflects the
/// loaded records.
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::CommonError;
use crate::model::{Cancer, ProtocolRecord, StageMap};
use crate::normalize::{self, RawCatalogue};

/// Catalogue document compiled into the binary.
pub const EMBEDDED_CATALOGUE: &str = include_str!("../data/protocols.json");

/// What to do with records whose stage is not on their category's timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StagePolicy {
    /// Refuse to load, listing every offending record.
    #[default]
    Strict,
    /// Log each offending record and keep it. It is reachable by id only.
    Warn,
}

impl FromStr for StagePolicy {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StagePolicy::Strict),
            "warn" => Ok(StagePolicy::Warn),
            other => Err(CommonError::UnknownPolicy(other.to_string())),
        }
    }
}

/// A record whose stage label is not part of its category's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageOffender {
    pub id: String,
    pub cancer: Cancer,
    pub stage: String,
}

impl fmt::Display for StageOffender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} / {})", self.id, self.cancer, self.stage)
    }
}

/// Number of records filed under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryCount {
    pub cancer: Cancer,
    pub protocol_count: usize,
}

/// Load-time consistency summary of a catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConsistencyReport {
    /// SHA-256 of the catalogue document, lowercase hex
    pub revision: String,
    pub protocol_count: usize,
    pub categories: Vec<CategoryCount>,
    /// Records kept under [`StagePolicy::Warn`] despite an unknown stage
    pub offenders: Vec<StageOffender>,
}

#[derive(Debug)]
pub struct Catalogue {
    protocols: Vec<ProtocolRecord>,
    stages: StageMap,
    by_id: HashMap<String, usize>,
    by_stage: HashMap<Cancer, HashMap<String, Vec<usize>>>,
    offenders: Vec<StageOffender>,
    revision: String,
}

impl Catalogue {
    /// Load the embedded catalogue document.
    pub fn embedded(policy: StagePolicy) -> Result<Self, CommonError> {
        Self::from_json(EMBEDDED_CATALOGUE, policy)
    }

    /// Load the catalogue at `path`, or the embedded one when `path` is `None`.
    pub fn load(path: Option<&Path>, policy: StagePolicy) -> Result<Self, CommonError> {
        match path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| CommonError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&source, policy)
            }
            None => Self::embedded(policy),
        }
    }

    /// Parse and normalize a catalogue document.
    pub fn from_json(source: &str, policy: StagePolicy) -> Result<Self, CommonError> {
        let raw: RawCatalogue = serde_json::from_str(source)?;
        let stages = normalize::stage_map(raw.stages)?;
        let protocols = raw
            .protocols
            .into_iter()
            .map(normalize::record)
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(protocols, stages, revision_of(source.as_bytes()), policy)
    }

    /// Build a catalogue from records that are already in canonical shape.
    pub fn from_records(
        protocols: Vec<ProtocolRecord>,
        stages: StageMap,
        policy: StagePolicy,
    ) -> Result<Self, CommonError> {
        let bytes = serde_json::to_vec(&protocols)?;
        Self::build(protocols, stages, revision_of(&bytes), policy)
    }

    fn build(
        protocols: Vec<ProtocolRecord>,
        stages: StageMap,
        revision: String,
        policy: StagePolicy,
    ) -> Result<Self, CommonError> {
        let mut by_id = HashMap::with_capacity(protocols.len());
        for (idx, p) in protocols.iter().enumerate() {
            if by_id.insert(p.id.clone(), idx).is_some() {
                return Err(CommonError::DuplicateId(p.id.clone()));
            }
        }

        let offenders: Vec<StageOffender> = protocols
            .iter()
            .filter(|p| !stages.contains(p.cancer, &p.stage))
            .map(|p| StageOffender {
                id: p.id.clone(),
                cancer: p.cancer,
                stage: p.stage.clone(),
            })
            .collect();

        if !offenders.is_empty() {
            match policy {
                StagePolicy::Strict => return Err(CommonError::UnknownStages(offenders)),
                StagePolicy::Warn => {
                    for o in &offenders {
                        warn!(
                            protocol = %o.id,
                            cancer = %o.cancer,
                            stage = %o.stage,
                            "stage not on the category timeline, protocol hidden from browsing"
                        );
                    }
                }
            }
        }

        let mut by_stage: HashMap<Cancer, HashMap<String, Vec<usize>>> = HashMap::new();
        for (idx, p) in protocols.iter().enumerate() {
            if !stages.contains(p.cancer, &p.stage) {
                continue;
            }
            by_stage
                .entry(p.cancer)
                .or_default()
                .entry(p.stage.clone())
                .or_default()
                .push(idx);
        }
        for indices in by_stage.values_mut().flat_map(|m| m.values_mut()) {
            indices.sort_by(|&a, &b| title_order(&protocols[a], &protocols[b]));
        }

        info!(
            protocols = protocols.len(),
            revision = %revision,
            "catalogue loaded"
        );

        Ok(Self {
            protocols,
            stages,
            by_id,
            by_stage,
            offenders,
            revision,
        })
    }

    /// All records, in document order.
    pub fn protocols(&self) -> &[ProtocolRecord] {
        &self.protocols
    }

    pub fn stages(&self) -> &StageMap {
        &self.stages
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolRecord> {
        self.by_id.get(id).map(|&idx| &self.protocols[idx])
    }

    /// Records filed under `cancer` and `stage`, sorted by title then id.
    ///
    /// A stage that is not on the category's timeline simply has no records.
    pub fn filter(&self, cancer: Cancer, stage: &str) -> Vec<&ProtocolRecord> {
        self.by_stage
            .get(&cancer)
            .and_then(|stages| stages.get(stage))
            .map(|indices| indices.iter().map(|&idx| &self.protocols[idx]).collect())
            .unwrap_or_default()
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn offenders(&self) -> &[StageOffender] {
        &self.offenders
    }

    pub fn report(&self) -> ConsistencyReport {
        ConsistencyReport {
            revision: self.revision.clone(),
            protocol_count: self.protocols.len(),
            categories: Cancer::ALL
                .into_iter()
                .map(|cancer| CategoryCount {
                    cancer,
                    protocol_count: self.protocols.iter().filter(|p| p.cancer == cancer).count(),
                })
                .collect(),
            offenders: self.offenders.clone(),
        }
    }
}

fn revision_of(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Title order for cards: case- and accent-insensitive first, then exact title, then id.
fn title_order(a: &ProtocolRecord, b: &ProtocolRecord) -> std::cmp::Ordering {
    collation_key(&a.title)
        .cmp(&collation_key(&b.title))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Folds case and the Latin diacritics used in French so "Étude" sorts next to "etude".
fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' => key.push('a'),
            'ç' => key.push('c'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'î' | 'ï' | 'í' => key.push('i'),
            'ô' | 'ö' | 'ó' => key.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => key.push('u'),
            'ÿ' => key.push('y'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            _ => key.push(c),
        }
    }
    key
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    pub(crate) fn stage_map() -> StageMap {
        StageMap::new(BTreeMap::from([
            (
                Cancer::Prostate,
                vec!["Localisé".to_string(), "mHSPC".to_string(), "mCRPC".to_string()],
            ),
            (Cancer::Bladder, vec!["NMIBC".to_string(), "Métastatique".to_string()]),
            (Cancer::Kidney, vec!["Localisé".to_string()]),
        ]))
        .unwrap()
    }

    pub(crate) fn record(id: &str, cancer: Cancer, stage: &str, title: &str) -> ProtocolRecord {
        ProtocolRecord {
            id: id.to_string(),
            cancer,
            stage: stage.to_string(),
            title: title.to_string(),
            phase: None,
            randomized: false,
            blinding: None,
            suspended: false,
            design_short: format!("{title} design"),
            design_full: format!("{title} full design"),
            population: format!("{title} population"),
            inclusion: vec!["Âge ≥ 18 ans".to_string()],
            exclusion: Vec::new(),
            primary_endpoints: Vec::new(),
            secondary_endpoints: Vec::new(),
            highlights: Vec::new(),
            schemas: Vec::new(),
            protocol_document: None,
            contact: None,
        }
    }

    #[test]
    fn embedded_catalogue_loads_strict() {
        let catalogue = Catalogue::embedded(StagePolicy::Strict).expect("embedded catalogue");
        assert_eq!(catalogue.protocols().len(), 16);
        assert!(catalogue.offenders().is_empty());
        assert_eq!(catalogue.revision().len(), 64);

        let pr25 = catalogue.get("pr25").expect("pr25");
        assert_eq!(pr25.title, "PR.25");
        assert_eq!(pr25.stage, "mCRPC");

        // The only list-valued primary endpoint in the document
        let mk3120 = catalogue.get("mk3120").expect("mk3120");
        assert_eq!(mk3120.cancer, Cancer::Bladder);
        assert_eq!(mk3120.primary_endpoints.len(), 3);
        assert_eq!(mk3120.highlights.len(), 3);
        assert!(!mk3120.suspended);

        let socratic = catalogue.get("socratic").expect("socratic");
        assert!(socratic.schemas.is_empty());
        assert!(socratic.protocol_document.is_some());
    }

    #[test]
    fn embedded_catalogue_filters_prostate_mcrpc_by_title() {
        let catalogue = Catalogue::embedded(StagePolicy::Strict).unwrap();
        let titles: Vec<&str> = catalogue
            .filter(Cancer::Prostate, "mCRPC")
            .into_iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "4TMPO",
                "MK-5684-004",
                "Pasritamig + Docetaxel (PCR3003)",
                "PR.25",
                "PRODIGY-2",
            ]
        );
    }

    #[test]
    fn filter_unknown_stage_is_empty() {
        let catalogue = Catalogue::embedded(StagePolicy::Strict).unwrap();
        assert!(catalogue.filter(Cancer::Prostate, "NMIBC").is_empty());
        assert!(catalogue.filter(Cancer::Kidney, "Métastatique").is_empty());
        assert!(catalogue.filter(Cancer::Kidney, "").is_empty());
    }

    #[test]
    fn strict_policy_rejects_unknown_stage() {
        let records = vec![
            record("a", Cancer::Prostate, "mCRPC", "A"),
            record("b", Cancer::Prostate, "mCRPC 2L", "B"),
            record("c", Cancer::Bladder, "MIBC", "C"),
        ];
        let err = Catalogue::from_records(records, stage_map(), StagePolicy::Strict).unwrap_err();
        match err {
            CommonError::UnknownStages(offenders) => {
                let ids: Vec<&str> = offenders.iter().map(|o| o.id.as_str()).collect();
                assert_eq!(ids, vec!["b", "c"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn warn_policy_keeps_offenders_reachable_by_id() {
        let records = vec![
            record("a", Cancer::Prostate, "mCRPC", "A"),
            record("b", Cancer::Prostate, "mCRPC 2L", "B"),
        ];
        let catalogue = Catalogue::from_records(records, stage_map(), StagePolicy::Warn).unwrap();
        assert_eq!(catalogue.offenders().len(), 1);
        assert!(catalogue.get("b").is_some());
        assert_eq!(catalogue.filter(Cancer::Prostate, "mCRPC").len(), 1);
        assert!(catalogue.filter(Cancer::Prostate, "mCRPC 2L").is_empty());

        let report = catalogue.report();
        assert_eq!(report.protocol_count, 2);
        assert_eq!(report.offenders[0].stage, "mCRPC 2L");
        assert_eq!(report.categories[0].protocol_count, 2);
        assert_eq!(report.categories[1].protocol_count, 0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let records = vec![
            record("a", Cancer::Prostate, "mCRPC", "A"),
            record("a", Cancer::Kidney, "Localisé", "A bis"),
        ];
        let err = Catalogue::from_records(records, stage_map(), StagePolicy::Warn).unwrap_err();
        assert!(matches!(err, CommonError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn titles_sort_ignoring_case_and_accents() {
        let records = vec![
            record("3", Cancer::Kidney, "Localisé", "zeta"),
            record("1", Cancer::Kidney, "Localisé", "Étude B"),
            record("2", Cancer::Kidney, "Localisé", "etude a"),
            record("0", Cancer::Kidney, "Localisé", "Alpha"),
        ];
        let catalogue = Catalogue::from_records(records, stage_map(), StagePolicy::Strict).unwrap();
        let ids: Vec<&str> = catalogue
            .filter(Cancer::Kidney, "Localisé")
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["0", "2", "1", "3"]);
    }

    #[test]
    fn equal_titles_tie_break_by_id() {
        let records = vec![
            record("b", Cancer::Kidney, "Localisé", "Same"),
            record("a", Cancer::Kidney, "Localisé", "Same"),
        ];
        let catalogue = Catalogue::from_records(records, stage_map(), StagePolicy::Strict).unwrap();
        let ids: Vec<&str> = catalogue
            .filter(Cancer::Kidney, "Localisé")
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Catalogue::load(Some(Path::new("/nonexistent/protocols.json")), StagePolicy::Strict)
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/protocols.json"));
    }

    #[test]
    fn parse_stage_policy() {
        assert_eq!("strict".parse::<StagePolicy>().unwrap(), StagePolicy::Strict);
        assert_eq!(" WARN ".parse::<StagePolicy>().unwrap(), StagePolicy::Warn);
        assert!("lenient".parse::<StagePolicy>().is_err());
    }

    fn arb_record() -> impl Strategy<Value = ProtocolRecord> {
        let cancer = prop::sample::select(Cancer::ALL.to_vec());
        let stage = prop::sample::select(vec!["Localisé", "mHSPC", "mCRPC", "NMIBC", "Métastatique"]);
        let title = "[A-Za-zÉé .-]{1,12}";
        (cancer, stage, title).prop_map(|(c, s, t)| record("", c, s, &t))
    }

    proptest! {
        /// `filter` returns exactly the brute-force match set, in title order, and
        /// nothing for stages off the category's timeline.
        #[test]
        fn filter_matches_brute_force(
            mut records in prop::collection::vec(arb_record(), 0..24),
            cancer in prop::sample::select(Cancer::ALL.to_vec()),
            stage in prop::sample::select(vec!["Localisé", "mHSPC", "mCRPC", "NMIBC", "MIBC"]),
        ) {
            for (i, r) in records.iter_mut().enumerate() {
                r.id = format!("p{i:02}");
            }
            let catalogue = Catalogue::from_records(records.clone(), stage_map(), StagePolicy::Warn).unwrap();

            let mut expected: Vec<&ProtocolRecord> = records
                .iter()
                .filter(|r| r.cancer == cancer && r.stage == stage)
                .filter(|r| stage_map().contains(r.cancer, &r.stage))
                .collect();
            expected.sort_by(|a, b| title_order(a, b));

            let actual = catalogue.filter(cancer, stage);
            prop_assert_eq!(actual, expected);
        }
    }
}
