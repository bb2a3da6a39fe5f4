/// Normalization of the catalogue document into canonical records.
///
/// The document has grown several shapes for the same data over time:
/// - population: `population` | `populationFull` | `populationShort`
/// - full protocol link: `protocolUrl` | `protocolPdf`
/// - endpoints: a single string or a list
/// - card tags: `cardHighlights` | `highlights`
/// - contact: `nurse` | `contact`
///
/// Everything is folded into [`ProtocolRecord`] here, once, so rendering only ever
/// checks `Option`/empty-list absence. Blank strings and blank list items are dropped.
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CommonError;
use crate::model::{Blinding, Cancer, Contact, ProtocolRecord, StageMap};

/// Top-level shape of the catalogue document.
#[derive(Debug, Deserialize)]
pub struct RawCatalogue {
    /// Category label to ordered stage labels
    pub stages: BTreeMap<String, Vec<String>>,
    pub protocols: Vec<RawProtocol>,
}

/// One protocol as written in the catalogue document, before normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProtocol {
    pub id: String,
    pub cancer: String,
    pub stage: String,
    pub title: String,
    pub phase: Option<String>,
    pub randomized: Option<bool>,
    pub blinding: Option<Blinding>,
    pub suspended: Option<bool>,
    #[serde(alias = "design")]
    pub design_short: Option<String>,
    pub design_full: Option<String>,
    pub population: Option<String>,
    pub population_short: Option<String>,
    pub population_full: Option<String>,
    #[serde(default)]
    pub inclusion: Vec<String>,
    #[serde(default)]
    pub exclusion: Vec<String>,
    #[serde(alias = "primaryEndpoints")]
    pub primary_endpoint: Option<OneOrMany>,
    #[serde(alias = "secondaryEndpoint")]
    pub secondary_endpoints: Option<OneOrMany>,
    #[serde(default, alias = "highlights")]
    pub card_highlights: Vec<String>,
    #[serde(default)]
    pub schema_src: Vec<String>,
    pub protocol_url: Option<String>,
    pub protocol_pdf: Option<String>,
    #[serde(alias = "contact")]
    pub nurse: Option<RawContact>,
}

#[derive(Debug, Deserialize)]
pub struct RawContact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// A text field that older entries write as a string and newer ones as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Build the stage map, rejecting unknown category labels and empty timelines.
pub fn stage_map(raw: BTreeMap<String, Vec<String>>) -> Result<StageMap, CommonError> {
    let mut stages = BTreeMap::new();
    for (label, sequence) in raw {
        let cancer: Cancer = label.parse()?;
        stages.insert(cancer, items(sequence));
    }
    StageMap::new(stages)
}

/// Fold one raw entry into the canonical record shape.
///
/// Stage membership is not checked here; see [`crate::catalogue::Catalogue`].
pub fn record(raw: RawProtocol) -> Result<ProtocolRecord, CommonError> {
    let id = raw.id.trim().to_string();
    let invalid = |message: &str| CommonError::InvalidRecord {
        id: id.clone(),
        message: message.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("empty id"));
    }
    let cancer: Cancer = raw.cancer.parse()?;
    let stage = text(Some(raw.stage)).ok_or_else(|| invalid("empty stage"))?;
    let title = text(Some(raw.title)).ok_or_else(|| invalid("empty title"))?;
    let design_short = text(raw.design_short).ok_or_else(|| invalid("missing design"))?;
    let design_full = text(raw.design_full).unwrap_or_else(|| design_short.clone());
    let population = text(raw.population_full)
        .or_else(|| text(raw.population))
        .or_else(|| text(raw.population_short))
        .ok_or_else(|| invalid("missing population"))?;
    let inclusion = items(raw.inclusion);
    if inclusion.is_empty() {
        return Err(invalid("no inclusion criteria"));
    }

    let contact = raw.nurse.and_then(|c| {
        let name = text(c.name);
        let phone = text(c.phone);
        (name.is_some() || phone.is_some()).then_some(Contact { name, phone })
    });

    Ok(ProtocolRecord {
        id,
        cancer,
        stage,
        title,
        phase: text(raw.phase),
        randomized: raw.randomized.unwrap_or(false),
        blinding: raw.blinding,
        suspended: raw.suspended.unwrap_or(false),
        design_short,
        design_full,
        population,
        inclusion,
        exclusion: items(raw.exclusion),
        primary_endpoints: items(raw.primary_endpoint.map(OneOrMany::into_vec).unwrap_or_default()),
        secondary_endpoints: items(
            raw.secondary_endpoints
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
        ),
        highlights: items(raw.card_highlights),
        schemas: items(raw.schema_src),
        protocol_document: text(raw.protocol_url).or_else(|| text(raw.protocol_pdf)),
        contact,
    })
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn items(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter_map(|s| text(Some(s))).collect()
}
