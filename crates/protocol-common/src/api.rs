use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;
use crate::error::CommonError;
use crate::model::{Cancer, ProtocolRecord};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListProtocolsParams {
    /// Cancer category: "Prostate", "Vessie" (bladder) or "Rein" (kidney).
    pub cancer: String,
    /// Stage label on the category timeline (default: the first stage).
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetProtocolParams {
    /// Stable protocol ID such as "pr25" or "mk5684_003".
    pub protocol_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryStages {
    pub cancer: Cancer,
    pub stages: Vec<String>,
    pub protocol_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StageListResponse {
    pub categories: Vec<CategoryStages>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProtocolSummary {
    pub id: String,
    pub title: String,
    pub stage: String,
    pub phase: Option<String>,
    pub randomized: bool,
    pub blinding: Option<String>,
    pub suspended: bool,
    pub design_short: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProtocolListResponse {
    pub cancer: Cancer,
    pub stage: String,
    pub protocols: Vec<ProtocolSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProtocolDetailResponse {
    pub revision: String,
    pub protocol: ProtocolRecord,
}

impl From<&ProtocolRecord> for ProtocolSummary {
    fn from(p: &ProtocolRecord) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            stage: p.stage.clone(),
            phase: p.phase.clone(),
            randomized: p.randomized,
            blinding: p.blinding.map(|b| b.label().to_string()),
            suspended: p.suspended,
            design_short: p.design_short.clone(),
            highlights: p.highlights.clone(),
        }
    }
}

pub fn stage_list(catalogue: &Catalogue) -> StageListResponse {
    let report = catalogue.report();
    let categories = catalogue
        .stages()
        .iter()
        .map(|(cancer, stages)| CategoryStages {
            cancer,
            stages: stages.to_vec(),
            protocol_count: report
                .categories
                .iter()
                .find(|c| c.cancer == cancer)
                .map_or(0, |c| c.protocol_count),
        })
        .collect();
    StageListResponse { categories }
}

/// Cards for a category and stage; the stage defaults to the first on the timeline.
pub fn list_protocols(
    catalogue: &Catalogue,
    params: &ListProtocolsParams,
) -> Result<ProtocolListResponse, CommonError> {
    let cancer: Cancer = params.cancer.parse()?;
    let stage = params
        .stage
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| catalogue.stages().first_stage(cancer))
        .to_string();

    let protocols = catalogue
        .filter(cancer, &stage)
        .into_iter()
        .map(ProtocolSummary::from)
        .collect();

    Ok(ProtocolListResponse {
        cancer,
        stage,
        protocols,
    })
}

pub fn protocol_detail(catalogue: &Catalogue, protocol_id: &str) -> Option<ProtocolDetailResponse> {
    let protocol_id = protocol_id.trim();
    let protocol = catalogue
        .get(protocol_id)
        .or_else(|| {
            catalogue
                .protocols()
                .iter()
                .find(|p| p.id.eq_ignore_ascii_case(protocol_id))
        })?;
    Some(ProtocolDetailResponse {
        revision: catalogue.revision().to_string(),
        protocol: protocol.clone(),
    })
}
