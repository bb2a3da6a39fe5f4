/// MCP server exposing the research protocol catalogue.
///
/// Exposes four read-only tools:
/// - `list_stages`: Category tabs with their stage timelines
/// - `list_protocols`: Protocol cards for a category and stage
/// - `get_protocol`: Full record for one protocol ID
/// - `check_catalogue`: Revision and consistency report of the loaded catalogue
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::debug;

use protocol_common::api::{
    self, GetProtocolParams, ListProtocolsParams, ProtocolDetailResponse, ProtocolListResponse,
    StageListResponse,
};
use protocol_common::catalogue::{Catalogue, ConsistencyReport};

#[derive(Clone)]
pub struct ProtocolCatalogueServer {
    catalogue: Arc<Catalogue>,
    tool_router: ToolRouter<ProtocolCatalogueServer>,
}

impl ProtocolCatalogueServer {
    pub fn new(catalogue: Arc<Catalogue>) -> Self {
        Self {
            catalogue,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl ProtocolCatalogueServer {
    #[tool(description = "List the cancer categories (Prostate, Vessie, Rein) with their stage timelines in display order and the number of protocols in each.")]
    async fn list_stages(&self) -> Result<Json<StageListResponse>, String> {
        Ok(Json(api::stage_list(&self.catalogue)))
    }

    #[tool(description = "List the research protocols filed under a cancer category and stage, sorted by title. The stage defaults to the first one on the category timeline.")]
    async fn list_protocols(
        &self,
        Parameters(params): Parameters<ListProtocolsParams>,
    ) -> Result<Json<ProtocolListResponse>, String> {
        if params.cancer.trim().is_empty() {
            return Err("cancer must not be empty".to_string());
        }
        let response = api::list_protocols(&self.catalogue, &params).map_err(|e| {
            let available: Vec<String> = self
                .catalogue
                .stages()
                .iter()
                .map(|(cancer, _)| cancer.to_string())
                .collect();
            format!("{e}. Available categories: {}", available.join(", "))
        })?;
        debug!(
            cancer = %response.cancer,
            stage = %response.stage,
            protocols = response.protocols.len(),
            "listed protocols"
        );
        Ok(Json(response))
    }

    #[tool(description = "Get the full record of a research protocol by ID (e.g. 'pr25', 'mk5684_003'): design, population, endpoints, inclusion and exclusion criteria, schema images, protocol document and nurse contact.")]
    async fn get_protocol(
        &self,
        Parameters(params): Parameters<GetProtocolParams>,
    ) -> Result<Json<ProtocolDetailResponse>, String> {
        let protocol_id = params.protocol_id.trim();
        if protocol_id.is_empty() {
            return Err("protocol_id must not be empty".to_string());
        }
        api::protocol_detail(&self.catalogue, protocol_id)
            .map(Json)
            .ok_or_else(|| format!("protocol not found: {protocol_id}"))
    }

    #[tool(description = "Report the loaded catalogue revision, protocol counts per category and any protocol filed under a stage missing from its category timeline.")]
    async fn check_catalogue(&self) -> Result<Json<ConsistencyReport>, String> {
        Ok(Json(self.catalogue.report()))
    }
}

#[tool_handler]
impl ServerHandler for ProtocolCatalogueServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "protocol-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Urology research protocol catalogue. Use list_stages to see the \
                 categories and their stage timelines, list_protocols to browse the \
                 studies at one stage, get_protocol for the full record of a study, \
                 and check_catalogue to verify which catalogue revision is loaded."
                    .to_string(),
            ),
        }
    }
}
