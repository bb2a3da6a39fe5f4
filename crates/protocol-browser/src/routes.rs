use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use protocol_common::api::{
    self, ListProtocolsParams, ProtocolDetailResponse, ProtocolListResponse, StageListResponse,
};
use protocol_common::catalogue::{Catalogue, ConsistencyReport};
use protocol_common::model::Cancer;
use protocol_common::view::BrowserState;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::AppError;
use crate::html;

type SharedCatalogue = Arc<Catalogue>;

/// Browser state as it arrives in the page query string. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub cancer: Option<String>,
    pub stage: Option<String>,
    pub protocol: Option<String>,
    pub zoom: Option<String>,
}

pub fn router(catalogue: SharedCatalogue) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/health", get(health))
        .route("/api/stages", get(stages))
        .route("/api/protocols", get(protocols))
        .route("/api/protocols/{id}", get(protocol))
        .route("/api/catalogue", get(catalogue_report))
        .layer(TraceLayer::new_for_http())
        .with_state(catalogue)
}

/// Replay the query through the state transitions, dropping anything they reject.
pub fn resolve_state(catalogue: &Catalogue, query: PageQuery) -> BrowserState {
    let stages = catalogue.stages();
    let mut state = BrowserState::new(stages);

    if let Some(cancer) = query.cancer {
        match cancer.parse::<Cancer>() {
            Ok(cancer) => state.select_category(stages, cancer),
            Err(e) => debug!(error = %e, "ignoring category"),
        }
    }
    if let Some(stage) = query.stage.filter(|s| !s.trim().is_empty()) {
        state.select_stage(stage);
    }
    if let Some(id) = query.protocol {
        match catalogue.get(&id) {
            Some(record) => state.open_detail(record),
            None => debug!(protocol = %id, "ignoring unknown protocol"),
        }
    }
    if let Some(image) = query.zoom {
        if let Err(e) = state.open_zoom(catalogue, &image) {
            debug!(error = %e, "ignoring zoom");
        }
    }
    state
}

async fn page(
    State(catalogue): State<SharedCatalogue>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Html<String> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            debug!(error = %e, "ignoring malformed page query");
            PageQuery::default()
        }
    };
    let state = resolve_state(&catalogue, query);
    Html(html::page(&catalogue, &state))
}

async fn health() -> &'static str {
    "OK"
}

async fn stages(State(catalogue): State<SharedCatalogue>) -> Json<StageListResponse> {
    Json(api::stage_list(&catalogue))
}

async fn protocols(
    State(catalogue): State<SharedCatalogue>,
    Query(params): Query<ListProtocolsParams>,
) -> Result<Json<ProtocolListResponse>, AppError> {
    Ok(Json(api::list_protocols(&catalogue, &params)?))
}

async fn protocol(
    State(catalogue): State<SharedCatalogue>,
    Path(id): Path<String>,
) -> Result<Json<ProtocolDetailResponse>, AppError> {
    api::protocol_detail(&catalogue, &id)
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

async fn catalogue_report(State(catalogue): State<SharedCatalogue>) -> Json<ConsistencyReport> {
    Json(catalogue.report())
}
