/// Browser selection state and its transitions.
///
/// The state is plain data (it round-trips through a query string) and refers to the
/// catalogue by protocol id and image path only. Every change goes through one of the
/// named transitions below.
use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;
use crate::model::{Cancer, ProtocolRecord, StageMap};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no protocol detail is open")]
    DetailClosed,

    #[error("protocol {protocol} has no schema image {image}")]
    UnknownImage { protocol: String, image: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserState {
    pub cancer: Cancer,
    pub stage: String,
    /// Id of the protocol whose detail overlay is open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Schema image shown in the zoom overlay; only set while a detail is open
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<String>,
}

/// Which overlay is on screen, resolved against the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay<'a> {
    Closed,
    Detail(&'a ProtocolRecord),
    Zoom {
        record: &'a ProtocolRecord,
        image: &'a str,
    },
}

impl BrowserState {
    /// Initial state: first category tab, first stage of its timeline, no overlay.
    pub fn new(stages: &StageMap) -> Self {
        let cancer = Cancer::ALL[0];
        Self {
            cancer,
            stage: stages.first_stage(cancer).to_string(),
            protocol: None,
            zoom: None,
        }
    }

    /// Activate a category and reset the stage to the first on its timeline.
    pub fn select_category(&mut self, stages: &StageMap, cancer: Cancer) {
        self.cancer = cancer;
        self.stage = stages.first_stage(cancer).to_string();
    }

    /// Select a stage within the active category.
    pub fn select_stage(&mut self, stage: impl Into<String>) {
        self.stage = stage.into();
    }

    /// Open the detail overlay on `record`, replacing any open one.
    ///
    /// Reopening the record that is already open changes nothing.
    pub fn open_detail(&mut self, record: &ProtocolRecord) {
        if self.protocol.as_deref() == Some(record.id.as_str()) {
            return;
        }
        self.protocol = Some(record.id.clone());
        self.zoom = None;
    }

    /// Close the detail overlay and any zoom on top of it.
    pub fn close_detail(&mut self) {
        self.protocol = None;
        self.zoom = None;
    }

    /// Zoom one schema image of the open protocol.
    pub fn open_zoom(&mut self, catalogue: &Catalogue, image: &str) -> Result<(), TransitionError> {
        let record = self.detail(catalogue).ok_or(TransitionError::DetailClosed)?;
        if !record.schemas.iter().any(|s| s == image) {
            return Err(TransitionError::UnknownImage {
                protocol: record.id.clone(),
                image: image.to_string(),
            });
        }
        self.zoom = Some(image.to_string());
        Ok(())
    }

    /// Close the zoom overlay, leaving the detail overlay as it was.
    pub fn close_zoom(&mut self) {
        self.zoom = None;
    }

    /// Cards for the active category and stage.
    pub fn visible<'a>(&self, catalogue: &'a Catalogue) -> Vec<&'a ProtocolRecord> {
        catalogue.filter(self.cancer, &self.stage)
    }

    /// The protocol whose detail is open, if it exists in `catalogue`.
    pub fn detail<'a>(&self, catalogue: &'a Catalogue) -> Option<&'a ProtocolRecord> {
        self.protocol.as_deref().and_then(|id| catalogue.get(id))
    }

    pub fn overlay<'a>(&self, catalogue: &'a Catalogue) -> Overlay<'a> {
        let Some(record) = self.detail(catalogue) else {
            return Overlay::Closed;
        };
        let image = self
            .zoom
            .as_deref()
            .and_then(|zoom| record.schemas.iter().find(|s| s.as_str() == zoom))
            .map(String::as_str);
        match image {
            Some(image) => Overlay::Zoom { record, image },
            None => Overlay::Detail(record),
        }
    }
}
