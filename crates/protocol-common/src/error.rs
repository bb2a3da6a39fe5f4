/// Error types shared across the protocol catalogue crates.
///
/// These errors describe a catalogue document that cannot be loaded. Browsing a loaded
/// catalogue never fails; binary crates define their own `AppError` and wrap
/// `CommonError` via `#[from]`.
use crate::catalogue::StageOffender;
use crate::model::Cancer;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("catalogue document is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown stage policy: {0} (expected 'strict' or 'warn')")]
    UnknownPolicy(String),

    #[error("category {0} has no stages")]
    EmptyStages(Cancer),

    #[error("protocol {id}: {message}")]
    InvalidRecord { id: String, message: String },

    #[error("duplicate protocol id: {0}")]
    DuplicateId(String),

    #[error(
        "{} protocol(s) use a stage outside their category's timeline: {}",
        .0.len(),
        list_offenders(.0)
    )]
    UnknownStages(Vec<StageOffender>),
}

fn list_offenders(offenders: &[StageOffender]) -> String {
    offenders
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
