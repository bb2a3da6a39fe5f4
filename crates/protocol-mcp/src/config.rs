use std::path::{Path, PathBuf};

use protocol_common::catalogue::StagePolicy;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` serves the catalogue compiled into the binary.
    pub catalogue_path: Option<PathBuf>,
    pub stage_policy: StagePolicy,
}

impl Config {
    /// Optional:
    /// - `PROTOCOL_CATALOGUE_PATH`
    /// - `PROTOCOL_CATALOGUE_POLICY` (`strict` or `warn`, default: `strict`)
    pub fn from_env() -> Result<Self, AppError> {
        let catalogue_path = std::env::var("PROTOCOL_CATALOGUE_PATH")
            .ok()
            .map(PathBuf::from);
        if let Some(path) = &catalogue_path {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "catalogue file not found: {}",
                    path.display()
                )));
            }
        }

        let stage_policy = std::env::var("PROTOCOL_CATALOGUE_POLICY")
            .ok()
            .map(|p| p.parse::<StagePolicy>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            catalogue_path,
            stage_policy,
        })
    }

    pub fn catalogue_path(&self) -> Option<&Path> {
        self.catalogue_path.as_deref()
    }
}
