use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use protocol_common::catalogue::StagePolicy;

use crate::error::AppError;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Catalogue document to load. `None` uses the catalogue compiled into the binary.
    pub catalogue_path: Option<PathBuf>,
    /// Handling of protocols filed under a stage missing from the timeline.
    pub stage_policy: StagePolicy,
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Optional:
    /// - `PROTOCOL_CATALOGUE_PATH`: JSON catalogue document (must exist when set)
    /// - `PROTOCOL_CATALOGUE_POLICY`: `strict` (default) or `warn`
    /// - `PROTOCOL_BROWSER_LISTEN_ADDR`: bind address (default: "127.0.0.1:8080")
    pub fn from_env() -> Result<Self, AppError> {
        let catalogue_path = match std::env::var("PROTOCOL_CATALOGUE_PATH") {
            Ok(path) => {
                let path = PathBuf::from(path);
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "catalogue file not found: {}",
                        path.display()
                    )));
                }
                Some(path)
            }
            Err(_) => None,
        };

        let stage_policy = match std::env::var("PROTOCOL_CATALOGUE_POLICY") {
            Ok(policy) => policy.parse()?,
            Err(_) => StagePolicy::default(),
        };

        let listen_addr = std::env::var("PROTOCOL_BROWSER_LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().map_err(|e| {
            AppError::Config(format!(
                "PROTOCOL_BROWSER_LISTEN_ADDR is not a socket address ({listen_addr}): {e}"
            ))
        })?;

        Ok(Self {
            catalogue_path,
            stage_policy,
            listen_addr,
        })
    }

    pub fn catalogue_path(&self) -> Option<&Path> {
        self.catalogue_path.as_deref()
    }
}
