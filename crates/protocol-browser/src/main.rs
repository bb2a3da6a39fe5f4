mod config;
mod error;
mod html;
mod routes;

use std::sync::Arc;

use protocol_common::catalogue::Catalogue;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting protocol browser");

    let config = Config::from_env()?;
    let source = config
        .catalogue_path()
        .map_or_else(|| "embedded".to_string(), |p| p.display().to_string());
    info!(
        catalogue = %source,
        policy = ?config.stage_policy,
        listen_addr = %config.listen_addr,
        "configuration loaded"
    );

    let catalogue = Catalogue::load(config.catalogue_path(), config.stage_policy)?;
    if !catalogue.offenders().is_empty() {
        warn!(
            count = catalogue.offenders().len(),
            "serving catalogue with protocols outside their timelines"
        );
    }
    let app = routes::router(Arc::new(catalogue));

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
