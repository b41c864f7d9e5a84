//! Main entry point for CityPulse.

use anyhow::Context;
use citypulse::Pipeline;
use citypulse_common::init_logging;
use citypulse_config::ConfigLoader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;

    // keep the guard alive so buffered file output is flushed on exit
    let _guard = init_logging(&config.logging.to_subscriber_config()).context("Failed to initialize logging")?;

    info!("Starting CityPulse v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = Pipeline::new(config);
    match pipeline.run().await {
        Ok(summary) => {
            info!(
                entities = summary.entities,
                frames = summary.frames,
                export = %summary.export_path.display(),
                animation = %summary.animation_path.display(),
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {}", e);
            Err(e).context("CityPulse run failed")
        }
    }
}
