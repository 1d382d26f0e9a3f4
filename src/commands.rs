use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::server;

/// Start the HTTP answering service.
#[inline]
pub async fn serve(port_override: Option<u16>) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let port = port_override.unwrap_or(config.server.port);

    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    info!("Starting askweb server");
    server::serve(pipeline, port)
        .await
        .context("Server exited with an error")?;

    Ok(())
}

/// Answer a single question from the command line and print the result.
#[inline]
pub async fn ask(question: String, query: String) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    info!("Running one-shot pipeline for query: {}", query);

    let result = tokio::task::spawn_blocking(move || pipeline.run(&question, &query))
        .await
        .context("Pipeline task aborted")?
        .context("Pipeline failed")?;

    println!("{}", result.text);
    Ok(())
}

/// Print the resolved configuration with credentials redacted.
#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let output = serde_json::to_string_pretty(&config.redacted())
        .context("Failed to serialize configuration")?;

    println!("{}", output);
    Ok(())
}
