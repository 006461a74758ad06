//! nlq server
//!
//! Answers questions about the Olist e-commerce warehouse. Without an
//! OpenAI key it runs in demo mode on the rule-based matcher alone; with a
//! key, questions the matcher cannot place fall back to the LLM bridge.

use nlq_catalog::SchemaCatalog;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod engine;
mod error;
mod http;
mod llm;
mod logging;
mod mcp;
mod metrics;

use config::{Config, Transport};
use engine::Engine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("NLQ_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load(&config_path)?;
    logging::init(&config.logging);

    // the only fatal failure after configuration
    let catalog = match &config.catalog.path {
        Some(path) => SchemaCatalog::from_path(path),
        None => SchemaCatalog::builtin(),
    }
    .map_err(|e| {
        error!(error = %e, "Catalog failed to load");
        e
    })?;
    info!(
        catalog = %catalog.name,
        tables = catalog.tables().len(),
        "Catalog loaded"
    );

    let engine = Engine::from_config(&config, Arc::new(catalog), Config::openai_api_key())?;
    info!(
        mode = engine.mode().as_str(),
        warehouse = %config.warehouse.path.display(),
        "Engine ready"
    );
    let engine = Arc::new(engine);

    match config.server.transport {
        Transport::Http => {
            let addr = format!("{}:{}", config.server.host, config.server.port);
            http::serve(&addr, engine).await?;
        }
        Transport::Mcp => {
            mcp::serve(config.server.host.clone(), config.server.port, engine).await?;
        }
    }

    Ok(())
}
