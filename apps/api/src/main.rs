mod agents;
mod config;
mod errors;
mod llm_client;
mod quality;
mod routes;
mod rules;
mod signals;
mod state;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ModelGateway;
use crate::quality::QualityMetrics;
use crate::routes::build_router;
use crate::rules::AtsRules;
use crate::state::AppState;
use crate::workflow::{DocumentProcessor, WorkflowOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting career assistant v{}", env!("CARGO_PKG_VERSION"));

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; OpenAI calls will fall through to the next provider");
    }
    if config.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; Anthropic calls will fall through to the next provider");
    }

    // One gateway and one rule engine, shared by every agent
    let gateway = Arc::new(ModelGateway::from_config(&config));
    info!(
        openai = %config.openai_model,
        anthropic = %config.anthropic_model,
        "Model gateway initialized"
    );
    let rules = Arc::new(AtsRules::new());

    let orchestrator = WorkflowOrchestrator::new(gateway, rules.clone(), Arc::new(DocumentProcessor));

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        metrics: Arc::new(QualityMetrics::new()),
        rules,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
