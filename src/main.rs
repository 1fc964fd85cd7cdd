use std::sync::Arc;

use agent_gateway::{agent::AgentRegistry, build_app, config::AppConfig, run_server, AppState};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        command = %config.bridge.command,
        timeout_secs = config.bridge.timeout.as_secs(),
        "starting agent gateway"
    );

    // No agents are compiled in; every question goes through AGENT_CMD.
    let registry = Arc::new(AgentRegistry::new());
    let state = AppState::from_config(&config, registry);

    run_server(build_app(state), &config.host, config.port).await?;
    Ok(())
}
