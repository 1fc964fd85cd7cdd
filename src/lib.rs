pub mod agent;
pub mod api;
pub mod bridge;
pub mod config;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::{Agent, AgentRegistry, LoadAttempt};
use crate::bridge::AgentBridge;
use crate::config::AppConfig;

pub use crate::agent::AskResult;

#[derive(Clone)]
pub struct AppState {
    /// `None` when neither an in-process agent nor the subprocess bridge
    /// could be set up; `/api/ask` then answers with `import_attempts`.
    pub agent: Option<Arc<dyn Agent>>,
    pub import_attempts: Arc<Vec<LoadAttempt>>,
    pub frontend_dir: PathBuf,
}

impl AppState {
    pub fn new(agent: Arc<dyn Agent>, frontend_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent: Some(agent),
            import_attempts: Arc::new(Vec::new()),
            frontend_dir: frontend_dir.into(),
        }
    }

    pub fn unavailable(attempts: Vec<LoadAttempt>, frontend_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent: None,
            import_attempts: Arc::new(attempts),
            frontend_dir: frontend_dir.into(),
        }
    }

    /// Resolves the agent the ask endpoint talks to: the subprocess bridge
    /// when `AGENT_CMD` is usable, otherwise the in-process agent alone.
    pub fn from_config(config: &AppConfig, registry: Arc<AgentRegistry>) -> Self {
        let bridge_err = match AgentBridge::new(config.bridge.clone(), registry.clone()) {
            Ok(bridge) => return Self::new(Arc::new(bridge), config.frontend_dir.clone()),
            Err(err) => err,
        };

        let mut attempts = Vec::new();
        for module in &config.bridge.modules {
            match registry.load(module) {
                Ok(agent) => {
                    tracing::warn!(error = %bridge_err, module = %module, "subprocess bridge disabled, using in-process agent only");
                    return Self::new(agent, config.frontend_dir.clone());
                }
                Err(load_err) => attempts.push(LoadAttempt {
                    module: module.clone(),
                    error: load_err.to_string(),
                }),
            }
        }

        tracing::error!(error = %bridge_err, "no agent available");
        attempts.push(LoadAttempt {
            module: "subprocess".to_string(),
            error: bridge_err.to_string(),
        });
        Self::unavailable(attempts, config.frontend_dir.clone())
    }
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(app: Router, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await
}
