//! In-process agents and the registry the bridge resolves them from.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::bridge::BridgeError;

/// The two fields every agent produces for a question about a video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AskResult {
    pub answer: String,
    pub summary: String,
}

impl AskResult {
    pub fn new(answer: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            summary: summary.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no agent registered under `{0}`")]
    NotRegistered(String),
    #[error("failed to load agent `{name}`: {reason}")]
    Load { name: String, reason: String },
    #[error("agent failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Something that can answer a question about a video.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, video_id: &str, question: &str) -> Result<AskResult, AgentError>;
}

/// Record of one failed attempt to resolve an agent by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadAttempt {
    pub module: String,
    pub error: String,
}

type AgentFactory = Box<dyn Fn() -> Result<Arc<dyn Agent>, AgentError> + Send + Sync>;

/// Named factories for agents compiled into the binary.
///
/// A factory runs on every [`AgentRegistry::load`], so an agent that can't
/// come up (missing model files, bad credentials) fails per call rather
/// than at startup.
#[derive(Default)]
pub struct AgentRegistry {
    factories: HashMap<String, AgentFactory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn Agent>, AgentError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Registers an already constructed agent that always loads.
    pub fn register_agent(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        self.register(name, move || Ok(agent.clone()));
    }

    pub fn load(&self, name: &str) -> Result<Arc<dyn Agent>, AgentError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AgentError::NotRegistered(name.to_string()))?;
        factory()
    }
}
