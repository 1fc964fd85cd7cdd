use serde::{Deserialize, Serialize};

use crate::agent::{AskResult, LoadAttempt};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub video_id: String,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub ok: bool,
    pub answer: String,
    pub summary: String,
}

impl From<AskResult> for AskResponse {
    fn from(result: AskResult) -> Self {
        Self {
            ok: true,
            answer: result.answer,
            summary: result.summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct FrontendMissingResponse {
    pub ok: bool,
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_attempts: Option<Vec<LoadAttempt>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            exception: None,
            import_attempts: None,
        }
    }

    pub fn bridge_not_found(attempts: &[LoadAttempt]) -> Self {
        Self {
            import_attempts: Some(attempts.to_vec()),
            ..Self::new(
                "agent bridge not found. Register an in-process agent or set AGENT_CMD to a command that prints a JSON line with answer and summary.",
            )
        }
    }

    pub fn exception(err: impl ToString) -> Self {
        Self {
            exception: Some(err.to_string()),
            ..Self::new("Exception while running agent")
        }
    }
}
