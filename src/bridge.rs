use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::agent::{Agent, AgentError, AgentRegistry, AskResult};

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Shell command line that runs the external agent.
    pub command: String,
    pub shell: String,
    /// Registry names of in-process agents, tried in order before the
    /// subprocess.
    pub modules: Vec<String>,
    pub timeout: Duration,
}

impl BridgeConfig {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            shell: "sh".to_string(),
            modules: vec![crate::config::DEFAULT_AGENT_MODULE.to_string()],
            timeout,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("agent command is missing")]
    MissingCommand,
    #[error("agent subprocess timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("agent subprocess failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to collect agent subprocess output: {0}")]
    Output(#[source] std::io::Error),
}

/// Two-tier dispatch: in-process agent first, external process second.
pub struct AgentBridge {
    config: BridgeConfig,
    registry: Arc<AgentRegistry>,
}

impl AgentBridge {
    pub fn new(config: BridgeConfig, registry: Arc<AgentRegistry>) -> Result<Self, BridgeError> {
        if config.command.trim().is_empty() {
            return Err(BridgeError::MissingCommand);
        }
        Ok(Self { config, registry })
    }

    pub async fn ask(&self, video_id: &str, question: &str) -> Result<AskResult, BridgeError> {
        if let Some(result) = self.ask_in_process(video_id, question).await {
            return Ok(result);
        }
        self.ask_via_subprocess(video_id, question).await
    }

    async fn ask_in_process(&self, video_id: &str, question: &str) -> Option<AskResult> {
        for module in &self.config.modules {
            let agent = match self.registry.load(module) {
                Ok(agent) => agent,
                Err(err) => {
                    tracing::debug!(module = %module, error = %err, "in-process agent unavailable");
                    continue;
                }
            };

            match agent.run(video_id, question).await {
                Ok(result) => return Some(result),
                Err(err) => tracing::warn!(
                    module = %module,
                    video_id,
                    error = %err,
                    "in-process agent failed"
                ),
            }
        }
        None
    }

    async fn ask_via_subprocess(
        &self,
        video_id: &str,
        question: &str,
    ) -> Result<AskResult, BridgeError> {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(&self.config.command)
            .env("VIDEO_ID", video_id)
            .env("QUESTION", question)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // The shell leads its own group so a timeout reaches everything it started.
            .process_group(0)
            .kill_on_drop(true);

        tracing::info!(video_id, command = %self.config.command, "spawning agent subprocess");

        let child = cmd.spawn().map_err(BridgeError::Spawn)?;
        let group = child.id().map(|pid| Pid::from_raw(pid as i32));

        let output = match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(BridgeError::Output)?,
            Err(_) => {
                if let Some(group) = group {
                    if let Err(err) = killpg(group, Signal::SIGKILL) {
                        tracing::warn!(video_id, error = %err, "failed to kill agent process group");
                    }
                }
                return Err(BridgeError::Timeout(self.config.timeout));
            }
        };

        if !output.status.success() {
            tracing::warn!(video_id, status = %output.status, "agent subprocess exited unsuccessfully");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(parse_agent_output(&stdout, &stderr))
    }
}

#[async_trait]
impl Agent for AgentBridge {
    async fn run(&self, video_id: &str, question: &str) -> Result<AskResult, AgentError> {
        Ok(self.ask(video_id, question).await?)
    }
}

/// Extracts the result from the last non-empty stdout line of the agent.
///
/// Never fails: anything that isn't a JSON object becomes a diagnostic
/// message in `answer`.
pub fn parse_agent_output(stdout: &str, stderr: &str) -> AskResult {
    let Some(last) = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
    else {
        return AskResult::new(format!("No output from agent. stderr: {}", stderr.trim()), "");
    };

    match serde_json::from_str::<Value>(last) {
        Ok(Value::Object(map)) => {
            AskResult::new(field_text(&map, "answer"), field_text(&map, "summary"))
        }
        Ok(other) => AskResult::new("Agent returned JSON but not dict.", python_str(&other)),
        Err(_) => AskResult::new(
            format!(
                "Could not parse JSON from agent. Last stdout line:\n{last}\n\nFULL STDOUT:\n{stdout}\n\nSTDERR:\n{stderr}"
            ),
            "",
        ),
    }
}

fn field_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
    }
}

/// Renders a decoded value the way a Python agent author would print it
/// (`True`, `None`, `[1, 2]`, `{'a': 'b'}`).
fn python_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => python_repr(other),
    }
}

fn python_repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_python(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_repr).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote_python(k), python_repr(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn quote_python(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
