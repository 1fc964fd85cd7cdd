use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::bridge::BridgeConfig;

pub const DEFAULT_AGENT_CMD: &str = "python3 AGENT4_fixed_final.py";
pub const DEFAULT_AGENT_MODULE: &str = "agent";
pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8000);

        let frontend_dir = lookup("FRONTEND_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("frontend_dist"));

        let command = lookup("AGENT_CMD").unwrap_or_else(|| DEFAULT_AGENT_CMD.to_string());
        let shell = lookup("AGENT_SHELL").unwrap_or_else(|| "sh".to_string());
        let modules = lookup("AGENT_MODULE")
            .map(|value| parse_list(&value))
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_AGENT_MODULE.to_string()]);

        let timeout_secs = lookup("AGENT_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            host,
            port,
            frontend_dir,
            bridge: BridgeConfig::new(command, Duration::from_secs(timeout_secs))
                .with_shell(shell)
                .with_modules(modules),
        }
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = AppConfig::from_lookup(|_| None);

        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.frontend_dir, PathBuf::from("frontend_dist"));
        assert_eq!(cfg.bridge.command, DEFAULT_AGENT_CMD);
        assert_eq!(cfg.bridge.shell, "sh");
        assert_eq!(cfg.bridge.modules, vec![DEFAULT_AGENT_MODULE.to_string()]);
        assert_eq!(cfg.bridge.timeout, Duration::from_secs(900));
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "9100"),
            ("AGENT_CMD", "./run-agent"),
            ("AGENT_TIMEOUT_SECS", "30"),
            ("FRONTEND_DIR", "/srv/ui"),
        ]));

        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.bridge.command, "./run-agent");
        assert_eq!(cfg.bridge.timeout, Duration::from_secs(30));
        assert_eq!(cfg.frontend_dir, PathBuf::from("/srv/ui"));
    }

    #[test]
    fn agent_module_accepts_a_comma_separated_list() {
        let cfg = AppConfig::from_lookup(lookup_from(&[(
            "AGENT_MODULE",
            " agent, agent2 ,,AGENT4_fixed_final",
        )]));
        assert_eq!(cfg.bridge.modules, vec!["agent", "agent2", "AGENT4_fixed_final"]);

        let cfg = AppConfig::from_lookup(lookup_from(&[("AGENT_MODULE", " , ")]));
        assert_eq!(cfg.bridge.modules, vec![DEFAULT_AGENT_MODULE.to_string()]);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "eighty"),
            ("AGENT_TIMEOUT_SECS", "-1"),
        ]));

        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.bridge.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
