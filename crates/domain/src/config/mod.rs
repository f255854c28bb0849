mod binding;
mod llm;
mod memory;
mod reliability;
mod session;

pub use binding::*;
pub use llm::*;
pub use memory::*;
pub use reliability::*;
pub use session::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub binding: BindingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

fn valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // The binding is the only required section.
        if self.binding.agent_id.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "binding.agent_id".into(),
                message: "agent_id must not be empty".into(),
            });
        }
        if self.binding.agent_name.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "binding.agent_name".into(),
                message: "agent_name must not be empty".into(),
            });
        }

        if self.memory.base_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "memory.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        } else if !valid_http_url(&self.memory.base_url) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "memory.base_url".into(),
                message: format!(
                    "base_url must start with http:// or https:// (got \"{}\")",
                    self.memory.base_url
                ),
            });
        }

        if !valid_http_url(&self.llm.base_url) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "llm.base_url".into(),
                message: format!(
                    "base_url must start with http:// or https:// (got \"{}\")",
                    self.llm.base_url
                ),
            });
        }

        // The fast path needs a credential; memory-only mode does not.
        if self.session.mode == AgentMode::Hybrid
            && self.llm.api_key.is_none()
            && self.llm.api_key_env.is_empty()
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.api_key_env".into(),
                message: "hybrid mode with no api_key or api_key_env configured".into(),
            });
        }

        if self.reliability.per_attempt_timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reliability.per_attempt_timeout_ms".into(),
                message: "per-attempt timeout must be greater than 0".into(),
            });
        }
        if self.reliability.health_probe_timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reliability.health_probe_timeout_ms".into(),
                message: "health probe timeout must be greater than 0".into(),
            });
        }
        if self.reliability.breaker_threshold == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reliability.breaker_threshold".into(),
                message: "breaker threshold must be greater than 0".into(),
            });
        }
        if (self.reliability.backoff_ms.len() as u32) < self.reliability.max_retries {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reliability.backoff_ms".into(),
                message: format!(
                    "backoff schedule has {} entries but max_retries is {}",
                    self.reliability.backoff_ms.len(),
                    self.reliability.max_retries
                ),
            });
        }

        if self.session.history_window == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.history_window".into(),
                message: "history window must be greater than 0".into(),
            });
        }
        if self.session.idle_timeout_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.idle_timeout_secs".into(),
                message: "idle timeout must be greater than 0".into(),
            });
        }
        if self.session.memory_refresh_every_turns == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.memory_refresh_every_turns".into(),
                message: "refresh cadence must be greater than 0".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a minimal valid Config.
    fn valid_config() -> Config {
        Config {
            binding: BindingConfig {
                agent_id: "agent-9f2c".into(),
                agent_name: "Ivy".into(),
            },
            ..Config::default()
        }
    }

    /// Helper: find the first issue matching a field prefix.
    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn valid_config_passes() {
        let issues = valid_config().validate();
        assert!(issues.is_empty(), "expected no issues, got: {issues:?}");
    }

    #[test]
    fn empty_binding_is_two_errors() {
        let issues = Config::default().validate();
        assert!(find_issue(&issues, "binding.agent_id").is_some());
        assert!(find_issue(&issues, "binding.agent_name").is_some());
    }

    #[test]
    fn memory_base_url_invalid_scheme_is_error() {
        let mut cfg = valid_config();
        cfg.memory.base_url = "ftp://localhost:8283".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "memory.base_url").expect("expected base_url error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
        assert!(issue.message.contains("http://"));
    }

    #[test]
    fn llm_base_url_invalid_scheme_is_error() {
        let mut cfg = valid_config();
        cfg.llm.base_url = "ws://localhost:1234".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "llm.base_url").expect("expected base_url error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn hybrid_without_credentials_is_warning() {
        let mut cfg = valid_config();
        cfg.session.mode = AgentMode::Hybrid;
        cfg.llm.api_key = None;
        cfg.llm.api_key_env = String::new();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "llm.api_key_env").expect("expected credential warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn memory_only_without_credentials_is_fine() {
        let mut cfg = valid_config();
        cfg.session.mode = AgentMode::MemoryOnly;
        cfg.llm.api_key = None;
        cfg.llm.api_key_env = String::new();
        let issues = cfg.validate();
        assert!(find_issue(&issues, "llm.api_key_env").is_none());
    }

    #[test]
    fn short_backoff_schedule_is_error() {
        let mut cfg = valid_config();
        cfg.reliability.max_retries = 4;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "reliability.backoff_ms").expect("expected backoff error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
        assert!(issue.message.contains("max_retries is 4"));
    }

    #[test]
    fn zero_timeouts_are_errors() {
        let mut cfg = valid_config();
        cfg.reliability.per_attempt_timeout_ms = 0;
        cfg.reliability.health_probe_timeout_ms = 0;
        cfg.session.idle_timeout_secs = 0;
        let issues = cfg.validate();
        assert!(find_issue(&issues, "reliability.per_attempt_timeout_ms").is_some());
        assert!(find_issue(&issues, "reliability.health_probe_timeout_ms").is_some());
        assert!(find_issue(&issues, "session.idle_timeout_secs").is_some());
    }

    #[test]
    fn zero_history_window_is_error() {
        let mut cfg = valid_config();
        cfg.session.history_window = 0;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "session.history_window").expect("expected window error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn config_error_display_format() {
        let err = ConfigError {
            severity: ConfigSeverity::Error,
            field: "binding.agent_id".into(),
            message: "agent_id must not be empty".into(),
        };
        assert_eq!(
            format!("{err}"),
            "[ERROR] binding.agent_id: agent_id must not be empty"
        );
    }
}
