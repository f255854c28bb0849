//! Default values must survive a round-trip through an empty TOML document:
//! an operator who writes only the binding section gets the documented
//! reliability envelope.

use vl_domain::config::{AgentMode, Config};

#[test]
fn minimal_toml_yields_documented_defaults() {
    let toml = r#"
        [binding]
        agent_id = "agent-9f2c"
        agent_name = "Ivy"
    "#;
    let cfg: Config = toml::from_str(toml).expect("minimal config parses");

    assert_eq!(cfg.binding.agent_id, "agent-9f2c");
    assert_eq!(cfg.binding.agent_name, "Ivy");

    assert_eq!(cfg.memory.base_url, "http://localhost:8283");
    assert_eq!(cfg.llm.model, "gpt-4o-mini");

    assert_eq!(cfg.session.mode, AgentMode::MemoryOnly);
    assert_eq!(cfg.session.idle_timeout_secs, 300);
    assert_eq!(cfg.session.memory_refresh_every_turns, 5);
    assert_eq!(cfg.session.history_window, 10);

    assert_eq!(cfg.reliability.max_retries, 2);
    assert_eq!(cfg.reliability.per_attempt_timeout_ms, 10_000);
    assert_eq!(cfg.reliability.health_probe_timeout_ms, 2_000);
    assert_eq!(cfg.reliability.breaker_threshold, 3);
    assert_eq!(cfg.reliability.breaker_cooldown_ms, 30_000);
    assert_eq!(cfg.reliability.backoff_ms, vec![2_000, 4_000]);

    assert!(cfg.validate().is_empty());
}

#[test]
fn mode_parses_kebab_case() {
    let toml = r#"
        [binding]
        agent_id = "a"
        agent_name = "A"

        [session]
        mode = "hybrid"
    "#;
    let cfg: Config = toml::from_str(toml).expect("hybrid mode parses");
    assert_eq!(cfg.session.mode, AgentMode::Hybrid);
}

#[test]
fn reliability_overrides_apply() {
    let toml = r#"
        [binding]
        agent_id = "a"
        agent_name = "A"

        [reliability]
        max_retries = 1
        per_attempt_timeout_ms = 5000
        backoff_ms = [1000]
    "#;
    let cfg: Config = toml::from_str(toml).expect("overrides parse");
    assert_eq!(cfg.reliability.max_retries, 1);
    assert_eq!(cfg.reliability.per_attempt_timeout_ms, 5_000);
    assert_eq!(cfg.reliability.backoff_ms, vec![1_000]);
    assert!(cfg.validate().is_empty());
}
