//! End-to-end scenario runs against the real `relay` binary.
//!
//! Each test drives `Scenario` the way the harness binary does, with the
//! relay child in scripted mode so no external event bus is needed. Timings
//! are shrunk from the reference configuration to keep the suite fast.

#![cfg(unix)]

use std::time::Duration;

use relayvisor::harness::{HarnessConfig, Scenario};

fn relay_env(script: &str) -> Vec<(String, String)> {
    vec![
        ("RELAY_ACCESS_TOKEN".into(), "test-token".into()),
        ("RELAY_INSTANCE_URL".into(), "https://bus.test".into()),
        ("RELAY_ORG_ID".into(), "org-test".into()),
        ("RELAY_SCRIPT".into(), script.into()),
    ]
}

fn config(relay_command: Vec<String>, trigger: &[&str]) -> HarnessConfig {
    HarnessConfig {
        relay_command,
        relay_env: Vec::new(),
        trigger_command: trigger.iter().map(|s| s.to_string()).collect(),
        expected_events: 3,
        ready_timeout: Duration::from_secs(5),
        settle_delay: Duration::from_millis(50),
        collect_timeout: Duration::from_secs(10),
        poll_interval: Duration::from_millis(50),
    }
}

fn scripted_config(script: &str, trigger: &[&str]) -> HarnessConfig {
    let mut cfg = config(vec![env!("CARGO_BIN_EXE_relay").to_string()], trigger);
    cfg.relay_env = relay_env(script);
    cfg
}

#[tokio::test]
async fn test_scenario_passes_with_three_events() {
    let verdict = Scenario::new(scripted_config("3@50ms", &["true"])).run().await;

    assert!(verdict.passed, "expected a pass, got {:?}", verdict.reason);
    assert_eq!(verdict.received, 3);
    assert_eq!(verdict.expected, 3);
    assert_eq!(verdict.exit_code(), 0);
}

#[tokio::test]
async fn test_scenario_times_out_citing_received_vs_expected() {
    let mut cfg = scripted_config("2@50ms", &["true"]);
    cfg.collect_timeout = Duration::from_secs(2);

    let verdict = Scenario::new(cfg).run().await;

    assert!(!verdict.passed);
    assert_eq!(verdict.received, 2);
    let reason = verdict.reason.unwrap_or_default();
    assert!(reason.contains("expected 3"), "reason was: {reason}");
    assert!(reason.contains("received 2"), "reason was: {reason}");
}

#[tokio::test]
async fn test_launch_fails_when_relay_never_becomes_ready() {
    let mut cfg = config(vec!["sleep".into(), "5".into()], &["true"]);
    cfg.ready_timeout = Duration::from_millis(500);

    let verdict = Scenario::new(cfg).run().await;

    assert!(!verdict.passed);
    assert_eq!(verdict.received, 0);
    let reason = verdict.reason.unwrap_or_default();
    assert!(reason.contains("ready"), "reason was: {reason}");
}

#[tokio::test]
async fn test_launch_fails_when_relay_exits_before_ready() {
    let cfg = config(vec!["false".into()], &["true"]);

    let verdict = Scenario::new(cfg).run().await;

    assert!(!verdict.passed);
    let reason = verdict.reason.unwrap_or_default();
    assert!(
        reason.contains("before becoming ready"),
        "reason was: {reason}"
    );
}

#[tokio::test]
async fn test_trigger_failure_is_fatal_before_collection() {
    let verdict = Scenario::new(scripted_config("3@50ms", &["false"])).run().await;

    assert!(!verdict.passed);
    assert_eq!(verdict.received, 0, "collection must not have run");
    let reason = verdict.reason.unwrap_or_default();
    assert!(reason.contains("trigger"), "reason was: {reason}");
}

#[tokio::test]
async fn test_overreported_done_is_an_integrity_violation() {
    // A fake relay that claims three events but only relays one.
    let fake = r#"printf '%s\n' '{"type":"ready"}' '{"type":"event","count":1}' '{"type":"done","count":3}'; sleep 5"#;
    let cfg = config(vec!["sh".into(), "-c".into(), fake.into()], &["true"]);

    let verdict = Scenario::new(cfg).run().await;

    assert!(!verdict.passed);
    assert_eq!(verdict.received, 1);
    let reason = verdict.reason.unwrap_or_default();
    assert!(reason.contains("integrity"), "reason was: {reason}");
}

#[tokio::test]
async fn test_unknown_tags_on_the_channel_are_skipped() {
    // A fake relay that interleaves unknown tags and noise with real
    // messages; the scenario must still pass on the three real events.
    let fake = r#"printf '%s\n' \
        '{"type":"ready"}' \
        '{"type":"heartbeat"}' \
        'stray diagnostics line' \
        '{"type":"event","count":1}' \
        '{"type":"event","count":2}' \
        '{"type":"event","count":3}' \
        '{"type":"done","count":3}'"#;
    let cfg = config(vec!["sh".into(), "-c".into(), fake.into()], &["true"]);

    let verdict = Scenario::new(cfg).run().await;

    assert!(verdict.passed, "expected a pass, got {:?}", verdict.reason);
    assert_eq!(verdict.received, 3);
}
