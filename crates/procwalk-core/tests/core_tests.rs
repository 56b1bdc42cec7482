//! Tests for procwalk-core: keys, states, instance helpers, backoff, config

use procwalk_core::*;
use std::time::Duration;

// ===========================================================================
// ResourceKey
// ===========================================================================

#[test]
fn resource_key_parse_and_display() {
    let key: ResourceKey = " 2251799813685249 ".parse().unwrap();
    assert_eq!(key.get(), 2251799813685249);
    assert_eq!(key.to_string(), "2251799813685249");
}

#[test]
fn resource_key_rejects_garbage() {
    let err = "abc".parse::<ResourceKey>().unwrap_err();
    assert!(matches!(err, Error::InvalidKey(ref s) if s == "abc"));
}

#[test]
fn resource_key_serializes_as_number() {
    let json = serde_json::to_string(&ResourceKey::new(42)).unwrap();
    assert_eq!(json, "42");
}

// ===========================================================================
// State
// ===========================================================================

#[test]
fn state_from_wire_is_case_insensitive() {
    assert_eq!(State::from("ACTIVE"), State::Active);
    assert_eq!(State::from("completed"), State::Completed);
    assert_eq!(State::from("Canceled"), State::Canceled);
    assert_eq!(State::from("TERMINATED"), State::Canceled);
    assert_eq!(State::from("INCIDENT"), State::Incident);
    assert_eq!(State::from("SUSPENDED"), State::Other("SUSPENDED".into()));
}

#[test]
fn state_matches_ignores_case() {
    assert!(State::Canceled.matches(&State::from("canceled")));
    assert!(State::Other("Weird".into()).matches(&State::Other("WEIRD".into())));
    assert!(!State::Active.matches(&State::Completed));
}

#[test]
fn state_parse_known_rejects_unknown() {
    assert_eq!(State::parse_known("active").unwrap(), State::Active);
    assert!(matches!(State::parse_known("bogus"), Err(Error::UnknownState(_))));
}

#[test]
fn state_serde_uses_wire_form() {
    let json = serde_json::to_string(&State::Completed).unwrap();
    assert_eq!(json, r#""COMPLETED""#);
    let back: State = serde_json::from_str(r#""canceled""#).unwrap();
    assert_eq!(back, State::Canceled);
}

#[test]
fn state_filter_parse() {
    assert_eq!("ALL".parse::<StateFilter>().unwrap(), StateFilter::All);
    assert_eq!(
        "completed".parse::<StateFilter>().unwrap(),
        StateFilter::Only(State::Completed)
    );
    assert!("nope".parse::<StateFilter>().is_err());
}

// ===========================================================================
// ProcessInstance / ProcessInstances
// ===========================================================================

#[test]
fn zero_parent_counts_as_root() {
    let pi = ProcessInstance::new(7).with_parent(0);
    assert!(pi.is_root());
    assert_eq!(pi.parent(), None);

    let child = ProcessInstance::new(8).with_parent(7);
    assert_eq!(child.parent(), Some(ResourceKey::new(7)));
    assert!(!child.is_root());
}

#[test]
fn process_instance_json_is_camel_case() {
    let pi = ProcessInstance::new(1).with_parent(2).with_process("order", 3);
    let json = serde_json::to_value(&pi).unwrap();
    assert_eq!(json["parentKey"], 2);
    assert_eq!(json["bpmnProcessId"], "order");
    assert_eq!(json["processVersion"], 3);
    assert!(json.get("endDate").is_none());
}

fn sample_page() -> ProcessInstances {
    let mut with_incident = ProcessInstance::new(3).with_parent(1);
    with_incident.incident = true;
    ProcessInstances::new(vec![
        ProcessInstance::new(1),
        ProcessInstance::new(2).with_parent(1),
        with_incident,
    ])
}

#[test]
fn children_only_keeps_instances_with_parent() {
    let page = sample_page().children_only();
    assert_eq!(page.keys(), vec![ResourceKey::new(2), ResourceKey::new(3)]);
    assert_eq!(page.total, 2);
}

#[test]
fn parents_only_keeps_roots() {
    let page = sample_page().parents_only();
    assert_eq!(page.keys(), vec![ResourceKey::new(1)]);
    assert_eq!(page.total, 1);
}

#[test]
fn incident_filter() {
    assert_eq!(sample_page().with_incidents(true).keys(), vec![ResourceKey::new(3)]);
    assert_eq!(sample_page().with_incidents(false).total, 2);
}

#[test]
fn search_filter_builder() {
    let f = SearchFilter::default()
        .parent_key(ResourceKey::new(10))
        .bpmn_process_id("invoice")
        .state(StateFilter::Only(State::Active));
    assert_eq!(f.parent_key, Some(ResourceKey::new(10)));
    assert_eq!(f.bpmn_process_id.as_deref(), Some("invoice"));
    assert_eq!(f.state, StateFilter::Only(State::Active));
    assert!(f.key.is_none());
}

// ===========================================================================
// Backoff
// ===========================================================================

#[test]
fn exponential_backoff_doubles_and_caps() {
    let cfg = BackoffConfig {
        strategy: BackoffStrategy::Exponential,
        initial_delay_ms: 500,
        max_delay_ms: 8_000,
        multiplier: 2.0,
        ..Default::default()
    };
    let delays: Vec<u128> = cfg
        .policy()
        .delays(cfg.initial_delay())
        .take(8)
        .map(|d| d.as_millis())
        .collect();
    assert_eq!(delays, vec![500, 1_000, 2_000, 4_000, 8_000, 8_000, 8_000, 8_000]);
}

#[test]
fn exponential_backoff_is_non_decreasing() {
    let policy = BackoffConfig {
        multiplier: 1.5,
        initial_delay_ms: 300,
        max_delay_ms: 5_000,
        ..Default::default()
    }
    .policy();
    let delays: Vec<Duration> = policy.delays(Duration::from_millis(300)).take(20).collect();
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*delays.last().unwrap(), Duration::from_secs(5));
}

#[test]
fn fixed_backoff_never_changes() {
    let cfg = BackoffConfig {
        strategy: BackoffStrategy::Fixed,
        multiplier: 10.0,
        ..Default::default()
    };
    let d = Duration::from_millis(250);
    assert_eq!(cfg.next_delay(d), d);
    assert_eq!(cfg.next_delay(cfg.next_delay(d)), d);
}

#[test]
fn backoff_timeout_zero_disables() {
    let cfg = BackoffConfig {
        timeout_ms: 0,
        ..Default::default()
    };
    assert!(cfg.timeout().is_none());
    assert_eq!(BackoffConfig::default().timeout(), Some(Duration::from_secs(120)));
}

#[test]
fn backoff_validate_rejects_non_growing_multiplier() {
    let cfg = BackoffConfig {
        multiplier: 1.0,
        ..Default::default()
    };
    assert!(cfg.validate().is_err());

    let fixed = BackoffConfig {
        strategy: BackoffStrategy::Fixed,
        multiplier: 1.0,
        ..Default::default()
    };
    assert!(fixed.validate().is_ok());
}

#[test]
fn backoff_strategy_parse() {
    assert_eq!("Fixed".parse::<BackoffStrategy>().unwrap(), BackoffStrategy::Fixed);
    assert_eq!("exponential".parse::<BackoffStrategy>().unwrap(), BackoffStrategy::Exponential);
    assert!("linear".parse::<BackoffStrategy>().is_err());
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn api_version_parse_variants() {
    for s in ["8.7", "87", "v87", "V8.7"] {
        assert_eq!(s.parse::<ApiVersion>().unwrap(), ApiVersion::V87, "{s}");
    }
    assert_eq!("8.8".parse::<ApiVersion>().unwrap(), ApiVersion::V88);
    let err = "9.0".parse::<ApiVersion>().unwrap_err();
    assert!(err.to_string().contains("8.7, 8.8"));
}

#[test]
fn config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn config_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
version = "8.8"
camunda_base_url = "https://camunda.example.com"

[backoff]
strategy = "fixed"
max_retries = 5
"#,
    )
    .unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.api.version, ApiVersion::V88);
    assert_eq!(cfg.api.camunda_base_url, "https://camunda.example.com");
    assert_eq!(cfg.backoff.strategy, BackoffStrategy::Fixed);
    assert_eq!(cfg.backoff.max_retries, 5);
    assert_eq!(cfg.backoff.initial_delay_ms, 500);
    assert_eq!(cfg.http.timeout_secs, 30);
}

#[test]
fn config_malformed_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api]\nversion = \"7.0\"\n").unwrap();
    assert!(Config::load(&path).is_err());
}

#[test]
fn config_dump_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut cfg = Config::default();
    cfg.api.tenant = Some("tenant-a".into());
    cfg.backoff.max_retries = 3;
    let dumped = cfg.to_toml().unwrap();
    assert!(dumped.contains("[backoff]"));
    assert!(dumped.contains("tenant = \"tenant-a\""));
    std::fs::write(&path, dumped).unwrap();
    assert_eq!(Config::load(&path).unwrap(), cfg);
}

#[test]
fn env_token_skips_blank_variables() {
    let mut cfg = Config::default();
    cfg.apply_env_from(|name| match name {
        "PROCWALK_TOKEN" => Some(String::new()),
        "CAMUNDA_TOKEN" => Some("abc".into()),
        _ => None,
    });
    assert_eq!(cfg.auth.token.as_deref(), Some("abc"));
}

#[test]
fn env_token_prefers_first_variable_and_keeps_file_token() {
    let lookup = |name: &str| Some(format!("{name}-value"));

    let mut cfg = Config::default();
    cfg.apply_env_from(lookup);
    assert_eq!(cfg.auth.token.as_deref(), Some("PROCWALK_TOKEN-value"));

    let mut cfg = Config::default();
    cfg.auth.token = Some("from-file".into());
    cfg.apply_env_from(lookup);
    assert_eq!(cfg.auth.token.as_deref(), Some("from-file"));

    let mut cfg = Config::default();
    cfg.apply_env_from(|_| Some("   ".into()));
    assert_eq!(cfg.auth.token, None);
}

#[test]
fn config_validate_requires_base_urls() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    cfg.api.operate_base_url = "  ".into();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("operate_base_url"));

    // 8.8 talks to the Camunda API only
    cfg.api.version = ApiVersion::V88;
    assert!(cfg.validate().is_ok());

    cfg.api.camunda_base_url = "not a url".into();
    assert!(cfg.validate().is_err());
}
