use crate::render;
use crate::{BackoffArgs, Cli, Commands, ResourceType, SearchArgs, WalkMode};
use clap::Parser;
use procwalk_core::*;

fn instance(key: i64, parent: i64, bpmn: &str) -> ProcessInstance {
    let mut pi = ProcessInstance::new(key).with_process(bpmn, 3);
    if parent != 0 {
        pi = pi.with_parent(parent);
    }
    pi.tenant_id = "<default>".into();
    pi.start_date = Some("2025-01-02T10:00:00Z".into());
    pi
}

fn chain_of(items: &[ProcessInstance]) -> Chain {
    items.iter().map(|pi| (pi.key, pi.clone())).collect()
}

fn path(raw: &[i64]) -> Path {
    raw.iter().copied().map(ResourceKey::new).collect()
}

// ===========================================================================
// Rendering
// ===========================================================================

#[test]
fn standard_line_root() {
    let pi = instance(2251799813685255, 0, "order-process");
    assert_eq!(
        render::standard_line(&pi),
        "2251799813685255 <default> order-process v3 ACTIVE s:2025-01-02T10:00:00Z p:<root> i:false"
    );
}

#[test]
fn standard_line_pads_key_and_shows_optional_parts() {
    let mut pi = instance(42, 7, "payment");
    pi.process_version_tag = Some("stable".into());
    pi.state = State::Completed;
    pi.end_date = Some("2025-01-02T11:00:00Z".into());
    pi.incident = true;
    assert_eq!(
        render::standard_line(&pi),
        "42               <default> payment v3/stable COMPLETED s:2025-01-02T10:00:00Z e:2025-01-02T11:00:00Z p:7 i:true"
    );
}

#[test]
fn keys_only_one_per_line() {
    let chain = chain_of(&[instance(100, 50, "a"), instance(50, 0, "b")]);
    assert_eq!(render::keys_only(&path(&[100, 50]), &chain), "100\n50");
}

#[test]
fn pretty_line_joins_with_arrow() {
    let chain = chain_of(&[instance(100, 50, "child"), instance(50, 10, ""), instance(10, 0, "root")]);
    assert_eq!(
        render::pretty_line(&path(&[100, 50, 10]), &chain),
        "100 (child) → 50 (undefined) → 10 (root)"
    );
}

#[test]
fn missing_chain_entry_falls_back_to_key() {
    let chain = chain_of(&[instance(10, 0, "root")]);
    assert_eq!(render::pretty_line(&path(&[99, 10]), &chain), "99 → 10 (root)");
    assert_eq!(render::standard_lines(&path(&[99]), &chain), "99");
}

#[test]
fn empty_path_renders_empty() {
    assert_eq!(render::standard_lines(&[], &Chain::new()), "");
    assert_eq!(render::pretty_line(&[], &Chain::new()), "");
}

#[test]
fn tree_draws_edges_in_order() {
    let chain = chain_of(&[
        instance(10, 0, "root"),
        instance(20, 10, "mid"),
        instance(30, 20, "leaf"),
        instance(21, 10, "side"),
    ]);
    let mut edges = Edges::new();
    edges.insert(ResourceKey::new(10), path(&[20, 21]));
    edges.insert(ResourceKey::new(20), path(&[30]));
    edges.insert(ResourceKey::new(21), Vec::new());
    edges.insert(ResourceKey::new(30), Vec::new());

    let expected = "10 (root)\n├── 20 (mid)\n│   └── 30 (leaf)\n└── 21 (side)";
    assert_eq!(render::tree(ResourceKey::new(10), &edges, &chain), expected);
}

#[test]
fn tree_does_not_expand_revisits() {
    let chain = chain_of(&[instance(1, 0, "a"), instance(2, 1, "b")]);
    let mut edges = Edges::new();
    edges.insert(ResourceKey::new(1), path(&[2]));
    edges.insert(ResourceKey::new(2), path(&[1]));
    assert_eq!(
        render::tree(ResourceKey::new(1), &edges, &chain),
        "1 (a)\n└── 2 (b)\n    └── 1 (a)"
    );
}

// ===========================================================================
// Command line
// ===========================================================================

#[test]
fn walk_accepts_short_resource_name() {
    let cli = Cli::try_parse_from(["procwalk", "walk", "pi", "--start-key", "123", "--mode", "family", "--tree"]).unwrap();
    match cli.command {
        Commands::Walk {
            resource,
            start_key,
            mode,
            view,
        } => {
            assert_eq!(resource, ResourceType::ProcessInstance);
            assert_eq!(start_key, ResourceKey::new(123));
            assert_eq!(mode, WalkMode::Family);
            assert!(view.tree);
            assert!(!view.keys_only);
        }
        _ => panic!("expected walk"),
    }
}

#[test]
fn walk_rejects_conflicting_views() {
    let parsed = Cli::try_parse_from([
        "procwalk", "walk", "process-instance", "-w", "1", "-m", "children", "--tree", "--keys-only",
    ]);
    assert!(parsed.is_err());
}

#[test]
fn walk_rejects_bad_key_and_mode() {
    assert!(Cli::try_parse_from(["procwalk", "walk", "pi", "-w", "abc", "-m", "parent"]).is_err());
    assert!(Cli::try_parse_from(["procwalk", "walk", "pi", "-w", "1", "-m", "sideways"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "procwalk", "expect", "pi", "--key", "5", "--state", "completed", "--api-version", "8.8", "-q",
    ])
    .unwrap();
    assert!(cli.quiet);
    assert_eq!(cli.api_version.as_deref(), Some("8.8"));
}

#[test]
fn backoff_args_override_config() {
    let args = BackoffArgs {
        backoff_strategy: Some("fixed".into()),
        max_retries: Some(7),
        timeout_ms: Some(0),
        ..Default::default()
    };
    let mut backoff = BackoffConfig::default();
    args.apply(&mut backoff).unwrap();
    assert_eq!(backoff.strategy, BackoffStrategy::Fixed);
    assert_eq!(backoff.max_retries, 7);
    assert_eq!(backoff.timeout(), None);
    assert_eq!(backoff.initial_delay_ms, BackoffConfig::default().initial_delay_ms);
}

#[test]
fn backoff_args_reject_unknown_strategy() {
    let args = BackoffArgs {
        backoff_strategy: Some("linear".into()),
        ..Default::default()
    };
    assert!(args.apply(&mut BackoffConfig::default()).is_err());
}

#[test]
fn search_args_build_filter() {
    let args = SearchArgs {
        state: Some("active".into()),
        parent_key: Some(ResourceKey::new(9)),
        bpmn_process_id: Some("order".into()),
        size: 50,
        ..Default::default()
    };
    let filter = args.filter().unwrap();
    assert_eq!(filter.state, StateFilter::Only(State::Active));
    assert_eq!(filter.parent_key, Some(ResourceKey::new(9)));
    assert_eq!(filter.bpmn_process_id.as_deref(), Some("order"));
    assert_eq!(filter.key, None);
}

#[test]
fn search_args_reject_unknown_state() {
    let args = SearchArgs {
        state: Some("sleeping".into()),
        ..Default::default()
    };
    assert!(args.filter().is_err());
}

#[test]
fn hierarchy_filters_are_exclusive() {
    assert!(Cli::try_parse_from(["procwalk", "get", "pi", "--children-only", "--parents-only"]).is_err());
    assert!(Cli::try_parse_from(["procwalk", "get", "pi", "--orphan-parents-only", "--incidents-only"]).is_ok());
}

#[test]
fn backoff_flags_are_prefixed() {
    let cli = Cli::try_parse_from([
        "procwalk",
        "delete",
        "pi",
        "--key",
        "8",
        "--cancel",
        "--backoff-strategy",
        "fixed",
        "--backoff-initial-delay-ms",
        "250",
        "--backoff-max-delay-ms",
        "1000",
        "--backoff-max-retries",
        "4",
        "--backoff-multiplier",
        "3",
        "--backoff-timeout-ms",
        "0",
    ])
    .unwrap();
    let Commands::Delete { cancel, backoff, .. } = cli.command else {
        panic!("expected delete");
    };
    assert!(cancel);
    let mut config = BackoffConfig::default();
    backoff.apply(&mut config).unwrap();
    assert_eq!(config.strategy, BackoffStrategy::Fixed);
    assert_eq!(config.initial_delay_ms, 250);
    assert_eq!(config.max_delay_ms, 1000);
    assert_eq!(config.max_retries, 4);
    assert_eq!(config.multiplier, 3.0);
    assert_eq!(config.timeout(), None);

    assert!(Cli::try_parse_from(["procwalk", "expect", "pi", "-k", "1", "-s", "active", "--max-retries", "2"]).is_err());
}
