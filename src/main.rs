//! procwalk - walk, watch and clean up process instances on a workflow engine
//!
//! Usage:
//!   procwalk walk pi --start-key K --mode family     → whole tree around K
//!   procwalk expect pi --key K --state completed     → poll until K completes
//!   procwalk get pi --orphan-parents-only            → children whose parent is gone
//!   procwalk delete pi --key K --cancel              → cancel if needed, then delete
//!   procwalk config --dump                           → print effective config

mod logging;
mod render;

#[cfg(test)]
mod tests;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use procwalk_client::ResourceClient;
use procwalk_core::{
    ApiVersion, BackoffConfig, BackoffStrategy, CallContext, Config, ProcessInstances, ResourceKey,
    SearchFilter, State, StateFilter,
};
use procwalk_engine::Walker;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "procwalk",
    about = "Traverse and manage process instances on a workflow engine",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $PROCWALK_CONFIG or <config dir>/procwalk/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    /// Engine API version (8.7 or 8.8)
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Bearer token (or set PROCWALK_TOKEN / CAMUNDA_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Tenant to restrict searches to
    #[arg(long, global = true)]
    tenant: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ResourceType {
    #[value(name = "process-instance", alias = "pi")]
    ProcessInstance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum WalkMode {
    Parent,
    Children,
    Family,
}

/// Overrides for the `[backoff]` config section.
#[derive(Args, Debug, Default)]
struct BackoffArgs {
    /// fixed or exponential
    #[arg(long)]
    backoff_strategy: Option<String>,

    #[arg(long = "backoff-initial-delay-ms")]
    initial_delay_ms: Option<u64>,

    #[arg(long = "backoff-max-delay-ms")]
    max_delay_ms: Option<u64>,

    /// Maximum polls; 0 polls until the timeout
    #[arg(long = "backoff-max-retries")]
    max_retries: Option<u32>,

    #[arg(long = "backoff-multiplier")]
    multiplier: Option<f64>,

    /// Overall wait budget; 0 disables it
    #[arg(long = "backoff-timeout-ms")]
    timeout_ms: Option<u64>,
}

impl BackoffArgs {
    fn apply(&self, backoff: &mut BackoffConfig) -> anyhow::Result<()> {
        if let Some(strategy) = &self.backoff_strategy {
            backoff.strategy = strategy.parse::<BackoffStrategy>()?;
        }
        if let Some(v) = self.initial_delay_ms {
            backoff.initial_delay_ms = v;
        }
        if let Some(v) = self.max_delay_ms {
            backoff.max_delay_ms = v;
        }
        if let Some(v) = self.max_retries {
            backoff.max_retries = v;
        }
        if let Some(v) = self.multiplier {
            backoff.multiplier = v;
        }
        if let Some(v) = self.timeout_ms {
            backoff.timeout_ms = v;
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Traverse the parent/child graph from a start key
    #[command(alias = "w", alias = "traverse")]
    Walk {
        #[arg(value_enum)]
        resource: ResourceType,
        #[arg(short = 'w', long)]
        start_key: ResourceKey,
        #[arg(short, long, value_enum)]
        mode: WalkMode,
        #[command(flatten)]
        view: WalkView,
    },
    /// Wait until a process instance reaches a state
    Expect {
        #[arg(value_enum)]
        resource: ResourceType,
        #[arg(short, long)]
        key: ResourceKey,
        /// active, completed, canceled or incident
        #[arg(short, long)]
        state: String,
        #[command(flatten)]
        backoff: BackoffArgs,
    },
    /// Search process instances
    Get {
        #[arg(value_enum)]
        resource: ResourceType,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Cancel a process instance
    Cancel {
        #[arg(value_enum)]
        resource: ResourceType,
        #[arg(short, long)]
        key: ResourceKey,
        /// Poll until the engine reports the instance as canceled
        #[arg(long, default_value_t = false)]
        wait: bool,
        #[command(flatten)]
        backoff: BackoffArgs,
    },
    /// Delete a finished process instance
    Delete {
        #[arg(value_enum)]
        resource: ResourceType,
        #[arg(short, long)]
        key: ResourceKey,
        /// Cancel a still-running instance first, then delete it
        #[arg(long, default_value_t = false)]
        cancel: bool,
        #[command(flatten)]
        backoff: BackoffArgs,
    },
    /// Inspect the effective configuration
    Config {
        /// Print the merged config as TOML
        #[arg(long, default_value_t = false)]
        dump: bool,
    },
    /// Show version
    Version,
}

#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("walk_view").multiple(false)))]
struct WalkView {
    /// Only print keys
    #[arg(long, group = "walk_view")]
    keys_only: bool,
    /// One line, `child → parent → root` (parent mode)
    #[arg(long, group = "walk_view")]
    pretty: bool,
    /// Draw the subtree (children and family modes)
    #[arg(long, group = "walk_view")]
    tree: bool,
}

#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("hierarchy").multiple(false)))]
struct SearchArgs {
    #[arg(short, long)]
    key: Option<ResourceKey>,
    /// all, active, completed, canceled or incident
    #[arg(short, long)]
    state: Option<String>,
    #[arg(long)]
    parent_key: Option<ResourceKey>,
    #[arg(long)]
    bpmn_process_id: Option<String>,
    #[arg(long)]
    process_version: Option<i32>,
    #[arg(long)]
    process_version_tag: Option<String>,
    /// Only instances started by a parent
    #[arg(long, group = "hierarchy")]
    children_only: bool,
    /// Only root instances
    #[arg(long, group = "hierarchy")]
    parents_only: bool,
    /// Only children whose parent no longer exists
    #[arg(long, group = "hierarchy")]
    orphan_parents_only: bool,
    /// Only instances with an open incident
    #[arg(long)]
    incidents_only: bool,
    #[arg(long)]
    keys_only: bool,
    #[arg(long, default_value_t = 1000)]
    size: i32,
}

impl SearchArgs {
    fn filter(&self) -> anyhow::Result<SearchFilter> {
        let mut filter = SearchFilter::default();
        if let Some(key) = self.key {
            filter = filter.key(key);
        }
        if let Some(state) = &self.state {
            filter = filter.state(state.parse::<StateFilter>()?);
        }
        if let Some(parent) = self.parent_key {
            filter = filter.parent_key(parent);
        }
        if let Some(id) = &self.bpmn_process_id {
            filter = filter.bpmn_process_id(id.clone());
        }
        if let Some(version) = self.process_version {
            filter = filter.process_version(version);
        }
        if let Some(tag) = &self.process_version_tag {
            filter = filter.process_version_tag(tag.clone());
        }
        Ok(filter)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match logging::init(cli.quiet, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = CallContext::new();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight requests");
            interrupt.cancel();
        }
    });

    match run(cli, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, ctx: &CallContext) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Version => {
            println!(
                "procwalk v{} (engine API {})",
                env!("CARGO_PKG_VERSION"),
                ApiVersion::SUPPORTED.join(", ")
            );
        }

        Commands::Config { dump } => {
            if dump {
                print!("{}", config.to_toml()?);
            } else {
                match Config::resolve_path(cli.config.as_deref()) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("<defaults>"),
                }
            }
        }

        Commands::Walk {
            resource: ResourceType::ProcessInstance,
            start_key,
            mode,
            view,
        } => {
            let client = connect(&config)?;
            let output = walk(&Walker::new(client), ctx, start_key, mode, &view).await?;
            println!("{output}");
        }

        Commands::Expect {
            resource: ResourceType::ProcessInstance,
            key,
            state,
            backoff,
        } => {
            let desired = State::parse_known(&state)?;
            backoff.apply(&mut config.backoff)?;
            let client = connect(&config)?;
            procwalk_engine::wait_for_state(client.as_ref(), ctx, key, &desired, &config.backoff).await?;
            println!("process instance {key} reached state {desired}");
        }

        Commands::Get {
            resource: ResourceType::ProcessInstance,
            search,
        } => {
            let client = connect(&config)?;
            let found = get(client.as_ref(), ctx, &search).await?;
            if search.keys_only {
                for key in found.keys() {
                    println!("{key}");
                }
            } else {
                println!("found: {}", found.total);
                for pi in &found.items {
                    println!("{}", render::standard_line(pi));
                }
            }
        }

        Commands::Cancel {
            resource: ResourceType::ProcessInstance,
            key,
            wait,
            backoff,
        } => {
            backoff.apply(&mut config.backoff)?;
            let client = connect(&config)?;
            if wait {
                procwalk_engine::cancel_and_wait(client.as_ref(), ctx, key, &config.backoff).await?;
                println!("process instance {key} canceled");
            } else {
                client
                    .cancel(ctx, key)
                    .await
                    .with_context(|| format!("cancel {key}"))?;
                println!("cancel requested for process instance {key}");
            }
        }

        Commands::Delete {
            resource: ResourceType::ProcessInstance,
            key,
            cancel,
            backoff,
        } => {
            backoff.apply(&mut config.backoff)?;
            let client = connect(&config)?;
            let status = if cancel {
                procwalk_engine::delete_with_cancel(client.as_ref(), ctx, key, &config.backoff).await?
            } else {
                client
                    .delete(ctx, key)
                    .await
                    .with_context(|| format!("delete {key}"))?
            };
            println!("deleted {} ({})", status.deleted, status.message);
        }
    }

    Ok(())
}

/// File (or defaults), then environment, then global flags.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match Config::resolve_path(cli.config.as_deref()) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();
    if let Some(version) = &cli.api_version {
        config.api.version = version.parse()?;
    }
    if let Some(token) = &cli.token {
        config.auth.token = Some(token.clone());
    }
    if let Some(tenant) = &cli.tenant {
        config.api.tenant = Some(tenant.clone());
    }
    Ok(config)
}

fn connect(config: &Config) -> anyhow::Result<Arc<dyn ResourceClient>> {
    config.validate()?;
    let tokens = procwalk_client::token_provider(config);
    Ok(procwalk_client::new_client(config, tokens)?)
}

async fn walk(
    walker: &Walker,
    ctx: &CallContext,
    start: ResourceKey,
    mode: WalkMode,
    view: &WalkView,
) -> anyhow::Result<String> {
    if mode == WalkMode::Parent {
        if view.tree {
            anyhow::bail!("--tree needs --mode children or family");
        }
        let ancestry = walker.ancestry(ctx, start).await?;
        return Ok(if view.keys_only {
            render::keys_only(&ancestry.path, &ancestry.chain)
        } else if view.pretty {
            render::pretty_line(&ancestry.path, &ancestry.chain)
        } else {
            render::standard_lines(&ancestry.path, &ancestry.chain)
        });
    }

    let subtree = match mode {
        WalkMode::Children => walker.descendants(ctx, start).await?,
        _ => walker.family(ctx, start).await?,
    };
    Ok(if view.keys_only {
        render::keys_only(&subtree.keys, &subtree.chain)
    } else if view.tree {
        let root = subtree.keys.first().copied().unwrap_or(start);
        render::tree(root, &subtree.edges, &subtree.chain)
    } else if view.pretty {
        render::pretty_line(&subtree.keys, &subtree.chain)
    } else {
        render::standard_lines(&subtree.keys, &subtree.chain)
    })
}

async fn get(
    client: &dyn ResourceClient,
    ctx: &CallContext,
    args: &SearchArgs,
) -> anyhow::Result<ProcessInstances> {
    let mut found = client
        .search(ctx, &args.filter()?, args.size)
        .await
        .context("search process instances")?;
    if args.children_only {
        found = found.children_only();
    }
    if args.parents_only {
        found = found.parents_only();
    }
    if args.incidents_only {
        found = found.with_incidents(true);
    }
    if args.orphan_parents_only {
        let orphans = procwalk_engine::filter_orphan_parents(client, ctx, found.items).await?;
        found = ProcessInstances::new(orphans);
    }
    Ok(found)
}
