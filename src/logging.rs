//! Tracing setup: stderr always, optionally a log file as well

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "procwalk=info,procwalk_engine=info,procwalk_client=info,procwalk_core=info";
const QUIET_FILTER: &str = "warn";

/// Install the global subscriber. `RUST_LOG` wins over both defaults.
///
/// The returned guard flushes the file writer on drop and must outlive the
/// command.
pub fn init(quiet: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let default = if quiet { QUIET_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("--log-file {} has no file name", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}
