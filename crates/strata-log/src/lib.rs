//! Structured logging setup for the voxel engine and its host applications.
//!
//! Console output goes through `tracing` with uptime timestamps and module
//! targets; debug builds can additionally write JSON log files for
//! post-mortem analysis. Filtering respects `RUST_LOG`.

use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber.
///
/// `filter` overrides the default directive string (`info` everywhere,
/// physics internals quieted); `RUST_LOG` overrides both. When
/// `debug_build` is set and a `log_dir` is given, a JSON file layer is
/// added alongside the console layer.
///
/// Call once at startup; a second call panics (the subscriber is global).
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, filter: Option<&str>) {
    let filter_str = filter.unwrap_or("info,rapier3d=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("strata.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The default filter: `info` everywhere, physics internals at `warn`.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info,rapier3d=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_physics() {
        let filter = format!("{}", default_env_filter());
        assert!(filter.contains("rapier3d=warn"));
        assert!(filter.contains("info"));
    }

    #[test]
    fn test_env_filter_parsing() {
        for directive in [
            "info",
            "debug,strata_mesh=trace",
            "warn,strata_voxel=debug",
            "error",
        ] {
            assert!(
                EnvFilter::try_from(directive).is_ok(),
                "failed to parse filter: {directive}"
            );
        }
    }

    #[test]
    fn test_log_file_path_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("strata.log");
        assert_eq!(log_path.file_name().unwrap(), "strata.log");
    }
}
