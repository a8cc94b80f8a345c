//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the CLI.
///
/// In JSON output mode all console logging is suppressed so the final JSON
/// document stays machine-readable. Otherwise logs go to stderr, filtered by
/// `RUST_LOG` when set.
pub fn init_tracing(json_mode: bool, debug_enabled: bool) {
    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
        return;
    }

    let default_filter = if debug_enabled {
        "info,kiln=debug,kiln_builder=debug,kiln_net=debug"
    } else {
        "warn,kiln=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
