pub mod api; // HTTP surface: /api/health, /api/guidelines, /api/analyze
pub mod config;
pub mod models;
pub mod intelligence; // Pathway mining, drift detection, governance signal
pub mod safety; // Language guard for generated text
pub mod store; // Event batch sources

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
