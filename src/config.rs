use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CD3S";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable pointing at a JSON service configuration file.
pub const CONFIG_ENV_VAR: &str = "CD3S_CONFIG";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "cd3s=info,tower_http=info"
}

/// Per-user configuration directory (`<config_dir>/cd3s`).
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cd3s"))
}

/// Bundled reference data (guidelines, sample events).
pub fn default_resources_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config read failed ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse failed ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ═══════════════════════════════════════════════════════════
// Engine configuration
// ═══════════════════════════════════════════════════════════

/// Longest lookback window accepted (ten years).
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Category weights for the weighted token overlap used by alignment scoring.
/// Treatment decisions (medications, procedures) count more than presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub symptom: f64,
    pub test: f64,
    pub medication: f64,
    pub procedure: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            symptom: 0.5,
            test: 1.0,
            medication: 2.0,
            procedure: 2.0,
        }
    }
}

/// Every threshold the analysis engine uses.
///
/// All fields default to the documented values, so a config file only needs
/// to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum Jaccard similarity for an event to join a pathway cluster.
    pub similarity_threshold: f64,
    /// Number of top-ranked clusters reported as dominant.
    pub dominant_top_k: usize,
    /// Maximum number of alternative pathways rendered in the result.
    pub alternative_display_cap: usize,
    /// Trailing lookback windows, in days.
    pub window_days: Vec<u32>,
    /// Consecutive declining window steps required for sustained drift.
    pub sustained_min_steps: usize,
    /// Minimum absolute alignment decline over the full horizon to flag drift.
    pub drift_decline_threshold: f64,
    /// Alignment changes within this band are treated as stable.
    pub alignment_tolerance: f64,
    /// Entropy changes within this band are treated as stable; also the
    /// notable threshold for the explainability trace.
    pub entropy_tolerance: f64,
    /// Outcome share movement (fraction) that counts as an outcome shift.
    pub outcome_shift_threshold: f64,
    /// Relative alignment decline (percent) counted as a strong signal.
    pub strong_alignment_decline_pct: f64,
    pub weights: CategoryWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            dominant_top_k: 3,
            alternative_display_cap: 2,
            window_days: vec![30, 60, 90],
            sustained_min_steps: 2,
            drift_decline_threshold: 0.05,
            alignment_tolerance: 0.01,
            entropy_tolerance: 0.02,
            outcome_shift_threshold: 0.15,
            strong_alignment_decline_pct: 10.0,
            weights: CategoryWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.dominant_top_k == 0 {
            return Err(ConfigError::Invalid("dominant_top_k must be at least 1".into()));
        }

        let mut distinct = self.window_days.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 || distinct.contains(&0) {
            return Err(ConfigError::Invalid(
                "window_days needs at least two distinct non-zero windows".into(),
            ));
        }
        if let Some(&longest) = distinct.last().filter(|&&d| d > MAX_WINDOW_DAYS) {
            return Err(ConfigError::Invalid(format!(
                "window_days must not exceed {MAX_WINDOW_DAYS}, got {longest}"
            )));
        }
        if self.sustained_min_steps == 0 || self.sustained_min_steps >= distinct.len() {
            return Err(ConfigError::Invalid(format!(
                "sustained_min_steps must be within 1..{}",
                distinct.len() - 1
            )));
        }

        for (name, value) in [
            ("drift_decline_threshold", self.drift_decline_threshold),
            ("alignment_tolerance", self.alignment_tolerance),
            ("entropy_tolerance", self.entropy_tolerance),
            ("outcome_shift_threshold", self.outcome_shift_threshold),
            ("strong_alignment_decline_pct", self.strong_alignment_decline_pct),
            ("weights.symptom", self.weights.symptom),
            ("weights.test", self.weights.test),
            ("weights.medication", self.weights.medication),
            ("weights.procedure", self.weights.procedure),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Windows sorted longest first (the order the drift detector walks them).
    pub fn windows_longest_first(&self) -> Vec<u32> {
        let mut windows = self.window_days.clone();
        windows.sort_unstable_by(|a, b| b.cmp(a));
        windows.dedup();
        windows
    }
}

// ═══════════════════════════════════════════════════════════
// Service configuration
// ═══════════════════════════════════════════════════════════

/// Configuration for the HTTP service and CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Directory holding `guidelines.json`. Defaults to the bundled resources.
    pub resources_dir: Option<PathBuf>,
    /// Caller-side deadline for a single analysis request.
    pub request_deadline_ms: Option<u64>,
    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
            resources_dir: None,
            request_deadline_ms: Some(5_000),
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Resolve configuration: `$CD3S_CONFIG`, then `<config_dir>/cd3s/config.json`,
    /// then built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        if let Some(path) = config_dir().map(|d| d.join("config.json")) {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load and validate configuration from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.engine.validate()?;

        tracing::info!(path = %path.display(), "Loaded service configuration");
        Ok(config)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.resources_dir
            .clone()
            .unwrap_or_else(default_resources_dir)
    }

    pub fn request_deadline(&self) -> Option<std::time::Duration> {
        self.request_deadline_ms.map(std::time::Duration::from_millis)
    }
}
