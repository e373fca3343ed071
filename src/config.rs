//! Tunable parameters for the analytics core.
//!
//! Defaults carry the production constants; `from_env` lets a host override
//! the ones that are useful to tune without a rebuild.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Number of most recent attempts that influence the score.
    pub window: usize,
    /// Number of attempts retained per concept for history/display.
    pub history_cap: usize,
    pub hint_weight: f64,
    pub success_weight: f64,
    pub time_weight: f64,
    /// Target solve time in milliseconds; at or above this, the time
    /// component contributes zero.
    pub target_time_ms: i64,
    pub max_hint_level: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window: 5,
            history_cap: 10,
            hint_weight: 0.5,
            success_weight: 0.3,
            time_weight: 0.2,
            target_time_ms: 120_000,
            max_hint_level: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryThresholds {
    /// Score at or above which a concept counts as strong.
    pub strong: f64,
    /// Score below which a concept counts as weak.
    pub weak: f64,
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            strong: 0.75,
            weak: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeConfig {
    /// Events retained per concept.
    pub history_cap: usize,
    /// Hint level at or above which an event counts as a struggle.
    pub struggle_hint_level: i32,
    /// Minimum recorded events before any warning can fire.
    pub min_attempts: usize,
    /// Struggle rate above which a warning fires.
    pub warn_rate: f64,
    pub high_rate: f64,
    pub medium_rate: f64,
    /// Free-text mistakes are grouped by this many leading characters.
    pub pattern_prefix_len: usize,
    /// A grouped pattern must occur at least this often to be reported.
    pub pattern_min_count: usize,
    /// How many grouped patterns to report.
    pub pattern_top: usize,
    /// Events within this many days of now add a recency caution.
    pub recency_days: i64,
}

impl Default for MistakeConfig {
    fn default() -> Self {
        Self {
            history_cap: 10,
            struggle_hint_level: 4,
            min_attempts: 2,
            warn_rate: 0.5,
            high_rate: 0.75,
            medium_rate: 0.6,
            pattern_prefix_len: 50,
            pattern_min_count: 2,
            pattern_top: 3,
            recency_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Attempts and mistake events older than this are removed.
    pub cutoff_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { cutoff_days: 90 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub scoring: ScoringConfig,
    pub thresholds: MasteryThresholds,
    pub mistakes: MistakeConfig,
    pub cleanup: CleanupConfig,
}

impl AnalyticsConfig {
    /// Defaults with environment overrides for the host-tunable knobs.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_i64("ANALYTICS_TARGET_TIME_MS") {
            if ms > 0 {
                config.scoring.target_time_ms = ms;
            }
        }
        if let Some(days) = env_i64("ANALYTICS_CLEANUP_DAYS") {
            if days > 0 {
                config.cleanup.cutoff_days = days;
            }
        }

        config
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let scoring = ScoringConfig::default();
        let sum = scoring.hint_weight + scoring.success_weight + scoring.time_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scoring_window_fits_inside_history_cap() {
        let scoring = ScoringConfig::default();
        assert!(scoring.window <= scoring.history_cap);
    }
}
