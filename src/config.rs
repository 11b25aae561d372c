use crate::error::{PipelineError, Result};
use crate::models::Regime;

/// Trailing window sizes, in records, for rolling statistics.
pub const ROLLING_WINDOWS: [usize; 2] = [7, 14];

/// Minimum observations a window needs before a statistic is emitted.
pub const MIN_PERIODS: usize = 3;

/// Warning-run threshold applied uniformly to every center.
pub const DEFAULT_STRESS_THRESHOLD: f64 = 0.3;

/// Pre-episode lookback in calendar days.
pub const DEFAULT_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Stress index level a day must reach to count toward a warning run.
    pub stress_threshold: f64,
    /// Regime whose onset opens an episode.
    pub regime_label: Regime,
    /// Lookback, in calendar days, for pre-episode analysis.
    pub window_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stress_threshold: DEFAULT_STRESS_THRESHOLD,
            regime_label: Regime::Stressed,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.stress_threshold.is_finite() {
            return Err(PipelineError::Validation(format!(
                "stress_threshold must be finite, got {}",
                self.stress_threshold
            )));
        }
        if self.window_days < 1 {
            return Err(PipelineError::Validation(format!(
                "window_days must be at least 1, got {}",
                self.window_days
            )));
        }
        Ok(())
    }
}
