use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-center series keyed by center identifier, each sorted by date.
pub type Series<T> = BTreeMap<String, Vec<T>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub center: String,
    pub demand_apps: f64,
    pub capacity_apps: f64,
    pub processed_apps: f64,
    pub queue_size: f64,
    pub avg_tat_days: f64,
}

/// Trailing-window statistics for one window size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingStats {
    pub tat_mean: f64,
    pub tat_std: f64,
    pub queue_mean: f64,
    pub queue_vel_mean: f64,
    pub queue_vel_std: f64,
    pub util_mean: f64,
    /// The window held at least `MIN_PERIODS` observations; otherwise the
    /// values above were filled from a neighbouring position.
    pub observed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSignal {
    pub snapshot: DailySnapshot,
    pub utilization: f64,
    pub queue_delta: f64,
    pub w7: RollingStats,
    pub w14: RollingStats,
}

impl EnrichedSignal {
    pub fn date(&self) -> NaiveDate {
        self.snapshot.date
    }

    pub fn queue_vel_mean_7d(&self) -> f64 {
        self.w7.queue_vel_mean
    }

    pub fn tat_std_7d(&self) -> f64 {
        self.w7.tat_std
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Stable,
    Elevated,
    Stressed,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Stable, Regime::Elevated, Regime::Stressed];

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Stable => "stable",
            Regime::Elevated => "elevated",
            Regime::Stressed => "stressed",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Regime::Stable),
            "elevated" => Ok(Regime::Elevated),
            "stressed" => Ok(Regime::Stressed),
            other => Err(format!(
                "unknown regime '{other}' (expected stable, elevated or stressed)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StressRecord {
    pub signal: EnrichedSignal,
    pub utilization_z: f64,
    pub queue_vel_mean_7d_z: f64,
    pub tat_std_7d_z: f64,
    pub stress_index: f64,
    pub regime: Regime,
}

impl StressRecord {
    pub fn date(&self) -> NaiveDate {
        self.signal.snapshot.date
    }

    pub fn center(&self) -> &str {
        &self.signal.snapshot.center
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub center: String,
    pub stress_start: NaiveDate,
    pub warning_start: Option<NaiveDate>,
    pub lead_time_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub center: String,
    pub episodes: usize,
    pub early_warnings: usize,
    pub detection_rate: f64,
    pub avg_lead_time_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreEpisodeSignals {
    pub center: String,
    pub stress_start: NaiveDate,
    pub early_warning: bool,
    pub days_observed: usize,
    pub utilization_mean_pre: f64,
    pub queue_vel_mean_pre: f64,
    pub tat_std_mean_pre: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningComparison {
    pub early_warning: bool,
    pub episodes: usize,
    pub utilization_mean_pre: f64,
    pub queue_vel_mean_pre: f64,
    pub tat_std_mean_pre: f64,
}

/// A center left out of a run because its own series could not be enriched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCenter {
    pub center: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterStatus {
    pub center: String,
    pub date: NaiveDate,
    pub regime: Regime,
    pub stress_index: f64,
    pub avg_tat_days: f64,
    pub queue_size: f64,
    pub utilization: f64,
}
