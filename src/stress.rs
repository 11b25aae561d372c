use tracing::info;

use crate::models::{EnrichedSignal, Series, StressRecord};
use crate::regime;
use crate::signals::{mean, sample_std};

pub const UTILIZATION_WEIGHT: f64 = 0.5;
pub const QUEUE_VELOCITY_WEIGHT: f64 = 0.3;
pub const TAT_VOLATILITY_WEIGHT: f64 = 0.2;

/// Normalizes the stress components per center and combines them into the
/// composite index, labelling each day with its regime.
pub fn score(signals: &Series<EnrichedSignal>) -> Series<StressRecord> {
    let scored: Series<StressRecord> = signals
        .iter()
        .map(|(center, series)| (center.clone(), score_center(series)))
        .collect();
    info!(centers = scored.len(), "scored stress index");
    scored
}

pub fn score_center(series: &[EnrichedSignal]) -> Vec<StressRecord> {
    let observed: Vec<bool> = series.iter().map(|s| s.w7.observed).collect();
    let utilization = zscores(&series.iter().map(|s| s.utilization).collect::<Vec<_>>());
    let queue_velocity = zscores_over(
        &series.iter().map(|s| s.queue_vel_mean_7d()).collect::<Vec<_>>(),
        &observed,
    );
    let tat_volatility = zscores_over(
        &series.iter().map(|s| s.tat_std_7d()).collect::<Vec<_>>(),
        &observed,
    );

    series
        .iter()
        .enumerate()
        .map(|(i, signal)| {
            let stress_index = stress_index(utilization[i], queue_velocity[i], tat_volatility[i]);
            StressRecord {
                signal: signal.clone(),
                utilization_z: utilization[i],
                queue_vel_mean_7d_z: queue_velocity[i],
                tat_std_7d_z: tat_volatility[i],
                stress_index,
                regime: regime::classify(stress_index),
            }
        })
        .collect()
}

pub fn stress_index(utilization_z: f64, queue_vel_mean_7d_z: f64, tat_std_7d_z: f64) -> f64 {
    UTILIZATION_WEIGHT * utilization_z
        + QUEUE_VELOCITY_WEIGHT * queue_vel_mean_7d_z
        + TAT_VOLATILITY_WEIGHT * tat_std_7d_z
}

/// Z-scores against the whole series. A zero spread is floored to 1.0.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    zscores_over(values, &vec![true; values.len()])
}

/// Z-scores every value against the mean and spread of the positions marked
/// `observed`, so filled window positions do not weigh on the baseline.
/// Falls back to all positions when none are observed.
pub fn zscores_over(values: &[f64], observed: &[bool]) -> Vec<f64> {
    let mut baseline: Vec<f64> = values
        .iter()
        .zip(observed)
        .filter(|(_, seen)| **seen)
        .map(|(value, _)| *value)
        .collect();
    if baseline.is_empty() {
        baseline = values.to_vec();
    }

    let center_mean = mean(&baseline);
    let mut center_std = sample_std(&baseline);
    if center_std == 0.0 {
        center_std = 1.0;
    }
    values
        .iter()
        .map(|value| (value - center_mean) / center_std)
        .collect()
}
