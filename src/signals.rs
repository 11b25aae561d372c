use tracing::{debug, info, warn};

use crate::config::{MIN_PERIODS, ROLLING_WINDOWS};
use crate::error::{PipelineError, Result};
use crate::models::{DailySnapshot, EnrichedSignal, RejectedCenter, RollingStats, Series};
use crate::store::SnapshotStore;

pub const MAX_UTILIZATION: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub signals: Series<EnrichedSignal>,
    pub rejected: Vec<RejectedCenter>,
}

/// Derives per-day features for every center independently. A center whose
/// history is too short for the rolling windows is rejected on its own; the
/// run fails only when no center survives.
pub fn enrich(store: &SnapshotStore) -> Result<Enrichment> {
    let mut signals = Series::new();
    let mut rejected = Vec::new();

    for (center, snapshots) in store.series() {
        match enrich_center(center, snapshots) {
            Ok(series) => {
                signals.insert(center.clone(), series);
            }
            Err(PipelineError::Validation(reason)) => {
                warn!(center = %center, %reason, "center rejected");
                rejected.push(RejectedCenter {
                    center: center.clone(),
                    reason,
                });
            }
            Err(err) => return Err(err),
        }
    }

    if signals.is_empty() {
        let reasons: Vec<String> = rejected.iter().map(|r| r.reason.clone()).collect();
        return Err(PipelineError::Validation(format!(
            "no center could be enriched: {}",
            reasons.join("; ")
        )));
    }

    info!(
        centers = signals.len(),
        rejected = rejected.len(),
        rows = store.record_count(),
        "computed rolling signals"
    );
    Ok(Enrichment { signals, rejected })
}

pub fn enrich_center(center: &str, snapshots: &[DailySnapshot]) -> Result<Vec<EnrichedSignal>> {
    if snapshots.is_empty() {
        return Err(PipelineError::EmptySeries(format!(
            "center '{center}' has no records"
        )));
    }
    if snapshots.len() < MIN_PERIODS {
        return Err(PipelineError::Validation(format!(
            "center '{center}' has {} records; rolling signals need at least {MIN_PERIODS}",
            snapshots.len()
        )));
    }

    let utilization: Vec<f64> = snapshots
        .iter()
        .map(|s| utilization(s.processed_apps, s.capacity_apps))
        .collect();
    let queue: Vec<f64> = snapshots.iter().map(|s| s.queue_size).collect();
    let tat: Vec<f64> = snapshots.iter().map(|s| s.avg_tat_days).collect();
    let queue_delta = queue_deltas(&queue);

    let [short, long] = ROLLING_WINDOWS;
    let w7 = window_stats(center, short, &tat, &queue, &queue_delta, &utilization)?;
    let w14 = window_stats(center, long, &tat, &queue, &queue_delta, &utilization)?;

    debug!(center, days = snapshots.len(), "enriched center series");

    Ok(snapshots
        .iter()
        .enumerate()
        .map(|(i, snapshot)| EnrichedSignal {
            snapshot: snapshot.clone(),
            utilization: utilization[i],
            queue_delta: queue_delta[i],
            w7: w7[i],
            w14: w14[i],
        })
        .collect())
}

/// Processed over capacity, held within `[0, MAX_UTILIZATION]`.
pub fn utilization(processed: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        return if processed > 0.0 { MAX_UTILIZATION } else { 0.0 };
    }
    (processed / capacity).clamp(0.0, MAX_UTILIZATION)
}

pub fn queue_deltas(queue: &[f64]) -> Vec<f64> {
    let mut deltas = Vec::with_capacity(queue.len());
    for (i, value) in queue.iter().enumerate() {
        deltas.push(if i == 0 { 0.0 } else { value - queue[i - 1] });
    }
    deltas
}

fn window_stats(
    center: &str,
    window: usize,
    tat: &[f64],
    queue: &[f64],
    queue_delta: &[f64],
    utilization: &[f64],
) -> Result<Vec<RollingStats>> {
    let filled = |column: &str, values: Vec<Option<f64>>| {
        fill_gaps(values).ok_or_else(|| {
            PipelineError::Validation(format!(
                "center '{center}': no {column} value available for the {window}-day window"
            ))
        })
    };

    let tat_mean_raw = rolling(tat, window, mean);
    let observed: Vec<bool> = tat_mean_raw.iter().map(Option::is_some).collect();
    let tat_mean = filled("tat_mean", tat_mean_raw)?;
    let tat_std = filled("tat_std", rolling(tat, window, sample_std))?;
    let queue_mean = filled("queue_mean", rolling(queue, window, mean))?;
    let queue_vel_mean = filled("queue_vel_mean", rolling(queue_delta, window, mean))?;
    let queue_vel_std = filled("queue_vel_std", rolling(queue_delta, window, sample_std))?;
    let util_mean = filled("util_mean", rolling(utilization, window, mean))?;

    Ok((0..tat.len())
        .map(|i| RollingStats {
            tat_mean: tat_mean[i],
            tat_std: tat_std[i],
            queue_mean: queue_mean[i],
            queue_vel_mean: queue_vel_mean[i],
            queue_vel_std: queue_vel_std[i],
            util_mean: util_mean[i],
            observed: observed[i],
        })
        .collect())
}

/// Applies `stat` over the trailing `window` values ending at each position.
/// Positions with fewer than `MIN_PERIODS` observations are left unset.
pub fn rolling(values: &[f64], window: usize, stat: fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|end| {
            let start = (end + 1).saturating_sub(window);
            let slice = &values[start..=end];
            (slice.len() >= MIN_PERIODS).then(|| stat(slice))
        })
        .collect()
}

/// Fills gaps with the nearest later value, then any trailing gaps with the
/// nearest earlier value. Returns `None` if the series has no value at all.
pub fn fill_gaps(values: Vec<Option<f64>>) -> Option<Vec<f64>> {
    let mut values = values;

    let mut next = None;
    for slot in values.iter_mut().rev() {
        match slot {
            Some(value) => next = Some(*value),
            None => *slot = next,
        }
    }

    let mut previous = None;
    for slot in values.iter_mut() {
        match slot {
            Some(value) => previous = Some(*value),
            None => *slot = previous,
        }
    }

    values.into_iter().collect()
}

/// Arithmetic mean, accumulated as offsets from the first value so a constant
/// series returns that value exactly.
pub fn mean(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    first + values.iter().map(|v| v - first).sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
