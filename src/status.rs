use std::cmp::Ordering;

use crate::models::{CenterStatus, Regime, Series, StressRecord};

/// Latest day of each center, highest stress first.
pub fn latest_status(records: &Series<StressRecord>) -> Vec<CenterStatus> {
    let mut statuses: Vec<CenterStatus> = records
        .values()
        .filter_map(|series| series.last())
        .map(|record| CenterStatus {
            center: record.center().to_string(),
            date: record.date(),
            regime: record.regime,
            stress_index: record.stress_index,
            avg_tat_days: record.signal.snapshot.avg_tat_days,
            queue_size: record.signal.snapshot.queue_size,
            utilization: record.signal.utilization,
        })
        .collect();

    statuses.sort_by(|a, b| {
        b.stress_index
            .partial_cmp(&a.stress_index)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.center.cmp(&b.center))
    });
    statuses
}

/// Days spent in each regime for one center, in regime order.
pub fn regime_counts(records: &Series<StressRecord>, center: &str) -> Vec<(Regime, usize)> {
    let series = records.get(center).map(Vec::as_slice).unwrap_or_default();
    Regime::ALL
        .into_iter()
        .map(|regime| (regime, series.iter().filter(|r| r.regime == regime).count()))
        .collect()
}
