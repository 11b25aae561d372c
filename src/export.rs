use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::config::ROLLING_WINDOWS;
use crate::error::Result;
use crate::models::{RollingStats, Series, StressRecord};

pub fn signal_headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "date",
        "center",
        "demand_apps",
        "capacity_apps",
        "processed_apps",
        "queue_size",
        "avg_tat_days",
        "utilization",
        "queue_delta",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    for w in ROLLING_WINDOWS {
        for stat in ["tat_mean", "tat_std", "queue_mean", "queue_vel_mean", "queue_vel_std", "util_mean"] {
            headers.push(format!("{stat}_{w}d"));
        }
    }

    headers.extend(
        ["utilization_z", "queue_vel_mean_7d_z", "tat_std_7d_z", "stress_index", "regime"]
            .iter()
            .map(|h| h.to_string()),
    );
    headers
}

fn rolling_fields(stats: &RollingStats) -> [f64; 6] {
    [
        stats.tat_mean,
        stats.tat_std,
        stats.queue_mean,
        stats.queue_vel_mean,
        stats.queue_vel_std,
        stats.util_mean,
    ]
}

fn signal_row(record: &StressRecord) -> Vec<String> {
    let signal = &record.signal;
    let snapshot = &signal.snapshot;

    let mut row = vec![snapshot.date.to_string(), snapshot.center.clone()];
    let numbers = [
        snapshot.demand_apps,
        snapshot.capacity_apps,
        snapshot.processed_apps,
        snapshot.queue_size,
        snapshot.avg_tat_days,
        signal.utilization,
        signal.queue_delta,
    ]
    .into_iter()
    .chain(rolling_fields(&signal.w7))
    .chain(rolling_fields(&signal.w14))
    .chain([
        record.utilization_z,
        record.queue_vel_mean_7d_z,
        record.tat_std_7d_z,
        record.stress_index,
    ]);
    row.extend(numbers.map(|value| value.to_string()));
    row.push(record.regime.to_string());
    row
}

/// Writes every enriched and scored column, centers in key order.
pub fn write_signals<W: Write>(output: W, records: &Series<StressRecord>) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(signal_headers())?;

    let mut written = 0usize;
    for record in records.values().flatten() {
        writer.write_record(signal_row(record))?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Serializes rows with a header derived from the row type.
pub fn write_rows<W: Write, T: Serialize>(output: W, rows: &[T]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn write_signals_file(path: &Path, records: &Series<StressRecord>) -> Result<usize> {
    write_signals(std::fs::File::create(path)?, records)
}

pub fn write_rows_file<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    write_rows(std::fs::File::create(path)?, rows)
}
