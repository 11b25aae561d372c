use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::{DailySnapshot, Series};

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "center",
    "demand_apps",
    "capacity_apps",
    "processed_apps",
    "queue_size",
    "avg_tat_days",
];

pub fn read_snapshots(csv_path: &Path) -> Result<Vec<DailySnapshot>> {
    let file = std::fs::File::open(csv_path)?;
    let records = read_snapshots_from(file)?;
    info!(path = %csv_path.display(), rows = records.len(), "loaded daily snapshots");
    Ok(records)
}

pub fn read_snapshots_from<R: Read>(input: R) -> Result<Vec<DailySnapshot>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Validation(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<DailySnapshot>().enumerate() {
        let row = result.map_err(|err| {
            PipelineError::Validation(format!("row {}: {err}", index + 1))
        })?;
        records.push(row);
    }

    Ok(records)
}

/// Validated snapshots partitioned by center, each center sorted by date.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    centers: Series<DailySnapshot>,
}

impl SnapshotStore {
    pub fn from_records(records: Vec<DailySnapshot>) -> Result<Self> {
        if records.is_empty() {
            return Err(PipelineError::EmptySeries(
                "no snapshot records were provided".to_string(),
            ));
        }

        let mut centers: Series<DailySnapshot> = BTreeMap::new();
        for (index, record) in records.into_iter().enumerate() {
            validate_record(index + 1, &record)?;
            centers.entry(record.center.clone()).or_default().push(record);
        }

        for (center, series) in centers.iter_mut() {
            series.sort_by_key(|record| record.date);
            if let Some(pair) = series.windows(2).find(|pair| pair[0].date == pair[1].date) {
                return Err(PipelineError::Validation(format!(
                    "duplicate snapshot for center '{center}' on {}",
                    pair[0].date
                )));
            }
            debug!(center = %center, days = series.len(), "partitioned center series");
        }

        Ok(Self { centers })
    }

    /// Builds a store from an already-partitioned mapping, rejecting centers
    /// that carry no records.
    pub fn from_series(series: Series<DailySnapshot>) -> Result<Self> {
        if series.is_empty() {
            return Err(PipelineError::EmptySeries("no centers present".to_string()));
        }
        if let Some((center, _)) = series.iter().find(|(_, records)| records.is_empty()) {
            return Err(PipelineError::EmptySeries(format!(
                "center '{center}' has no records"
            )));
        }

        let mut flattened = Vec::new();
        for (center, records) in series {
            for mut record in records {
                record.center = center.clone();
                flattened.push(record);
            }
        }
        Self::from_records(flattened)
    }

    pub fn centers(&self) -> impl Iterator<Item = &str> {
        self.centers.keys().map(String::as_str)
    }

    pub fn center_series(&self, center: &str) -> Option<&[DailySnapshot]> {
        self.centers.get(center).map(Vec::as_slice)
    }

    pub fn series(&self) -> &Series<DailySnapshot> {
        &self.centers
    }

    pub fn record_count(&self) -> usize {
        self.centers.values().map(Vec::len).sum()
    }
}

fn validate_record(row: usize, record: &DailySnapshot) -> Result<()> {
    if record.center.trim().is_empty() {
        return Err(PipelineError::Validation(format!("row {row}: center is blank")));
    }

    let numeric = [
        ("demand_apps", record.demand_apps),
        ("capacity_apps", record.capacity_apps),
        ("processed_apps", record.processed_apps),
        ("queue_size", record.queue_size),
        ("avg_tat_days", record.avg_tat_days),
    ];
    for (column, value) in numeric {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::Validation(format!(
                "row {row}: {column} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}

/// Groups any per-record series by center, preserving input order within a center.
pub fn partition_by<T, F>(items: Vec<T>, key: F) -> Series<T>
where
    F: Fn(&T) -> &str,
{
    let mut grouped: Series<T> = BTreeMap::new();
    for item in items {
        grouped.entry(key(&item).to_string()).or_default().push(item);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(center: &str, day: u32) -> DailySnapshot {
        DailySnapshot {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            center: center.to_string(),
            demand_apps: 250.0,
            capacity_apps: 260.0,
            processed_apps: 240.0,
            queue_size: 10.0,
            avg_tat_days: 3.2,
        }
    }

    #[test]
    fn reads_csv_and_ignores_extra_columns() {
        let csv = "date,center,demand_apps,capacity_apps,processed_apps,queue_size,avg_tat_days,note\n\
                   2024-01-02,Delhi,250,260,240,10,3.1,x\n\
                   2024-01-01,Delhi,240,260,240,0,3.0,y\n";
        let records = read_snapshots_from(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(records[1].avg_tat_days, 3.0);
    }

    #[test]
    fn reports_every_missing_column() {
        let csv = "date,center,demand_apps,capacity_apps\n2024-01-01,Delhi,1,2\n";
        match read_snapshots_from(csv.as_bytes()) {
            Err(PipelineError::Validation(message)) => {
                assert!(message.contains("processed_apps"));
                assert!(message.contains("queue_size"));
                assert!(message.contains("avg_tat_days"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_rows_are_validation_errors() {
        let csv = "date,center,demand_apps,capacity_apps,processed_apps,queue_size,avg_tat_days\n\
                   2024-01-01,Delhi,lots,260,240,10,3.1\n";
        assert!(matches!(
            read_snapshots_from(csv.as_bytes()),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn partitions_and_sorts_by_center_then_date() {
        let store = SnapshotStore::from_records(vec![
            snapshot("Mumbai", 3),
            snapshot("Delhi", 2),
            snapshot("Mumbai", 1),
            snapshot("Delhi", 1),
        ])
        .unwrap();

        assert_eq!(store.centers().collect::<Vec<_>>(), vec!["Delhi", "Mumbai"]);
        let mumbai = store.center_series("Mumbai").unwrap();
        assert!(mumbai[0].date < mumbai[1].date);
        assert_eq!(store.record_count(), 4);
    }

    #[test]
    fn rejects_duplicates_negatives_and_empty_input() {
        let duplicate = SnapshotStore::from_records(vec![snapshot("Delhi", 1), snapshot("Delhi", 1)]);
        assert!(matches!(duplicate, Err(PipelineError::Validation(_))));

        let mut negative = snapshot("Delhi", 1);
        negative.queue_size = -1.0;
        assert!(matches!(
            SnapshotStore::from_records(vec![negative]),
            Err(PipelineError::Validation(_))
        ));

        assert!(matches!(
            SnapshotStore::from_records(Vec::new()),
            Err(PipelineError::EmptySeries(_))
        ));
    }

    #[test]
    fn empty_center_in_mapping_is_rejected() {
        let mut series: Series<DailySnapshot> = BTreeMap::new();
        series.insert("Delhi".to_string(), vec![snapshot("Delhi", 1)]);
        series.insert("Mumbai".to_string(), Vec::new());
        assert!(matches!(
            SnapshotStore::from_series(series),
            Err(PipelineError::EmptySeries(_))
        ));
    }
}
