use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{PipelineError, Result};
use crate::models::DailySnapshot;

pub const DEFAULT_CENTERS: [&str; 3] = ["Delhi", "Mumbai", "Bengaluru"];

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub start: NaiveDate,
    pub days: u32,
    pub centers: Vec<String>,
    pub seed: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 30,
            centers: DEFAULT_CENTERS.iter().map(|c| c.to_string()).collect(),
            seed: 42,
        }
    }
}

fn normal(std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, std_dev)
        .map_err(|err| PipelineError::Validation(format!("invalid noise level {std_dev}: {err}")))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Simulates a daily backlog per center: demand that capacity cannot absorb
/// carries into tomorrow's queue, and turnaround grows with the queue.
pub fn generate_daily_ops(options: &GeneratorOptions) -> Result<Vec<DailySnapshot>> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let demand_noise = normal(25.0)?;
    let capacity_noise = normal(20.0)?;
    let tat_noise = normal(0.3)?;

    let mut rows = Vec::with_capacity(options.centers.len() * options.days as usize);
    for center in &options.centers {
        let mut queue = 0.0_f64;
        let base_demand = f64::from(rng.gen_range(200_u32..320));
        let base_capacity = f64::from(rng.gen_range(220_u32..340));

        for offset in 0..options.days {
            let demand = f64::max(50.0, base_demand + demand_noise.sample(&mut rng));
            let capacity = f64::max(50.0, base_capacity + capacity_noise.sample(&mut rng));
            let processed = f64::min(demand + queue, capacity);
            queue = f64::max(0.0, queue + demand - processed);
            let avg_tat = f64::max(1.0, 3.0 + 0.015 * queue + tat_noise.sample(&mut rng));

            rows.push(DailySnapshot {
                date: options.start + Duration::days(i64::from(offset)),
                center: center.clone(),
                demand_apps: round2(demand),
                capacity_apps: round2(capacity),
                processed_apps: round2(processed),
                queue_size: round2(queue),
                avg_tat_days: round2(avg_tat),
            });
        }
    }

    rows.sort_by(|a, b| a.center.cmp(&b.center).then(a.date.cmp(&b.date)));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotStore;

    #[test]
    fn same_seed_same_data() {
        let options = GeneratorOptions::default();
        let first = generate_daily_ops(&options).unwrap();
        let second = generate_daily_ops(&options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 90);
    }

    #[test]
    fn generated_rows_pass_validation() {
        let options = GeneratorOptions {
            days: 10,
            centers: vec!["Pune".to_string()],
            ..GeneratorOptions::default()
        };
        let rows = generate_daily_ops(&options).unwrap();
        assert!(rows.iter().all(|r| r.processed_apps <= r.capacity_apps + 0.01));
        assert!(rows.iter().all(|r| r.avg_tat_days >= 1.0));
        let store = SnapshotStore::from_records(rows).unwrap();
        assert_eq!(store.record_count(), 10);
    }
}
