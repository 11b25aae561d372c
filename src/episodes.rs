use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::models::{Episode, EpisodeSummary, Regime, Series, StressRecord};
use crate::store::partition_by;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeState {
    NotInEpisode,
    InEpisode,
}

/// Finds stress episodes for every center, grouped by center.
pub fn detect(records: &Series<StressRecord>, config: &PipelineConfig) -> Vec<Episode> {
    let mut episodes = Vec::new();
    for (center, series) in records {
        episodes.extend(detect_center(
            center,
            series,
            config.stress_threshold,
            config.regime_label,
        ));
    }
    info!(episodes = episodes.len(), "detected stress episodes");
    episodes
}

/// Walks one center's date-ordered series, recording the onset of each run of
/// `regime_label` and the warning run that preceded it.
pub fn detect_center(
    center: &str,
    series: &[StressRecord],
    stress_threshold: f64,
    regime_label: Regime,
) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut state = EpisodeState::NotInEpisode;

    for (i, record) in series.iter().enumerate() {
        let in_label = record.regime == regime_label;
        match state {
            EpisodeState::NotInEpisode if in_label => {
                let stress_start = record.date();
                let warning_start =
                    warning_onset(series, i, stress_threshold).map(|j| series[j].date());
                let lead_time_days = warning_start.map(|w| (stress_start - w).num_days());

                debug!(
                    center,
                    %stress_start,
                    lead_time_days = ?lead_time_days,
                    "episode onset"
                );
                episodes.push(Episode {
                    center: center.to_string(),
                    stress_start,
                    warning_start,
                    lead_time_days,
                });
                state = EpisodeState::InEpisode;
            }
            EpisodeState::InEpisode if !in_label => state = EpisodeState::NotInEpisode,
            _ => {}
        }
    }

    episodes
}

/// Earliest index of the unbroken run at or above `stress_threshold` that ends
/// immediately before `onset`.
pub fn warning_onset(series: &[StressRecord], onset: usize, stress_threshold: f64) -> Option<usize> {
    let mut earliest = None;
    for j in (0..onset).rev() {
        if series[j].stress_index >= stress_threshold {
            earliest = Some(j);
        } else {
            break;
        }
    }
    earliest
}

/// Per-center detection statistics. Every listed center appears, including
/// those without episodes.
pub fn summarize<'a, I>(centers: I, episodes: &[Episode]) -> Vec<EpisodeSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_center = partition_by(episodes.to_vec(), |episode| episode.center.as_str());
    for center in centers {
        by_center.entry(center.to_string()).or_default();
    }

    by_center
        .into_iter()
        .map(|(center, center_episodes)| summarize_center(center, &center_episodes))
        .collect()
}

pub fn summarize_center(center: String, episodes: &[Episode]) -> EpisodeSummary {
    let leads: Vec<i64> = episodes.iter().filter_map(|e| e.lead_time_days).collect();
    let total = episodes.len();
    let detected = leads.len();

    let detection_rate = if total == 0 {
        0.0
    } else {
        round2(detected as f64 / total as f64)
    };
    let avg_lead_time_days = if detected == 0 {
        None
    } else {
        Some(round2(leads.iter().sum::<i64>() as f64 / detected as f64))
    };

    EpisodeSummary {
        center,
        episodes: total,
        early_warnings: detected,
        detection_rate,
        avg_lead_time_days,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailySnapshot, EnrichedSignal, RollingStats};
    use chrono::{Duration, NaiveDate};

    fn record(day: i64, regime: Regime, stress_index: f64) -> StressRecord {
        StressRecord {
            signal: EnrichedSignal {
                snapshot: DailySnapshot {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day),
                    center: "X".to_string(),
                    demand_apps: 0.0,
                    capacity_apps: 0.0,
                    processed_apps: 0.0,
                    queue_size: 0.0,
                    avg_tat_days: 0.0,
                },
                utilization: 0.0,
                queue_delta: 0.0,
                w7: RollingStats::default(),
                w14: RollingStats::default(),
            },
            utilization_z: 0.0,
            queue_vel_mean_7d_z: 0.0,
            tat_std_7d_z: 0.0,
            stress_index,
            regime,
        }
    }

    fn build(regimes: &[Regime], indices: &[f64]) -> Vec<StressRecord> {
        regimes
            .iter()
            .zip(indices)
            .enumerate()
            .map(|(i, (regime, index))| record(i as i64, *regime, *index))
            .collect()
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn mixed_series_yields_two_episodes() {
        use Regime::*;
        let series = build(
            &[Stable, Elevated, Stressed, Stressed, Stable, Stressed],
            &[0.1, 0.6, 0.9, 0.95, 0.1, 0.95],
        );
        let episodes = detect_center("X", &series, 0.3, Stressed);

        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].stress_start, day(2));
        assert_eq!(episodes[0].warning_start, Some(day(1)));
        assert_eq!(episodes[0].lead_time_days, Some(1));
        assert_eq!(episodes[1].stress_start, day(5));
        assert_eq!(episodes[1].warning_start, None);
        assert_eq!(episodes[1].lead_time_days, None);
    }

    #[test]
    fn long_stressed_run_is_one_episode() {
        use Regime::*;
        let series = build(&[Stressed; 6], &[1.0; 6]);
        let episodes = detect_center("X", &series, 0.3, Stressed);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].warning_start, None);
    }

    #[test]
    fn backward_scan_stops_at_first_gap() {
        use Regime::*;
        let series = build(
            &[Elevated, Elevated, Elevated, Elevated, Elevated, Stressed],
            &[0.7, 0.7, 0.2, 0.4, 0.5, 0.8],
        );
        let episodes = detect_center("X", &series, 0.3, Stressed);
        assert_eq!(episodes[0].warning_start, Some(day(3)));
        assert_eq!(episodes[0].lead_time_days, Some(2));
    }

    #[test]
    fn one_quiet_day_before_onset_suppresses_warning() {
        use Regime::*;
        let series = build(
            &[Elevated, Elevated, Elevated, Stressed],
            &[0.7, 0.7, 0.29, 0.8],
        );
        let episodes = detect_center("X", &series, 0.3, Stressed);
        assert_eq!(episodes[0].warning_start, None);
    }

    #[test]
    fn scan_runs_to_start_of_series() {
        use Regime::*;
        let series = build(&[Elevated, Elevated, Stressed], &[0.3, 0.5, 0.9]);
        let episodes = detect_center("X", &series, 0.3, Stressed);
        assert_eq!(episodes[0].warning_start, Some(day(0)));
        assert_eq!(episodes[0].lead_time_days, Some(2));
    }

    #[test]
    fn lead_time_present_iff_warning_present() {
        use Regime::*;
        let series = build(
            &[Elevated, Stressed, Stable, Stressed, Elevated, Elevated, Stressed],
            &[0.5, 0.8, -1.0, 0.9, 0.4, 0.35, 0.8],
        );
        for episode in detect_center("X", &series, 0.3, Stressed) {
            assert_eq!(episode.warning_start.is_some(), episode.lead_time_days.is_some());
            if let (Some(warning), Some(lead)) = (episode.warning_start, episode.lead_time_days) {
                assert_eq!((episode.stress_start - warning).num_days(), lead);
                assert!(lead >= 1);
            }
        }
    }

    #[test]
    fn regime_label_is_configurable() {
        use Regime::*;
        let series = build(&[Stable, Elevated, Elevated, Stable], &[-1.0, 0.1, 0.2, -1.0]);
        assert!(detect_center("X", &series, 0.3, Stressed).is_empty());
        assert_eq!(detect_center("X", &series, 0.3, Elevated).len(), 1);
    }

    #[test]
    fn summary_rates_and_leads() {
        let episodes = vec![
            Episode {
                center: "A".to_string(),
                stress_start: day(5),
                warning_start: Some(day(4)),
                lead_time_days: Some(1),
            },
            Episode {
                center: "A".to_string(),
                stress_start: day(9),
                warning_start: None,
                lead_time_days: None,
            },
            Episode {
                center: "A".to_string(),
                stress_start: day(20),
                warning_start: Some(day(18)),
                lead_time_days: Some(2),
            },
        ];
        let summaries = summarize(["A", "B"], &episodes);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].center, "A");
        assert_eq!(summaries[0].episodes, 3);
        assert_eq!(summaries[0].early_warnings, 2);
        assert_eq!(summaries[0].detection_rate, 0.67);
        assert_eq!(summaries[0].avg_lead_time_days, Some(1.5));

        assert_eq!(summaries[1].center, "B");
        assert_eq!(summaries[1].episodes, 0);
        assert_eq!(summaries[1].detection_rate, 0.0);
        assert_eq!(summaries[1].avg_lead_time_days, None);
    }

    #[test]
    fn detection_rate_stays_in_unit_interval() {
        let summary = summarize_center(
            "A".to_string(),
            &[Episode {
                center: "A".to_string(),
                stress_start: day(3),
                warning_start: Some(day(1)),
                lead_time_days: Some(2),
            }],
        );
        assert!((0.0..=1.0).contains(&summary.detection_rate));
        assert_eq!(summary.detection_rate, 1.0);
    }
}
