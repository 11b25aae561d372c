use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::models::{EnrichedSignal, Episode, PreEpisodeSignals, Series, WarningComparison};
use crate::signals::mean;

/// Averages the key signals over the `window_days` preceding each episode.
/// Episodes with no records in that window are skipped.
pub fn analyze(
    signals: &Series<EnrichedSignal>,
    episodes: &[Episode],
    window_days: i64,
) -> Vec<PreEpisodeSignals> {
    let mut rows = Vec::new();

    for episode in episodes {
        let Some(series) = signals.get(&episode.center) else {
            continue;
        };
        let window_start = window_start(episode.stress_start, window_days);
        let window: Vec<&EnrichedSignal> = series
            .iter()
            .filter(|s| s.date() >= window_start && s.date() < episode.stress_start)
            .collect();

        if window.is_empty() {
            debug!(
                center = %episode.center,
                stress_start = %episode.stress_start,
                "no records before episode; skipped"
            );
            continue;
        }

        let column = |f: fn(&EnrichedSignal) -> f64| {
            mean(&window.iter().map(|s| f(s)).collect::<Vec<_>>())
        };
        rows.push(PreEpisodeSignals {
            center: episode.center.clone(),
            stress_start: episode.stress_start,
            early_warning: episode.lead_time_days.is_some(),
            days_observed: window.len(),
            utilization_mean_pre: column(|s| s.utilization),
            queue_vel_mean_pre: column(|s| s.queue_vel_mean_7d()),
            tat_std_mean_pre: column(|s| s.tat_std_7d()),
        });
    }

    info!(rows = rows.len(), window_days, "analyzed pre-episode windows");
    rows
}

/// First day of the lookback window; a window reaching past the earliest
/// representable date starts there.
pub fn window_start(stress_start: NaiveDate, window_days: i64) -> NaiveDate {
    Duration::try_days(window_days)
        .and_then(|span| stress_start.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Mean pre-episode signals for detected versus missed episodes.
pub fn compare_by_warning(rows: &[PreEpisodeSignals]) -> Vec<WarningComparison> {
    [false, true]
        .into_iter()
        .filter_map(|early_warning| {
            let group: Vec<&PreEpisodeSignals> =
                rows.iter().filter(|r| r.early_warning == early_warning).collect();
            if group.is_empty() {
                return None;
            }
            let column = |f: fn(&PreEpisodeSignals) -> f64| {
                mean(&group.iter().map(|r| f(r)).collect::<Vec<_>>())
            };
            Some(WarningComparison {
                early_warning,
                episodes: group.len(),
                utilization_mean_pre: column(|r| r.utilization_mean_pre),
                queue_vel_mean_pre: column(|r| r.queue_vel_mean_pre),
                tat_std_mean_pre: column(|r| r.tat_std_mean_pre),
            })
        })
        .collect()
}
