use std::fmt::Write;

use crate::models::{
    CenterStatus, Episode, EpisodeSummary, Regime, RejectedCenter, WarningComparison,
};

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn render_episodes(episodes: &[Episode]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Early-Warning Episodes");

    if episodes.is_empty() {
        let _ = writeln!(output, "No stress episodes detected for any center.");
        return output;
    }

    for episode in episodes {
        let _ = writeln!(
            output,
            "- {} stressed from {} (warning {}, lead {} days)",
            episode.center,
            episode.stress_start,
            optional(episode.warning_start),
            optional(episode.lead_time_days)
        );
    }
    output
}

pub fn render_summary(summaries: &[EpisodeSummary]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Summary by Center");

    if summaries.is_empty() {
        let _ = writeln!(output, "No centers in this run.");
        return output;
    }

    for summary in summaries {
        let _ = writeln!(
            output,
            "- {}: {} episodes, {} early warnings (rate {:.2}, avg lead {})",
            summary.center,
            summary.episodes,
            summary.early_warnings,
            summary.detection_rate,
            summary
                .avg_lead_time_days
                .map(|lead| format!("{lead:.2} days"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    output
}

pub fn render_rejected(rejected: &[RejectedCenter]) -> String {
    let mut output = String::new();
    if rejected.is_empty() {
        return output;
    }

    let _ = writeln!(output, "## Skipped Centers");
    for center in rejected {
        let _ = writeln!(output, "- {}: {}", center.center, center.reason);
    }
    output
}

pub fn render_comparison(groups: &[WarningComparison]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Pre-Stress Signals by Warning Outcome");

    if groups.is_empty() {
        let _ = writeln!(output, "No episodes with pre-stress history.");
        return output;
    }

    for group in groups {
        let label = if group.early_warning { "warned" } else { "missed" };
        let _ = writeln!(
            output,
            "- {} ({} episodes): utilization {:.3}, queue velocity {:.3}, TAT volatility {:.3}",
            label,
            group.episodes,
            group.utilization_mean_pre,
            group.queue_vel_mean_pre,
            group.tat_std_mean_pre
        );
    }
    output
}

pub fn render_status(statuses: &[CenterStatus], limit: usize) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Top Risk Centers (latest day)");

    for status in statuses.iter().take(limit) {
        let _ = writeln!(
            output,
            "- {} on {}: {} (stress {:.2}, TAT {:.2} days, queue {:.0}, utilization {:.2})",
            status.center,
            status.date,
            status.regime,
            status.stress_index,
            status.avg_tat_days,
            status.queue_size,
            status.utilization
        );
    }
    output
}

pub fn render_regime_counts(center: &str, counts: &[(Regime, usize)]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Regime Days for {center}");
    for (regime, days) in counts {
        let _ = writeln!(output, "- {regime}: {days}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn episodes_show_missing_warning_as_dash() {
        let text = render_episodes(&[Episode {
            center: "Delhi".to_string(),
            stress_start: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            warning_start: None,
            lead_time_days: None,
        }]);
        assert!(text.contains("- Delhi stressed from 2024-01-09 (warning -, lead - days)"));
    }

    #[test]
    fn summary_lines_include_rate_and_lead() {
        let text = render_summary(&[EpisodeSummary {
            center: "Mumbai".to_string(),
            episodes: 3,
            early_warnings: 2,
            detection_rate: 0.67,
            avg_lead_time_days: Some(1.5),
        }]);
        assert!(text.contains("Mumbai: 3 episodes, 2 early warnings (rate 0.67, avg lead 1.50 days)"));
    }

    #[test]
    fn skipped_centers_listed_only_when_present() {
        assert!(render_rejected(&[]).is_empty());
        let text = render_rejected(&[RejectedCenter {
            center: "Pune".to_string(),
            reason: "too short".to_string(),
        }]);
        assert!(text.contains("- Pune: too short"));
    }

    #[test]
    fn empty_inputs_render_placeholders() {
        assert!(render_episodes(&[]).contains("No stress episodes"));
        assert!(render_comparison(&[]).contains("No episodes with pre-stress history"));
    }
}
