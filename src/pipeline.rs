use tracing::info;

use crate::config::PipelineConfig;
use crate::episodes;
use crate::error::Result;
use crate::models::{
    EnrichedSignal, Episode, EpisodeSummary, PreEpisodeSignals, RejectedCenter, Series, StressRecord,
};
use crate::pre_episode;
use crate::signals;
use crate::store::SnapshotStore;
use crate::stress;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub signals: Series<EnrichedSignal>,
    pub records: Series<StressRecord>,
    pub episodes: Vec<Episode>,
    pub summaries: Vec<EpisodeSummary>,
    pub pre_episode: Vec<PreEpisodeSignals>,
    pub rejected: Vec<RejectedCenter>,
}

/// Runs every stage over a validated snapshot store.
pub fn run(store: &SnapshotStore, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;

    let signals::Enrichment { signals, rejected } = signals::enrich(store)?;
    let records = stress::score(&signals);
    let episodes = episodes::detect(&records, config);
    let summaries = episodes::summarize(signals.keys().map(String::as_str), &episodes);
    let pre_episode = pre_episode::analyze(&signals, &episodes, config.window_days);

    info!(
        centers = summaries.len(),
        rows = store.record_count(),
        episodes = episodes.len(),
        rejected = rejected.len(),
        stress_threshold = config.stress_threshold,
        regime_label = %config.regime_label,
        "pipeline complete"
    );

    Ok(PipelineOutput {
        signals,
        records,
        episodes,
        summaries,
        pre_episode,
        rejected,
    })
}
