//! Operational stress scoring and early-warning detection for daily
//! per-center snapshots.

pub mod config;
pub mod episodes;
pub mod error;
pub mod export;
pub mod generate;
pub mod models;
pub mod pipeline;
pub mod pre_episode;
pub mod regime;
pub mod report;
pub mod signals;
pub mod status;
pub mod store;
pub mod stress;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{run, PipelineOutput};
pub use store::SnapshotStore;
