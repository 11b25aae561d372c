use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use visaops_early_warning::generate::{self, GeneratorOptions};
use visaops_early_warning::models::Regime;
use visaops_early_warning::{export, pre_episode, report, status, store};
use visaops_early_warning::{PipelineConfig, PipelineOutput, SnapshotStore};

#[derive(Parser)]
#[command(name = "visaops-early-warning")]
#[command(about = "Operational stress regimes and early-warning lead times per center", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PipelineArgs {
    /// Daily snapshot CSV
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value_t = 0.3)]
    stress_threshold: f64,
    #[arg(long, default_value = "stressed")]
    regime_label: Regime,
    #[arg(long, default_value_t = 5)]
    window_days: i64,
}

impl PipelineArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            stress_threshold: self.stress_threshold,
            regime_label: self.regime_label,
            window_days: self.window_days,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic daily snapshot CSV
    Generate {
        #[arg(long, default_value = "visaops_daily.csv")]
        out: PathBuf,
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,
        #[arg(long, default_value_t = 30)]
        days: u32,
        /// Center names; repeat or comma-separate
        #[arg(long, value_delimiter = ',', default_value = "Delhi,Mumbai,Bengaluru")]
        center: Vec<String>,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Compute rolling signals, stress index and regimes
    Signals {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value = "visaops_signals.csv")]
        out: PathBuf,
    },
    /// Detect stress episodes and their warning lead times
    Episodes {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value = "early_warning_episodes.csv")]
        out: PathBuf,
        /// Print the per-center summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare pre-stress signals for warned and missed episodes
    Analyze {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Show the latest regime of each center
    Status {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Also list days per regime for this center
        #[arg(long)]
        center: Option<String>,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Run every stage and write all outputs
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn load_store(path: &Path) -> anyhow::Result<SnapshotStore> {
    let records = store::read_snapshots(path)
        .with_context(|| format!("failed to read snapshots from {}", path.display()))?;
    Ok(SnapshotStore::from_records(records)?)
}

fn run_pipeline(args: &PipelineArgs) -> anyhow::Result<PipelineOutput> {
    let store = load_store(&args.input)?;
    Ok(visaops_early_warning::run(&store, &args.config())?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Generate {
            out,
            start,
            days,
            center,
            seed,
        } => {
            let rows = generate::generate_daily_ops(&GeneratorOptions {
                start,
                days,
                centers: center,
                seed,
            })?;
            export::write_rows_file(&out, &rows)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Saved {} rows to {}.", rows.len(), out.display());
        }
        Commands::Signals { pipeline, out } => {
            let output = run_pipeline(&pipeline)?;
            let written = export::write_signals_file(&out, &output.records)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Saved {written} rows to {}.", out.display());
        }
        Commands::Episodes {
            pipeline,
            out,
            json,
        } => {
            let output = run_pipeline(&pipeline)?;
            export::write_rows_file(&out, &output.episodes)
                .with_context(|| format!("failed to write {}", out.display()))?;

            print!("{}", report::render_episodes(&output.episodes));
            println!();
            if json {
                println!("{}", serde_json::to_string_pretty(&output.summaries)?);
            } else {
                print!("{}", report::render_summary(&output.summaries));
                print!("{}", report::render_rejected(&output.rejected));
            }
        }
        Commands::Analyze { pipeline } => {
            let output = run_pipeline(&pipeline)?;
            let groups = pre_episode::compare_by_warning(&output.pre_episode);

            println!("## Pre-Stress Windows ({} days)", pipeline.window_days);
            for row in &output.pre_episode {
                println!(
                    "- {} {} warned={} over {} days: utilization {:.3}, queue velocity {:.3}, TAT volatility {:.3}",
                    row.center,
                    row.stress_start,
                    row.early_warning,
                    row.days_observed,
                    row.utilization_mean_pre,
                    row.queue_vel_mean_pre,
                    row.tat_std_mean_pre
                );
            }
            println!();
            print!("{}", report::render_comparison(&groups));
        }
        Commands::Status {
            pipeline,
            center,
            limit,
        } => {
            let output = run_pipeline(&pipeline)?;
            let statuses = status::latest_status(&output.records);
            print!("{}", report::render_status(&statuses, limit));

            if let Some(center) = center {
                anyhow::ensure!(
                    output.records.contains_key(&center),
                    "center '{center}' not found in {}",
                    pipeline.input.display()
                );
                println!();
                let counts = status::regime_counts(&output.records, &center);
                print!("{}", report::render_regime_counts(&center, &counts));
            }
        }
        Commands::Run { pipeline, out_dir } => {
            let output = run_pipeline(&pipeline)?;
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;

            let signals_path = out_dir.join("visaops_signals.csv");
            let episodes_path = out_dir.join("early_warning_episodes.csv");
            let summary_path = out_dir.join("early_warning_summary.csv");
            let pre_episode_path = out_dir.join("pre_episode_signals.csv");

            export::write_signals_file(&signals_path, &output.records)?;
            export::write_rows_file(&episodes_path, &output.episodes)?;
            export::write_rows_file(&summary_path, &output.summaries)?;
            export::write_rows_file(&pre_episode_path, &output.pre_episode)?;

            print!("{}", report::render_summary(&output.summaries));
            print!("{}", report::render_rejected(&output.rejected));
            println!("Outputs written to {}.", out_dir.display());
        }
    }

    Ok(())
}
