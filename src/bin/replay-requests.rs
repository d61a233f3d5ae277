//! Replays archived resolve requests against the configured backend.
//!
//! Backend settings come from the same `LORAGEO_*` environment as the server.
//! Replayed requests are not archived again.

use clap::Parser;
use lorageo::backend;
use lorageo::config::Config;
use lorageo::replay::{ReplayMode, ReplayOptions, ReplayRunner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "replay-requests")]
#[command(about = "Replay archived TDOA requests and write a CSV report", long_about = None)]
struct Args {
    /// Request type stored in the directory: single or multi
    #[arg(long, default_value = "single")]
    mode: ReplayMode,

    /// Backend whose stored responses are used as reference positions
    #[arg(long)]
    compare_with: Option<String>,

    /// Directory containing *.request.json files
    dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lorageo=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let backend = backend::new_backend(&config.backend)?;

    let options = ReplayOptions {
        mode: args.mode,
        compare_with: args.compare_with,
    };
    let summary = ReplayRunner::new(backend.as_ref(), options)
        .run(&args.dir)
        .await?;

    println!("Backend:  {}", backend.name());
    println!("Resolved: {}", summary.outcomes.len());
    println!("Failed:   {}", summary.failed);
    if let Some(mean) = summary.mean_distance() {
        println!("Mean distance to reference: {:.1} m", mean);
    }
    println!("Report:   {}", summary.report_path.display());

    Ok(())
}
