use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sample_tail::report::{self, ReportFormat};
use sample_tail::state::Monitor;
use sample_tail::{MalformedPolicy, TailConfig};

/// Follow two-column sample files and report what has been read.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Files to follow; one channel each.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// JSON reader configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll interval of every reader, in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// How to treat lines that are not exactly two fields.
    #[arg(long)]
    on_malformed: Option<MalformedPolicy>,

    /// How often to sample the readers, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    refresh_ms: u64,

    /// Exit after this many refreshes (0 runs until killed).
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Format of the report written on exit.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TailConfig::from_json_file(path)?,
        None => TailConfig::default(),
    };
    if let Some(ms) = args.interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(policy) = args.on_malformed {
        config.on_malformed = policy;
    }

    let mut monitor = Monitor::attach_all(&args.paths, &config)?;
    log::info!("following {} file(s)", monitor.len());

    let refresh = Duration::from_millis(args.refresh_ms.max(1));
    let mut cycle = 0;
    while args.cycles == 0 || cycle < args.cycles {
        thread::sleep(refresh);
        cycle += 1;
        for summary in monitor.refresh() {
            if summary.new_samples == 0 {
                continue;
            }
            let (x, y) = summary.last.unwrap_or_default();
            log::info!(
                "{}: {} samples (+{}), last = ({x}, {y})",
                summary.name,
                summary.samples,
                summary.new_samples
            );
        }
    }

    let snapshots = monitor.snapshots();
    monitor.shutdown();

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report {}", path.display()))?;
            report::write_report(args.format, &snapshots, BufWriter::new(file))?;
        }
        None => report::write_report(args.format, &snapshots, io::stdout().lock())?,
    }
    Ok(())
}
