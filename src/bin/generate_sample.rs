use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Append a noisy sine wave to sample files, one `x y` line per tick.
#[derive(Debug, Parser)]
struct Args {
    /// Files to append to (created if missing).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Delay between ticks, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Number of ticks (0 runs until killed).
    #[arg(long, default_value_t = 0)]
    count: u64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

struct Target {
    path: PathBuf,
    file: File,
    next_x: u64,
    phase: f64,
}

fn count_lines(path: &Path) -> Result<u64> {
    match File::open(path) {
        Ok(file) => {
            let mut n = 0;
            for line in BufReader::new(file).lines() {
                line.with_context(|| format!("reading {}", path.display()))?;
                n += 1;
            }
            Ok(n)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e).with_context(|| format!("opening {}", path.display())),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let noise = Normal::new(0.0, 0.05).context("building noise distribution")?;

    let mut targets = args
        .files
        .iter()
        .enumerate()
        .map(|(i, path)| -> Result<Target> {
            let next_x = count_lines(path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening {} for append", path.display()))?;
            Ok(Target {
                path: path.clone(),
                file,
                next_x,
                phase: i as f64 * std::f64::consts::FRAC_PI_2,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let interval = Duration::from_millis(args.interval_ms);
    let mut tick = 0;
    while args.count == 0 || tick < args.count {
        for target in &mut targets {
            let x = target.next_x;
            let y = (x as f64 * 0.1 + target.phase).sin() + noise.sample(&mut rng);
            // One write per line so a concurrent reader never sees half of it.
            let line = format!("{x} {y:.4}\n");
            target
                .file
                .write_all(line.as_bytes())
                .with_context(|| format!("appending to {}", target.path.display()))?;
            target.next_x += 1;
        }
        tick += 1;
        log::debug!("tick {tick}: wrote {} line(s)", targets.len());
        thread::sleep(interval);
    }

    println!("Appended {tick} line(s) to each of {} file(s)", targets.len());
    Ok(())
}
