//! `txtrack-replay`: run a recorded trace through the tracker.
//!
//! ```text
//! txtrack-replay demos/fork.json
//! txtrack-replay trace.json --config tracker.json --json
//! RUST_LOG=txtrack_settlement=debug txtrack-replay trace.json
//! ```
//!
//! Notifications, unpin calls and a summary go to stdout as JSON lines.
//! Logs go to stderr.

mod trace;

use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use txtrack_settlement::root_hex;
use txtrack_types::{TrackerConfig, constants};

use crate::trace::{Trace, load_config, replay};

#[derive(Debug, Parser)]
#[command(name = "txtrack-replay", version = constants::VERSION, about = "Replay a chain event trace through the transaction tracker")]
struct Args {
    /// Trace file: scripted chain plus event list.
    trace: PathBuf,

    /// Tracker configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json, &args.log_level);

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };
    let trace = Trace::load(&args.trace)?;
    tracing::info!(
        engine = constants::ENGINE_NAME,
        trace = %args.trace.display(),
        events = trace.events.len(),
        "Starting replay"
    );

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let outcome = replay(trace, &config, &mut out)?;

    tracing::debug!(
        notifications = outcome.notifications.len(),
        unpin_calls = outcome.unpins.len(),
        settled = outcome.stats.settled,
        done = outcome.stats.done,
        root = %root_hex(&outcome.root),
        "Replay finished"
    );
    Ok(())
}
