use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

use mdt_console::config::{self, Overrides};
use mdt_console::feed;
use mdt_console::host_io::{JsonLinesHost, SnapshotWriter};
use mdt_console::Session;

#[derive(Parser, Debug)]
#[command(name = "mdt-console", version, about = "Patrol console plate and radar tracking")]
struct Cli {
    /// Event feed, one JSON message per line [default: stdin]
    #[arg(value_name = "FEED")]
    feed: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of tracked plates
    #[arg(long)]
    capacity: Option<usize>,

    /// Speed limit used for lane banding
    #[arg(long)]
    speed_limit: Option<f64>,

    /// Keep a manual plate selection when new plates are detected
    #[arg(long)]
    no_auto_select: bool,

    /// Write a display snapshot after every change to this file
    #[arg(long, value_name = "FILE")]
    snapshots: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let overrides = Overrides {
        capacity: cli.capacity,
        speed_limit: cli.speed_limit,
        no_auto_select: cli.no_auto_select,
    };
    let config = config::resolve(cli.config.as_deref(), &overrides);
    log::info!(
        "Unit {}: capacity {}, speed limit {}",
        config.unit_name,
        config.capacity,
        config.speed_limit
    );

    let snapshots: Box<dyn Write + Send> = match &cli.snapshots {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::sink()),
    };

    let input = feed::open(cli.feed.as_deref()).await?;
    let (lines, reader) = feed::spawn(input);

    let mut session = Session::new(
        config,
        JsonLinesHost::new(std::io::stdout()),
        SnapshotWriter::new(snapshots),
    );

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new(
            "console",
            move |subsys: SubsystemHandle| async move {
                session.run(lines, subsys.on_shutdown_requested()).await;
                if subsys.is_shutdown_requested() {
                    // The reader may be parked on stdin
                    reader.abort();
                    return Ok(());
                }
                match reader.await {
                    Ok(result) => result.map(|_| ()),
                    Err(e) => Err(anyhow::anyhow!("feed reader failed: {}", e)),
                }
            },
        ));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(1000))
    .await
    .map_err(|e| anyhow::anyhow!("{}", e))
}
