use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use incursion_app::control::ControlSurface;
use incursion_app::error::AppError;
use incursion_app::logging::{init_logging, LogFormat};
use incursion_app::world::WorldFile;
use incursion_core::clock::SystemClock;
use incursion_core::config::IncursionConfig;
use incursion_core::events::Notice;
use incursion_sim::notify::ChannelSink;
use incursion_sim::{Collaborators, EventController};

/// Headless incursion event host. Notices are written to stdout as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "incursion", version)]
struct Args {
    /// Engine config (JSON). Defaults apply when absent.
    #[arg(short, long, env = "INCURSION_CONFIG")]
    config: Option<PathBuf>,

    /// World file (JSON). A generated demo world is used when absent.
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// Actors in the generated demo world.
    #[arg(long, default_value_t = 40)]
    actors: u64,

    /// Start an event immediately, ignoring cooldown and actor count.
    #[arg(long)]
    force_start: bool,

    /// Exit after this many seconds instead of running forever.
    #[arg(long)]
    run_for: Option<u64>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,
}

/// Notices buffered between the loop and the stdout writer.
const NOTICE_BUFFER: usize = 1024;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_format, args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "incursion host failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => IncursionConfig::load(path)?,
        None => IncursionConfig::default(),
    };
    let world = match &args.world {
        Some(path) => WorldFile::load(path)?,
        None => WorldFile::demo(args.actors),
    }
    .build();

    let (sink, notices) = ChannelSink::bounded(NOTICE_BUFFER);
    std::thread::Builder::new()
        .name("incursion-notices".into())
        .spawn(move || {
            for notice in notices {
                print_notice(&notice);
            }
        })
        .map_err(AppError::Spawn)?;

    let controller = EventController::new(
        Arc::new(config),
        Collaborators {
            factions: world.factions,
            actors: world.actors,
            surface: world.surface,
            clock: Arc::new(SystemClock),
            sink: Arc::new(sink),
        },
    )?;

    let surface = ControlSurface::new();
    surface.start(controller)?;

    if args.force_start && !surface.start_event(true) {
        info!("forced start refused");
    }

    match args.run_for {
        Some(secs) => {
            std::thread::sleep(Duration::from_secs(secs));
            surface.shutdown();
        }
        None => surface.wait(),
    }
    Ok(())
}

fn print_notice(notice: &Notice) {
    match serde_json::to_string(notice) {
        Ok(line) => println!("{line}"),
        Err(err) => error!(error = %err, "failed to encode notice"),
    }
}
