use anyhow::{Context, Result};
use clap::Parser;
use conquest_core::{
    Command, EventLogObserver, GameConfig, GameController, ObserverRegistry,
};
use std::path::PathBuf;
use std::time::Duration;

mod loader;
mod tui;

/// Default world map: country outlines as GeoJSON.
const DEFAULT_MAP_URL: &str =
    "https://raw.githubusercontent.com/johan/world.geo.json/master/countries.geo.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time world-conquest simulation", long_about = None)]
struct Args {
    /// Map source: a GeoJSON file path or an http(s) URL
    #[arg(long, default_value = DEFAULT_MAP_URL)]
    data: String,

    /// Local GeoJSON document tried once if the primary source fails
    #[arg(long, default_value = "data/demo.geo.json")]
    fallback: PathBuf,

    /// RNG seed; identical seeds replay identical sessions
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Initial time multiplier (clamped to the supported range)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Run without the TUI, driving fixed ticks as fast as possible
    #[arg(long)]
    headless: bool,

    /// Simulated milliseconds per tick in headless mode
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Headless tick limit; the run also stops at victory or defeat
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,

    /// Write game events as JSONL to this file
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    log::info!("loading map from {}", args.data);
    let records = loader::load_map(&args.data, Some(&args.fallback))
        .context("no usable map source, aborting")?;

    let mut game = GameController::new(GameConfig::default(), args.seed);
    game.ingest_map(records).context("map data unusable")?;
    if args.speed != 1.0 {
        let _ = game.execute(Command::SetSpeed { speed: args.speed });
    }

    let mut registry = ObserverRegistry::new();
    if let Some(path) = &args.event_log {
        let observer = EventLogObserver::to_file(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        registry.register(Box::new(observer));
    }

    if args.headless {
        run_headless(game, &registry, &args)
    } else {
        tui::run(game, &registry)
    }
}

/// Drive the simulation with synthetic fixed deltas, no sleeping, until an
/// outcome or the tick limit. The player never acts; selection times out
/// into an auto-claimed start.
fn run_headless(mut game: GameController, registry: &ObserverRegistry, args: &Args) -> Result<()> {
    let delta = Duration::from_millis(args.tick_ms);
    for _ in 0..args.max_ticks {
        game.tick(delta);
        let snapshot = game.snapshot();
        registry.notify(&snapshot);
        if snapshot.state.phase.is_terminal() {
            break;
        }
    }

    let snapshot = game.snapshot();
    log::info!(
        "finished in {} after {} ticks ({} ms simulated): player {}, ai {}, neutral {}",
        snapshot.state.phase.label(),
        snapshot.tick,
        game.now_ms(),
        snapshot.state.player_territories,
        snapshot.state.ai_territories,
        snapshot.state.neutral_territories,
    );
    Ok(())
}
