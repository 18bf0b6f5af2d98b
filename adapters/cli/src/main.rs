#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Delve session in the terminal.

mod input;

use std::{
    env,
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use delve_core::SimulationConfig;
use delve_rendering::{Presenter, TextPresenter};
use delve_system_persistence::{self as persistence, SaveState};
use delve_system_scheduler::{run_session, SessionOutcome};
use delve_world::World;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::input::KeyboardInput;

const SAVE_DIRECTORY: &str = ".rlg327";
const SAVE_FILE: &str = "dungeon";

/// Turn-based dungeon crawl with persistent levels.
#[derive(Debug, Parser)]
#[command(name = "delve", version, about)]
struct Cli {
    /// Resume from the save file instead of generating a level.
    #[arg(long)]
    load: bool,
    /// Write the starting level to the save file.
    #[arg(long)]
    save: bool,
    /// Number of monsters placed on freshly generated levels.
    #[arg(long, value_name = "COUNT")]
    nummon: Option<usize>,
    /// Seed for the random number generator.
    #[arg(long)]
    seed: Option<u64>,
}

/// Entry point for the Delve command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let path = save_path()?;

    let mut config = SimulationConfig::default();
    if let Some(count) = cli.nummon {
        config = config.with_monster_count(count);
    }
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, "starting session");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut world = if cli.load {
        load(&path, &config)?
    } else {
        World::generate(config, &mut rng).context("failed to populate the level")?
    };

    if cli.save {
        save(&path, &world)?;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = KeyboardInput::new(stdin.lock(), TextPresenter::new(stdout.lock()));
    let outcome = run_session(&mut world, &mut input, &mut rng);
    info!(?outcome, "session finished");

    input
        .presenter_mut()
        .present_lines("Game over", &[outcome_message(outcome).to_owned()])
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn save_path() -> Result<PathBuf> {
    let home = env::var_os("HOME").context("HOME is not set; cannot locate the save file")?;
    Ok(PathBuf::from(home).join(SAVE_DIRECTORY).join(SAVE_FILE))
}

fn load(path: &Path, config: &SimulationConfig) -> Result<World> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let state = persistence::read(BufReader::new(file), config)
        .with_context(|| format!("failed to read {}", path.display()))?;
    info!(path = %path.display(), monsters = state.monsters.len(), "level loaded");
    state
        .into_world(config.clone())
        .context("failed to rebuild the saved level")
}

fn save(path: &Path, world: &World) -> Result<()> {
    if let Some(directory) = path.parent() {
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create {}", directory.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    persistence::write(&SaveState::capture(world), BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "level saved");
    Ok(())
}

fn outcome_message(outcome: SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Victory => "You win! Every monster on the level is dead.",
        SessionOutcome::Defeat => "You lose! The PC has been killed.",
        SessionOutcome::Quit => "You quit.",
        SessionOutcome::Stalled => "Nothing is left to move.",
    }
}
