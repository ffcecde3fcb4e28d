//! Display demo.
//!
//! Opens a display over the in-memory store, joins one scripted controller
//! and plays the chosen game to the end on simulated time.
//!
//! ```text
//! gamehub_display --game racing --seed 7
//! RUST_LOG=debug gamehub_display --game memory
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use gamehub::games::{ActorPhase, GameKind, GameRecord, GameStatsBook};
use gamehub::session::InMemoryStore;
use gamehub::shared::HubConfig;
use gamehub::{ControllerPad, DisplayHost, HubResult};
use tracing_subscriber::EnvFilter;

/// Simulated frame length.
const FRAME: Duration = Duration::from_millis(16);

/// Frames before the demo gives up.
const MAX_FRAMES: u32 = 60 * 60 * 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Game {
    Memory,
    Platformer,
    Racing,
}

impl From<Game> for GameKind {
    fn from(game: Game) -> Self {
        match game {
            Game::Memory => GameKind::Memory,
            Game::Platformer => GameKind::Platformer,
            Game::Racing => GameKind::Racing,
        }
    }
}

/// Party game hub display demo.
#[derive(Parser, Debug)]
#[command(name = "gamehub_display", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Game to play.
    #[arg(short, long, value_enum, default_value = "memory")]
    game: Game,

    /// Seed for boards, platforms and obstacles.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Controller name.
    #[arg(short, long, default_value = "Player")]
    name: String,
}

fn main() -> HubResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => HubConfig::load(path)?,
        None => HubConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.platformer.seed = Some(seed);
        config.racer.seed = Some(seed);
    }

    let store = Arc::new(InMemoryStore::new(config.session.channel_capacity));
    let stats = Arc::new(GameStatsBook::new());
    let encoders = config.encoders.clone();
    let mut display = DisplayHost::open(config, store.clone(), Arc::clone(&stats))?;
    println!("Scan to join: {}", display.join_url());

    let mut pad = ControllerPad::join_url(store, &display.join_url(), &args.name, &encoders)?;
    display.start(args.game.into());

    let record = play(&mut display, &mut pad)?;
    match record {
        Some(record) => {
            println!(
                "{} finished: {} scored {} ({} moves, {}s)",
                record.kind, record.player_name, record.score, record.moves, record.elapsed_secs
            );
            for achievement in stats.achievements(&record.player_name) {
                println!("  unlocked: {}", achievement.label());
            }
        }
        None => println!("no result after {MAX_FRAMES} frames"),
    }
    Ok(())
}

/// Runs frames until the game reports a record.
fn play(display: &mut DisplayHost<Arc<GameStatsBook>>, pad: &mut ControllerPad) -> HubResult<Option<GameRecord>> {
    let clock = Instant::now();
    let mut seen: HashMap<usize, u8> = HashMap::new();

    for frame in 0..MAX_FRAMES {
        // The pad reacts to what it can see, like a player would.
        pad.refresh()?;
        match display.active().map(gamehub::ActiveGame::kind) {
            Some(GameKind::Memory) => memory_move(display, pad, &mut seen),
            Some(GameKind::Platformer) => {
                let phase = display.platformer().map(gamehub::games::PlatformerGame::phase);
                let charge = display.platformer().map_or(0.0, gamehub::games::PlatformerGame::charge);
                let ready = match phase {
                    Some(ActorPhase::Grounded) => true,
                    Some(ActorPhase::Charging) => charge > 0.6,
                    _ => false,
                };
                if ready {
                    pad.jump_at(clock + FRAME * frame);
                }
            }
            Some(GameKind::Racing) => {
                if frame % 2 == 0 {
                    pad.tap();
                } else if frame % 45 == 1 {
                    pad.switch_lane(u8::try_from(frame / 45 % 3).unwrap_or(1));
                }
            }
            None => return Ok(None),
        }

        display.pump()?;
        if let Some(record) = display.advance(FRAME)? {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Plays like a player with a perfect memory of every face it has seen.
fn memory_move(display: &DisplayHost<Arc<GameStatsBook>>, pad: &ControllerPad, seen: &mut HashMap<usize, u8>) {
    let Some(game) = display.memory() else {
        return;
    };
    let cards = game.cards();
    for &position in game.flipped() {
        seen.insert(position, cards[position].symbol);
    }
    if game.flipped().len() >= 2 {
        return;
    }

    let matched = pad.matched_cards();
    let open = |p: &usize| !matched.contains(p) && !game.flipped().contains(p);
    let known_partner = |symbol: u8, except: Option<usize>| {
        seen.iter()
            .find(|(p, s)| **s == symbol && Some(**p) != except && open(*p))
            .map(|(p, _)| *p)
    };

    let next = match game.flipped().first() {
        Some(&first) => known_partner(cards[first].symbol, Some(first)),
        None => seen
            .iter()
            .filter(|(p, _)| open(*p))
            .find_map(|(p, s)| known_partner(*s, Some(*p)).map(|_| *p)),
    }
    .or_else(|| (0..cards.len()).find(|p| open(p) && !seen.contains_key(p)))
    .or_else(|| (0..cards.len()).find(|p| open(p)));

    if let Some(position) = next {
        pad.select_card(position);
    }
}
