mod arcade_service;
mod arena_config;
mod leaderboard;
mod scripted_player;
mod session_registry;
mod spectator;

use std::sync::Arc;

use clap::Parser;
use snake_common::config::{ConfigError, Validate};
use snake_common::games::snake::GameMode;
use snake_common::games::SessionRng;
use snake_common::{log, logger, PlayerName};

use arcade_service::ArcadeService;
use arena_config::{get_config_manager, ArenaConfig, CONFIG_FILE};
use leaderboard::InMemoryLeaderboard;
use session_registry::InMemorySessionRegistry;
use spectator::SpectatorOutcome;

#[derive(Parser)]
#[command(
    name = "snake_arena",
    about = "Headless snake arena: bot spectator games and a leaderboard"
)]
struct Args {
    #[arg(long)]
    use_log_prefix: bool,

    #[arg(long, default_value = CONFIG_FILE)]
    config: String,

    /// Number of bot-driven spectator games
    #[arg(long)]
    sessions: Option<u32>,

    /// walls or pass-through
    #[arg(long)]
    mode: Option<GameMode>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_ticks: Option<u64>,

    /// Tick on the wall clock instead of fast-forwarding
    #[arg(long)]
    realtime: bool,

    /// Keys for a scripted human game, e.g. "w d d s"
    #[arg(long)]
    script: Option<String>,
}

impl Args {
    fn apply_overrides(&self, config: &mut ArenaConfig) {
        if let Some(sessions) = self.sessions {
            config.spectator_sessions = sessions;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
        if self.realtime {
            config.realtime = true;
        }
        if self.script.is_some() {
            config.script = self.script.clone();
        }
    }
}

fn log_outcomes(outcomes: &[SpectatorOutcome]) {
    for outcome in outcomes {
        match &outcome.report {
            Some(report) => log!(
                "[session:{}] {} finished with {} points after {} ticks",
                outcome.session_id,
                outcome.player,
                report.score,
                report.ticks
            ),
            None => log!(
                "[session:{}] {} did not finish",
                outcome.session_id,
                outcome.player
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Arena".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let mut config = get_config_manager(&args.config).get_config()?;
    args.apply_overrides(&mut config);
    config.validate().map_err(ConfigError::Invalid)?;

    let mut rng = match config.seed {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_random(),
    };
    log!(
        "Snake arena starting: {} spectator game(s), {} mode, seed {}",
        config.spectator_sessions,
        config.mode,
        rng.seed()
    );

    let service = Arc::new(ArcadeService::new(
        InMemoryLeaderboard::default(),
        InMemorySessionRegistry::new(SessionRng::new(rng.random())),
    ));

    let outcomes = if config.realtime {
        spectator::run_realtime(
            &service,
            config.spectator_sessions,
            config.mode,
            config.max_ticks,
            &mut rng,
        )
        .await
    } else {
        spectator::run_fast(
            &service,
            config.spectator_sessions,
            config.mode,
            config.max_ticks,
            &mut rng,
        )
    };
    log_outcomes(&outcomes);

    if let Some(script) = &config.script {
        let keys = scripted_player::parse_script(script);
        let outcome = scripted_player::run_scripted(
            &service,
            PlayerName::new(config.player_name.clone()),
            config.mode,
            &keys,
            config.max_ticks,
            SessionRng::new(rng.random()),
        );
        log_outcomes(std::slice::from_ref(&outcome));
    }

    for mode in [GameMode::Walls, GameMode::PassThrough] {
        let entries = service.leaderboard(Some(mode), Some(config.leaderboard_limit));
        if entries.is_empty() {
            continue;
        }
        log!("Leaderboard ({}):", mode);
        for (index, entry) in entries.iter().enumerate() {
            log!(
                "  #{:<3} {:<24} {:>6}  {}",
                index + 1,
                entry.player.as_str(),
                entry.score,
                entry.date
            );
        }
    }

    let still_live = service.live_sessions();
    if !still_live.is_empty() {
        log!("{} session(s) still marked live", still_live.len());
    }

    log!("Snake arena shut down");
    Ok(())
}
