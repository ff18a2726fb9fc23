use std::sync::Arc;

use snake_common::games::snake::{Controller, GameMode, SnakeCommand, SnakeSession, TickOutcome};
use snake_common::games::SessionRng;
use snake_common::{log, PlayerName};

use crate::arcade_service::ArcadeService;
use crate::leaderboard::LeaderboardRepository;
use crate::session_registry::SessionRepository;
use crate::spectator::{ArcadeBroadcaster, SpectatorOutcome};

/// Splits a script into key tokens: `"w w ArrowLeft d"`.
pub fn parse_script(script: &str) -> Vec<String> {
    script.split_whitespace().map(str::to_string).collect()
}

/// Plays a human-controlled game from a list of keys, one key before each
/// tick. Once the keys run out the snake keeps its last heading.
pub fn run_scripted<L, S>(
    service: &Arc<ArcadeService<L, S>>,
    player: PlayerName,
    mode: GameMode,
    keys: &[String],
    max_ticks: Option<u64>,
    rng: SessionRng,
) -> SpectatorOutcome
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    let info = service.start_session(player.clone(), mode);
    let broadcaster = ArcadeBroadcaster::new(service.clone(), player.clone());
    let mut session = SnakeSession::new(info.id.clone(), mode, Controller::Human, rng);
    let mut keys = keys.iter();

    let report = loop {
        if let Some(max) = max_ticks
            && session.tick_count() >= max
        {
            log!("[session:{}] Tick limit {} reached", info.id, max);
            break None;
        }

        if let Some(key) = keys.next() {
            session.apply(SnakeCommand::Key(key.clone()));
        }

        match session.tick() {
            TickOutcome::GameOver(report) => break Some(report),
            TickOutcome::Idle if session.state().is_paused && keys.as_slice().is_empty() => {
                log!("[session:{}] Script ended while paused", info.id);
                break None;
            }
            TickOutcome::Idle | TickOutcome::Moved | TickOutcome::Ate { .. } => {}
        }
    };

    broadcaster.record_final(&info.id, session.state(), report.as_ref());

    SpectatorOutcome {
        session_id: info.id,
        player,
        report,
    }
}
