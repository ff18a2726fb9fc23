use std::sync::Arc;

use snake_common::games::snake::{
    Controller, GameMode, GameOverPolicy, GameOverReport, GameState, SessionOptions,
    SnakeBroadcaster, SnakeCommand, SnakeSession,
};
use snake_common::games::SessionRng;
use snake_common::id_generator::generate_player_name;
use snake_common::{log, PlayerName, SessionId};
use tokio::sync::mpsc;

use crate::arcade_service::{ArcadeService, SubmitScoreRequest};
use crate::leaderboard::LeaderboardRepository;
use crate::session_registry::SessionRepository;

#[derive(Clone, Debug)]
pub struct SpectatorOutcome {
    pub session_id: SessionId,
    pub player: PlayerName,
    /// `None` when the game was cut short by the tick cap or a stop.
    pub report: Option<GameOverReport>,
}

/// Mirrors a running game into the arcade: score updates while live,
/// session close and score submission on game over.
pub struct ArcadeBroadcaster<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    service: Arc<ArcadeService<L, S>>,
    player: PlayerName,
}

impl<L, S> Clone for ArcadeBroadcaster<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            player: self.player.clone(),
        }
    }
}

impl<L, S> ArcadeBroadcaster<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    pub fn new(service: Arc<ArcadeService<L, S>>, player: PlayerName) -> Self {
        Self { service, player }
    }

    // A finished game stays closed even when snapshots keep coming.
    fn record_state(&self, session_id: &SessionId, state: &GameState) {
        let is_live = !state.is_game_over;
        if let Err(e) = self.service.update_session(session_id, state.score, is_live) {
            log!("[session:{}] Failed to update session: {}", session_id, e);
        }
    }

    fn record_game_over(&self, session_id: &SessionId, report: &GameOverReport) {
        if let Err(e) = self.service.finish_session(session_id) {
            log!("[session:{}] Failed to close session: {}", session_id, e);
        }

        let request = SubmitScoreRequest {
            player: Some(self.player.to_string()),
            score: report.score,
            mode: report.mode,
        };
        if let Err(e) = self.service.submit_score(request) {
            log!("[session:{}] Failed to submit score: {}", session_id, e);
        }
    }

    fn close_unfinished(&self, session_id: &SessionId) {
        if let Err(e) = self.service.finish_session(session_id) {
            log!("[session:{}] Failed to close session: {}", session_id, e);
        }
    }

    /// Final bookkeeping for a game driven outside the async loop.
    pub fn record_final(
        &self,
        session_id: &SessionId,
        state: &GameState,
        report: Option<&GameOverReport>,
    ) {
        self.record_state(session_id, state);
        match report {
            Some(report) => self.record_game_over(session_id, report),
            None => self.close_unfinished(session_id),
        }
    }
}

impl<L, S> SnakeBroadcaster for ArcadeBroadcaster<L, S>
where
    L: LeaderboardRepository + 'static,
    S: SessionRepository + 'static,
{
    async fn broadcast_state(&self, session_id: &SessionId, state: &GameState) {
        self.record_state(session_id, state);
    }

    async fn broadcast_game_over(&self, session_id: &SessionId, report: &GameOverReport) {
        self.record_game_over(session_id, report);
    }
}

struct PreparedSession<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    session: SnakeSession<SessionRng>,
    broadcaster: ArcadeBroadcaster<L, S>,
    player: PlayerName,
}

fn prepare_sessions<L, S>(
    service: &Arc<ArcadeService<L, S>>,
    count: u32,
    mode: GameMode,
    rng: &mut SessionRng,
) -> Vec<PreparedSession<L, S>>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    (0..count)
        .map(|_| {
            let player = PlayerName::new(generate_player_name(rng));
            let info = service.start_session(player.clone(), mode);
            let session_rng = SessionRng::new(rng.random());
            log!("[session:{}] Bot seed {}", info.id, session_rng.seed());

            PreparedSession {
                session: SnakeSession::new(info.id, mode, Controller::Bot, session_rng),
                broadcaster: ArcadeBroadcaster::new(service.clone(), player.clone()),
                player,
            }
        })
        .collect()
}

/// Plays every session back to back without waiting for the clock.
pub fn run_fast<L, S>(
    service: &Arc<ArcadeService<L, S>>,
    count: u32,
    mode: GameMode,
    max_ticks: Option<u64>,
    rng: &mut SessionRng,
) -> Vec<SpectatorOutcome>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    prepare_sessions(service, count, mode, rng)
        .into_iter()
        .map(|mut prepared| {
            let report = prepared.session.run_to_completion(max_ticks);
            let session_id = prepared.session.session_id().clone();

            prepared
                .broadcaster
                .record_final(&session_id, prepared.session.state(), report.as_ref());

            SpectatorOutcome {
                session_id,
                player: prepared.player,
                report,
            }
        })
        .collect()
}

/// Runs every session on its own task, ticking at the game's speed.
/// Ctrl+C stops all of them; unfinished sessions are closed without a score.
pub async fn run_realtime<L, S>(
    service: &Arc<ArcadeService<L, S>>,
    count: u32,
    mode: GameMode,
    max_ticks: Option<u64>,
    rng: &mut SessionRng,
) -> Vec<SpectatorOutcome>
where
    L: LeaderboardRepository + 'static,
    S: SessionRepository + 'static,
{
    let mut senders = Vec::new();
    let mut running = Vec::new();

    for prepared in prepare_sessions(service, count, mode, rng) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = prepared.session.session_id().clone();
        let broadcaster = prepared.broadcaster.clone();
        let options = SessionOptions {
            on_game_over: GameOverPolicy::Stop,
            max_ticks,
        };

        let handle = tokio::spawn(prepared.session.run(rx, broadcaster, options));
        senders.push(tx);
        running.push((session_id, prepared.player, prepared.broadcaster, handle));
    }

    let stop_senders = senders.clone();
    let shutdown = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log!("Shutdown signal received, stopping sessions...");
            for tx in &stop_senders {
                let _ = tx.send(SnakeCommand::Stop);
            }
        }
    });

    let mut outcomes = Vec::with_capacity(running.len());
    for (session_id, player, broadcaster, handle) in running {
        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                log!("[session:{}] Session task failed: {}", session_id, e);
                None
            }
        };

        if report.is_none() {
            broadcaster.close_unfinished(&session_id);
        }

        outcomes.push(SpectatorOutcome {
            session_id,
            player,
            report,
        });
    }

    shutdown.abort();
    drop(senders);
    outcomes
}
