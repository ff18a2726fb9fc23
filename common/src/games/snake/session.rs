use std::borrow::Cow;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::games::RandomSource;
use crate::{log, SessionId};
use super::bot_controller::BotController;
use super::broadcaster::SnakeBroadcaster;
use super::game_state::GameState;
use super::input::{change_direction, direction_from_input};
use super::types::{Direction, GameMode};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnakeCommand {
    Turn(Direction),
    /// Raw key name; directions go through `direction_from_input`,
    /// space toggles pause, anything else is ignored.
    Key(String),
    TogglePause,
    /// Start over, optionally switching mode.
    Reset(Option<GameMode>),
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    Human,
    Bot,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameOverPolicy {
    /// Leave the run loop.
    #[default]
    Stop,
    /// Start a new game in the same mode right away.
    Restart,
    /// Keep the finished game and wait for a reset command.
    Wait,
}

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub on_game_over: GameOverPolicy,
    pub max_ticks: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOverReport {
    pub score: u32,
    pub mode: GameMode,
    pub ticks: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or already over, nothing changed.
    Idle,
    Moved,
    Ate { score: u32 },
    GameOver(GameOverReport),
}

/// Single owner of a game lineage. Ticks and commands are applied in
/// sequence, never concurrently.
pub struct SnakeSession<R: RandomSource> {
    session_id: SessionId,
    state: GameState,
    rng: R,
    controller: Controller,
    pending_direction: Option<Direction>,
    tick: u64,
}

impl<R: RandomSource> SnakeSession<R> {
    pub fn new(session_id: SessionId, mode: GameMode, controller: Controller, mut rng: R) -> Self {
        let state = GameState::new(mode, &mut rng);
        Self {
            session_id,
            state,
            rng,
            controller,
            pending_direction: None,
            tick: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Applies an input-layer command between ticks. Returns `false` once
    /// the session has been asked to stop.
    pub fn apply(&mut self, command: SnakeCommand) -> bool {
        match command {
            SnakeCommand::Turn(direction) => self.request_turn(direction),
            SnakeCommand::Key(key) => {
                if key == " " || key == "Space" {
                    self.state.toggle_pause();
                } else if let Some(direction) = direction_from_input(&key) {
                    self.request_turn(direction);
                }
            }
            SnakeCommand::TogglePause => self.state.toggle_pause(),
            SnakeCommand::Reset(mode) => self.reset(mode.unwrap_or(self.state.mode)),
            SnakeCommand::Stop => return false,
        }
        true
    }

    // Checked against the direction of the last completed move, so two
    // presses inside one tick cannot fold the snake back onto its neck.
    fn request_turn(&mut self, requested: Direction) {
        if self.controller == Controller::Bot || self.state.is_game_over {
            return;
        }
        self.pending_direction = Some(change_direction(self.state.direction, requested));
    }

    pub fn reset(&mut self, mode: GameMode) {
        self.state = GameState::new(mode, &mut self.rng);
        self.pending_direction = None;
        self.tick = 0;
        log!("[session:{}] New game in {} mode", self.session_id, mode);
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state.is_paused || self.state.is_game_over {
            return TickOutcome::Idle;
        }

        match self.controller {
            Controller::Human => {
                if let Some(direction) = self.pending_direction.take() {
                    self.state.direction = direction;
                }
            }
            Controller::Bot => {
                let chosen = BotController::choose_direction(&self.state, &mut self.rng);
                self.state.direction = change_direction(self.state.direction, chosen);
            }
        }

        let score_before = self.state.score;
        let next = match self.state.step(&mut self.rng) {
            Cow::Borrowed(_) => return TickOutcome::Idle,
            Cow::Owned(next) => next,
        };
        self.state = next;
        self.tick += 1;

        if self.state.is_game_over {
            let report = self.report();
            log!(
                "[session:{}] Game over after {} ticks, score {} ({})",
                self.session_id,
                report.ticks,
                report.score,
                report.mode
            );
            return TickOutcome::GameOver(report);
        }

        if self.state.score > score_before {
            let head = self.state.head();
            log!(
                "[session:{}] ate food at ({}, {}). Score: {}",
                self.session_id,
                head.x,
                head.y,
                self.state.score
            );
            return TickOutcome::Ate {
                score: self.state.score,
            };
        }

        TickOutcome::Moved
    }

    pub fn report(&self) -> GameOverReport {
        GameOverReport {
            score: self.state.score,
            mode: self.state.mode,
            ticks: self.tick,
        }
    }

    /// Ticks back to back without waiting. Stops at game over, at
    /// `max_ticks`, or when the game is paused and can no longer advance.
    pub fn run_to_completion(&mut self, max_ticks: Option<u64>) -> Option<GameOverReport> {
        loop {
            if let Some(max) = max_ticks
                && self.tick >= max
            {
                return None;
            }

            match self.tick() {
                TickOutcome::GameOver(report) => return Some(report),
                TickOutcome::Idle => return None,
                TickOutcome::Moved | TickOutcome::Ate { .. } => {}
            }
        }
    }
}

impl<R: RandomSource + Send> SnakeSession<R> {
    /// Drives the session in real time. The tick period is re-read from
    /// `speed` after every tick; commands are applied as they arrive
    /// without shifting the next deadline.
    ///
    /// Returns the report of the last finished game, if any.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SnakeCommand>,
        broadcaster: impl SnakeBroadcaster,
        options: SessionOptions,
    ) -> Option<GameOverReport> {
        let mut last_report = None;
        let mut commands_open = true;
        let mut total_ticks: u64 = 0;
        let mut next_tick = Instant::now() + self.state.tick_interval();

        broadcaster.broadcast_state(&self.session_id, &self.state).await;

        loop {
            if !commands_open && (self.state.is_paused || self.state.is_game_over) {
                log!("[session:{}] Input closed while idle, stopping", self.session_id);
                break;
            }

            tokio::select! {
                _ = sleep_until(next_tick) => {
                    let outcome = self.tick();
                    next_tick = Instant::now() + self.state.tick_interval();

                    match outcome {
                        TickOutcome::Idle => {}
                        TickOutcome::Moved | TickOutcome::Ate { .. } => {
                            total_ticks += 1;
                            broadcaster.broadcast_state(&self.session_id, &self.state).await;
                        }
                        TickOutcome::GameOver(report) => {
                            total_ticks += 1;
                            broadcaster.broadcast_state(&self.session_id, &self.state).await;
                            broadcaster.broadcast_game_over(&self.session_id, &report).await;
                            last_report = Some(report);

                            match options.on_game_over {
                                GameOverPolicy::Stop => break,
                                GameOverPolicy::Restart => {
                                    self.reset(self.state.mode);
                                    broadcaster
                                        .broadcast_state(&self.session_id, &self.state)
                                        .await;
                                }
                                GameOverPolicy::Wait => {}
                            }
                        }
                    }

                    if let Some(max) = options.max_ticks
                        && total_ticks >= max
                    {
                        log!("[session:{}] Tick limit {} reached", self.session_id, max);
                        break;
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => {
                            if !self.apply(command) {
                                log!("[session:{}] Stop requested", self.session_id);
                                break;
                            }
                            broadcaster.broadcast_state(&self.session_id, &self.state).await;
                        }
                        None => commands_open = false,
                    }
                }
            }
        }

        last_report
    }
}
