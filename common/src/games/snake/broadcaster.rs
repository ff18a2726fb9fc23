use std::future::Future;

use crate::SessionId;
use super::game_state::GameState;
use super::session::GameOverReport;

/// Receives snapshots from a running session. Rendering, spectator
/// registries and score submission sit behind this trait.
pub trait SnakeBroadcaster: Send + Sync + Clone + 'static {
    fn broadcast_state(
        &self,
        session_id: &SessionId,
        state: &GameState,
    ) -> impl Future<Output = ()> + Send;

    fn broadcast_game_over(
        &self,
        session_id: &SessionId,
        report: &GameOverReport,
    ) -> impl Future<Output = ()> + Send;
}
