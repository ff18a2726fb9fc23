use snake_common::games::snake::{GameMode, FOOD_SCORE};
use snake_common::{log, EntryId, PlayerName, SessionId};

use crate::leaderboard::{LeaderboardEntry, LeaderboardRepository, DEFAULT_LEADERBOARD_LIMIT};
use crate::session_registry::{GameSessionInfo, SessionRepository};

const UNKNOWN_PLAYER: &str = "Unknown";

#[derive(Debug, PartialEq, Eq)]
pub enum ArcadeError {
    SessionNotFound(SessionId),
    InvalidScore(u32),
}

impl std::fmt::Display for ArcadeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArcadeError::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            ArcadeError::InvalidScore(score) => {
                write!(f, "Invalid score {}: must be a multiple of {}", score, FOOD_SCORE)
            }
        }
    }
}

impl std::error::Error for ArcadeError {}

#[derive(Clone, Debug)]
pub struct SubmitScoreRequest {
    pub player: Option<String>,
    pub score: u32,
    pub mode: GameMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitScoreResponse {
    pub entry_id: EntryId,
    pub rank: usize,
}

/// Request handlers over injected stores. Holds no state of its own.
pub struct ArcadeService<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    leaderboard: L,
    sessions: S,
}

impl<L, S> ArcadeService<L, S>
where
    L: LeaderboardRepository,
    S: SessionRepository,
{
    pub fn new(leaderboard: L, sessions: S) -> Self {
        Self { leaderboard, sessions }
    }

    pub fn submit_score(
        &self,
        request: SubmitScoreRequest,
    ) -> Result<SubmitScoreResponse, ArcadeError> {
        if request.score % FOOD_SCORE != 0 {
            return Err(ArcadeError::InvalidScore(request.score));
        }

        let player = request
            .player
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| UNKNOWN_PLAYER.to_string());

        let (entry, rank) = self
            .leaderboard
            .add_score(PlayerName::new(player), request.score, request.mode);

        log!(
            "Score {} by {} in {} mode ranked #{}",
            entry.score,
            entry.player,
            entry.mode,
            rank
        );

        Ok(SubmitScoreResponse {
            entry_id: entry.id,
            rank,
        })
    }

    pub fn leaderboard(
        &self,
        mode: Option<GameMode>,
        limit: Option<usize>,
    ) -> Vec<LeaderboardEntry> {
        self.leaderboard
            .top(mode, limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT))
    }

    pub fn start_session(&self, player: PlayerName, mode: GameMode) -> GameSessionInfo {
        let info = self.sessions.create(player, mode);
        log!("[session:{}] Live session for {} ({})", info.id, info.player, info.mode);
        info
    }

    pub fn update_session(
        &self,
        id: &SessionId,
        score: u32,
        is_live: bool,
    ) -> Result<GameSessionInfo, ArcadeError> {
        self.sessions
            .update(id, score, is_live)
            .ok_or_else(|| ArcadeError::SessionNotFound(id.clone()))
    }

    pub fn finish_session(&self, id: &SessionId) -> Result<GameSessionInfo, ArcadeError> {
        self.sessions
            .close(id)
            .ok_or_else(|| ArcadeError::SessionNotFound(id.clone()))
    }

    pub fn live_sessions(&self) -> Vec<GameSessionInfo> {
        self.sessions.live()
    }

    pub fn session(&self, id: &SessionId) -> Result<GameSessionInfo, ArcadeError> {
        self.sessions
            .get(id)
            .ok_or_else(|| ArcadeError::SessionNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::InMemoryLeaderboard;
    use crate::session_registry::InMemorySessionRegistry;
    use snake_common::games::SessionRng;

    fn service() -> ArcadeService<InMemoryLeaderboard, InMemorySessionRegistry> {
        ArcadeService::new(
            InMemoryLeaderboard::default(),
            InMemorySessionRegistry::new(SessionRng::new(1)),
        )
    }

    #[test]
    fn test_submit_score_returns_rank() {
        let service = service();
        let first = service
            .submit_score(SubmitScoreRequest {
                player: Some("ann".to_string()),
                score: 120,
                mode: GameMode::Walls,
            })
            .unwrap();
        assert_eq!(first.rank, 1);

        let second = service
            .submit_score(SubmitScoreRequest {
                player: Some("ben".to_string()),
                score: 80,
                mode: GameMode::Walls,
            })
            .unwrap();
        assert_eq!(second.rank, 2);
        assert_ne!(first.entry_id, second.entry_id);
    }

    #[test]
    fn test_blank_player_becomes_unknown() {
        let service = service();
        for player in [None, Some("   ".to_string())] {
            service
                .submit_score(SubmitScoreRequest {
                    player,
                    score: 10,
                    mode: GameMode::PassThrough,
                })
                .unwrap();
        }

        let entries = service.leaderboard(Some(GameMode::PassThrough), None);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.player.as_str() == "Unknown"));
    }

    #[test]
    fn test_score_must_be_food_multiple() {
        let service = service();
        let result = service.submit_score(SubmitScoreRequest {
            player: Some("cheater".to_string()),
            score: 15,
            mode: GameMode::Walls,
        });
        assert_eq!(result, Err(ArcadeError::InvalidScore(15)));
        assert!(service.leaderboard(None, None).is_empty());
    }

    #[test]
    fn test_session_lifecycle() {
        let service = service();
        let info = service.start_session(PlayerName::from("viewer"), GameMode::Walls);
        assert_eq!(service.live_sessions().len(), 1);

        service.update_session(&info.id, 30, true).unwrap();
        assert_eq!(service.session(&info.id).unwrap().score, 30);

        service.finish_session(&info.id).unwrap();
        assert!(service.live_sessions().is_empty());
        assert!(!service.session(&info.id).unwrap().is_live);
    }

    #[test]
    fn test_finished_update_keeps_session_closed() {
        let service = service();
        let info = service.start_session(PlayerName::from("viewer"), GameMode::Walls);
        service.finish_session(&info.id).unwrap();

        let updated = service.update_session(&info.id, 40, false).unwrap();
        assert_eq!(updated.score, 40);
        assert!(!updated.is_live);
        assert!(service.live_sessions().is_empty());
    }

    #[test]
    fn test_missing_session_is_not_found() {
        let service = service();
        let id = SessionId::from("missing");
        assert_eq!(service.session(&id), Err(ArcadeError::SessionNotFound(id.clone())));
        assert_eq!(
            service.update_session(&id, 10, true),
            Err(ArcadeError::SessionNotFound(id.clone()))
        );
        assert_eq!(
            ArcadeError::SessionNotFound(id).to_string(),
            "Session not found: missing"
        );
    }
}
