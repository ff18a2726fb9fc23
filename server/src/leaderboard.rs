use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use snake_common::games::snake::GameMode;
use snake_common::{EntryId, PlayerName};

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub id: EntryId,
    pub player: PlayerName,
    pub score: u32,
    pub mode: GameMode,
    pub date: NaiveDate,
}

pub trait LeaderboardRepository: Send + Sync {
    /// Stores the score and returns it with its rank within `mode`: one
    /// plus the number of entries in that mode with a strictly higher score.
    fn add_score(
        &self,
        player: PlayerName,
        score: u32,
        mode: GameMode,
    ) -> (LeaderboardEntry, usize);

    /// Highest scores first; ties keep submission order.
    fn top(&self, mode: Option<GameMode>, limit: usize) -> Vec<LeaderboardEntry>;
}

#[derive(Default)]
pub struct InMemoryLeaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl LeaderboardRepository for InMemoryLeaderboard {
    fn add_score(
        &self,
        player: PlayerName,
        score: u32,
        mode: GameMode,
    ) -> (LeaderboardEntry, usize) {
        let mut entries = self.entries.lock().unwrap();

        let entry = LeaderboardEntry {
            id: EntryId::new(format!("entry-{}", entries.len() + 1)),
            player,
            score,
            mode,
            date: Local::now().date_naive(),
        };

        let rank = entries
            .iter()
            .filter(|e| e.mode == mode && e.score > score)
            .count()
            + 1;

        entries.push(entry.clone());
        (entry, rank)
    }

    fn top(&self, mode: Option<GameMode>, limit: usize) -> Vec<LeaderboardEntry> {
        let entries = self.entries.lock().unwrap();

        let mut selected: Vec<LeaderboardEntry> = entries
            .iter()
            .filter(|e| mode.is_none_or(|m| e.mode == m))
            .cloned()
            .collect();

        // stable sort keeps earlier submissions ahead on equal scores
        selected.sort_by(|a, b| b.score.cmp(&a.score));
        selected.truncate(limit);
        selected
    }
}
