use serde::{Deserialize, Serialize};
use snake_common::config::{
    ConfigManager, FileContentConfigProvider, Validate, YamlConfigSerializer,
};
use snake_common::games::snake::GameMode;

pub const CONFIG_FILE: &str = "arena_config.yaml";
pub const MAX_SPECTATOR_SESSIONS: u32 = 50;

pub fn get_config_manager(
    path: &str,
) -> ConfigManager<FileContentConfigProvider, ArenaConfig, YamlConfigSerializer> {
    ConfigManager::from_yaml_file(path)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ArenaConfig {
    pub spectator_sessions: u32,
    pub mode: GameMode,
    /// Fixed seed for reproducible runs; random when absent.
    pub seed: Option<u64>,
    /// Per-session cap, mostly for pass-through games that never end.
    pub max_ticks: Option<u64>,
    /// Tick on the wall clock at `speed` instead of fast-forwarding.
    pub realtime: bool,
    pub leaderboard_limit: usize,
    pub player_name: String,
    /// Whitespace-separated keys fed one per tick to a human-controlled game.
    pub script: Option<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            spectator_sessions: 3,
            mode: GameMode::Walls,
            seed: None,
            max_ticks: Some(10_000),
            realtime: false,
            leaderboard_limit: 10,
            player_name: "Player".to_string(),
            script: None,
        }
    }
}

impl Validate for ArenaConfig {
    fn validate(&self) -> Result<(), String> {
        if self.spectator_sessions > MAX_SPECTATOR_SESSIONS {
            return Err(format!(
                "spectator_sessions must be at most {}",
                MAX_SPECTATOR_SESSIONS
            ));
        }
        if self.max_ticks == Some(0) {
            return Err("max_ticks must be greater than 0".to_string());
        }
        if !(1..=100).contains(&self.leaderboard_limit) {
            return Err("leaderboard_limit must be between 1 and 100".to_string());
        }
        if self.player_name.trim().is_empty() {
            return Err("player_name must not be empty".to_string());
        }
        if let Some(script) = &self.script
            && script.trim().is_empty()
        {
            return Err("script must contain at least one key".to_string());
        }
        Ok(())
    }
}
