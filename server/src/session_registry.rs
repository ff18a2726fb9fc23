use std::collections::HashMap;
use std::sync::Mutex;

use snake_common::games::SessionRng;
use snake_common::games::snake::GameMode;
use snake_common::id_generator::generate_hex_id;
use snake_common::{PlayerName, SessionId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSessionInfo {
    pub id: SessionId,
    pub player: PlayerName,
    pub score: u32,
    pub mode: GameMode,
    pub is_live: bool,
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, player: PlayerName, mode: GameMode) -> GameSessionInfo;
    fn update(&self, id: &SessionId, score: u32, is_live: bool) -> Option<GameSessionInfo>;
    fn close(&self, id: &SessionId) -> Option<GameSessionInfo>;
    fn get(&self, id: &SessionId) -> Option<GameSessionInfo>;
    /// Live sessions in creation order.
    fn live(&self) -> Vec<GameSessionInfo>;
}

struct RegistryInner {
    sessions: HashMap<SessionId, GameSessionInfo>,
    order: Vec<SessionId>,
    rng: SessionRng,
}

pub struct InMemorySessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl InMemorySessionRegistry {
    pub fn new(rng: SessionRng) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                order: Vec::new(),
                rng,
            }),
        }
    }
}

impl SessionRepository for InMemorySessionRegistry {
    fn create(&self, player: PlayerName, mode: GameMode) -> GameSessionInfo {
        let mut inner = self.inner.lock().unwrap();

        let id = loop {
            let candidate = SessionId::new(generate_hex_id(&mut inner.rng));
            if !inner.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let info = GameSessionInfo {
            id: id.clone(),
            player,
            score: 0,
            mode,
            is_live: true,
        };
        inner.sessions.insert(id.clone(), info.clone());
        inner.order.push(id);
        info
    }

    fn update(&self, id: &SessionId, score: u32, is_live: bool) -> Option<GameSessionInfo> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner.sessions.get_mut(id)?;
        session.score = score;
        session.is_live = is_live;
        Some(session.clone())
    }

    fn close(&self, id: &SessionId) -> Option<GameSessionInfo> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner.sessions.get_mut(id)?;
        session.is_live = false;
        Some(session.clone())
    }

    fn get(&self, id: &SessionId) -> Option<GameSessionInfo> {
        self.inner.lock().unwrap().sessions.get(id).cloned()
    }

    fn live(&self) -> Vec<GameSessionInfo> {
        let inner = self.inner.lock().unwrap();
        inner
            .order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .filter(|s| s.is_live)
            .cloned()
            .collect()
    }
}
