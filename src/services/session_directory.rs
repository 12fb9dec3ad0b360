use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{
    error::{GameError, GameResult},
    player::PlayerId,
    session::{Session, SessionId},
};

pub type SharedSession = Arc<Mutex<Session>>;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<SessionId, SharedSession>,
    codes: HashMap<String, SessionId>,
    players: HashMap<PlayerId, SessionId>,
}

/// Every live session, indexed by id, join code and member.
///
/// Each session carries its own lock; the directory lock is only held while the indexes
/// are read or updated and is never awaited on while a session is being mutated.
#[derive(Clone, Default)]
pub struct SessionDirectory {
    registry: Arc<Mutex<Registry>>,
}

pub struct CreatedSession {
    pub session_id: SessionId,
    pub host_id: PlayerId,
    pub session: SharedSession,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        host_name: &str,
        code_length: usize,
        max_attempts: usize,
    ) -> GameResult<CreatedSession> {
        let mut registry = self.registry.lock().await;

        let code = {
            let mut rng = rand::thread_rng();
            (0..max_attempts)
                .map(|_| generate_code(&mut rng, code_length))
                .find(|code| !registry.codes.contains_key(code))
                .ok_or(GameError::CodeSpaceExhausted)?
        };

        let session = Session::new(code.clone(), host_name)?;
        let session_id = session.id.clone();
        let host_id = session.host_id.clone();
        let shared = Arc::new(Mutex::new(session));

        registry.codes.insert(code, session_id.clone());
        registry.players.insert(host_id.clone(), session_id.clone());
        registry
            .sessions
            .insert(session_id.clone(), Arc::clone(&shared));

        Ok(CreatedSession {
            session_id,
            host_id,
            session: shared,
        })
    }

    pub async fn get(&self, session_id: &str) -> GameResult<SharedSession> {
        let registry = self.registry.lock().await;
        registry
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(GameError::NotFound("session"))
    }

    pub async fn find_by_code(&self, code: &str) -> GameResult<SharedSession> {
        let registry = self.registry.lock().await;
        registry
            .codes
            .get(&code.trim().to_uppercase())
            .and_then(|session_id| registry.sessions.get(session_id))
            .cloned()
            .ok_or(GameError::NotFound("session"))
    }

    pub async fn find_by_player(&self, player_id: &str) -> GameResult<SharedSession> {
        let registry = self.registry.lock().await;
        registry
            .players
            .get(player_id)
            .and_then(|session_id| registry.sessions.get(session_id))
            .cloned()
            .ok_or(GameError::NotFound("session"))
    }

    pub async fn register_player(&self, session_id: &str, player_id: &str) {
        let mut registry = self.registry.lock().await;
        registry
            .players
            .insert(player_id.to_string(), session_id.to_string());
    }

    pub async fn unregister_player(&self, player_id: &str) {
        let mut registry = self.registry.lock().await;
        registry.players.remove(player_id);
    }

    /// Drops a session and every index entry pointing at it.
    pub async fn remove(&self, session_id: &str) -> Option<SharedSession> {
        let mut registry = self.registry.lock().await;
        let removed = registry.sessions.remove(session_id)?;
        registry.codes.retain(|_, id| id != session_id);
        registry.players.retain(|_, id| id != session_id);
        Some(removed)
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_code_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let code = generate_code(&mut rng, 6);
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let directory = SessionDirectory::new();
        let created = directory.create("Host", 6, 32).await.unwrap();
        let code = created.session.lock().await.code.clone();

        assert!(directory.get(&created.session_id).await.is_ok());
        assert!(directory.find_by_code(&code.to_lowercase()).await.is_ok());
        assert!(directory.find_by_player(&created.host_id).await.is_ok());
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_lookups_fail() {
        let directory = SessionDirectory::new();
        assert_eq!(
            directory.find_by_code("NOPE00").await.err(),
            Some(GameError::NotFound("session"))
        );
        assert!(directory.get("missing").await.is_err());
        assert!(directory.find_by_player("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_code_space_exhaustion() {
        let directory = SessionDirectory::new();
        // A one-character code space holds 36 sessions at most.
        let mut results = Vec::new();
        for i in 0..200 {
            results.push(directory.create(&format!("Host{}", i), 1, 4).await.is_ok());
        }
        assert!(directory.len().await <= 36);
        assert!(results.iter().any(|ok| !ok));
    }

    #[tokio::test]
    async fn test_remove_clears_indexes() {
        let directory = SessionDirectory::new();
        let created = directory.create("Host", 6, 32).await.unwrap();
        let code = created.session.lock().await.code.clone();

        assert!(directory.remove(&created.session_id).await.is_some());
        assert!(directory.is_empty().await);
        assert!(directory.find_by_code(&code).await.is_err());
        assert!(directory.find_by_player(&created.host_id).await.is_err());
        assert!(directory.remove(&created.session_id).await.is_none());
    }
}
