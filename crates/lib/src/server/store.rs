//! In-memory sessions for the local backend: one per activated channel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::SessionId;

/// One chat turn as recorded by the backend.
#[derive(Debug, Clone)]
pub struct Turn {
    pub message: String,
    pub response: String,
}

/// A session bound to the channel it was created for.
#[derive(Debug, Clone)]
pub struct ChannelSession {
    pub id: SessionId,
    pub channel_name: String,
    pub history: Vec<Turn>,
}

/// Sessions kept by default before the oldest is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Turns kept per session; older turns are dropped first.
pub const MAX_TURNS_PER_SESSION: usize = 200;

#[derive(Default)]
struct Sessions {
    by_id: HashMap<SessionId, ChannelSession>,
    /// Creation order, oldest first.
    order: VecDeque<SessionId>,
}

/// In-memory store for sessions (create, get, record turns). Holds at most
/// `max_sessions` sessions; creating one more evicts the oldest.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Sessions>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Sessions::default())),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Create a new session for `channel_name` with a generated id; returns the id.
    pub async fn create(&self, channel_name: impl Into<String>) -> SessionId {
        let id = format!("sess-{}", uuid::Uuid::new_v4());
        let session = ChannelSession {
            id: id.clone(),
            channel_name: channel_name.into(),
            history: Vec::new(),
        };
        let mut g = self.inner.write().await;
        while g.order.len() >= self.max_sessions {
            let Some(oldest) = g.order.pop_front() else {
                break;
            };
            g.by_id.remove(&oldest);
            log::debug!("evicted session {}", oldest);
        }
        g.order.push_back(id.clone());
        g.by_id.insert(id.clone(), session);
        id
    }

    /// Return a clone of the session if it exists.
    pub async fn get(&self, id: &str) -> Option<ChannelSession> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// Append a turn to the session; returns error if session not found.
    pub async fn record_turn(
        &self,
        id: &str,
        message: impl Into<String>,
        response: impl Into<String>,
    ) -> Result<(), String> {
        let mut g = self.inner.write().await;
        let session = g
            .by_id
            .get_mut(id)
            .ok_or_else(|| "session not found".to_string())?;
        if session.history.len() >= MAX_TURNS_PER_SESSION {
            session.history.remove(0);
        }
        session.history.push(Turn {
            message: message.into(),
            response: response.into(),
        });
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}
