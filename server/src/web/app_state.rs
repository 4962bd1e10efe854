use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::info;

use crate::dashboard::{Session, SessionId};
use crate::sync::RetryPolicy;
use crate::twitter::TwitterService;

/// Shared state for all web handlers.
pub struct AppState {
    pub twitter: Arc<TwitterService>,
    /// Retry policy handed to every new session's saves.
    pub retry: RetryPolicy,
    /// Directory served under /assets.
    pub assets_dir: String,
    /// Open browser sessions, keyed by the id in the session cookie. Holds at
    /// most one entry: the server drives a single Twitter account.
    sessions: DashMap<SessionId, Session>,
    /// Running load of each session.
    loads: DashMap<SessionId, AbortHandle>,
}

impl AppState {
    pub fn new(twitter: Arc<TwitterService>, retry: RetryPolicy, assets_dir: String) -> Self {
        Self {
            twitter,
            retry,
            assets_dir,
            sessions: DashMap::new(),
            loads: DashMap::new(),
        }
    }

    /// Register a fresh session, replacing any open one. Loading is left to
    /// the caller.
    pub fn open_session(&self) -> Session {
        let open: Vec<SessionId> = self.sessions.iter().map(|s| *s.key()).collect();
        for id in open {
            self.close_session(id);
        }

        let session = Session::new(self.twitter.clone(), self.retry.clone());
        self.sessions.insert(session.id, session.clone());
        info!(session = %session.id, open = self.sessions.len(), "session opened");
        session
    }

    pub fn session(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|s| s.value().clone())
    }

    /// Start loading `session` in the background, aborting its previous load.
    pub fn start_load(&self, session: Session) {
        let id = session.id;
        let task = tokio::spawn(async move { session.load().await });
        if let Some(previous) = self.loads.insert(id, task.abort_handle()) {
            previous.abort();
        }
    }

    pub fn close_session(&self, id: SessionId) -> bool {
        if let Some((_, load)) = self.loads.remove(&id) {
            load.abort();
        }
        let closed = self.sessions.remove(&id).is_some();
        if closed {
            info!(session = %id, open = self.sessions.len(), "session closed");
        }
        closed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
