// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::pacing::ScheduledTask;
use super::wizard::{ConversationView, Event, Wizard, WizardError};

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub wizard: Wizard,
    pub pending: Option<ScheduledTask>,
    pub last_active: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>, wizard: Wizard) -> Self {
        Self {
            id: id.into(),
            wizard,
            pending: None,
            last_active: Instant::now(),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Register a conversation under a fresh id and return the id.
    pub async fn create_session(&self, wizard: Wizard) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_session(&id, wizard).await
    }

    /// Register a conversation under a caller-chosen id, replacing any previous one.
    pub async fn insert_session(&self, id: &str, wizard: Wizard) -> String {
        let mut guard = self.inner.write().await;
        guard.insert(id.to_string(), Session::new(id, wizard));
        info!(session_id = id, "session started");
        id.to_string()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.contains_key(id)
    }

    /// Run `f` against a session's wizard and touch `last_active`.
    pub async fn with_wizard<R>(&self, id: &str, f: impl FnOnce(&mut Wizard) -> R) -> Option<R> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(id)?;
        session.last_active = Instant::now();
        Some(f(&mut session.wizard))
    }

    pub async fn view(&self, id: &str) -> Option<ConversationView> {
        let guard = self.inner.read().await;
        guard.get(id).map(|s| s.wizard.view())
    }

    /// Start a new cycle. Any prediction still scheduled for the old cycle is cancelled.
    pub async fn restart(&self, id: &str) -> Option<Result<ConversationView, WizardError>> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(id)?;
        if let Some(task) = session.pending.take() {
            debug!(session_id = id, "cancelling pending prediction");
            task.cancel();
        }
        session.last_active = Instant::now();
        Some(
            session
                .wizard
                .handle(Event::Restart)
                .map(|_| session.wizard.view()),
        )
    }

    /// Attach scheduled work to a session. Dropped (and thus cancelled) when
    /// the session is gone or already moved to another cycle.
    pub async fn set_pending(&self, id: &str, cycle: u64, task: ScheduledTask) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get_mut(id) {
            Some(session) if session.wizard.cycle() == cycle => {
                session.pending = Some(task);
                true
            }
            _ => false,
        }
    }

    /// Apply an asynchronous outcome only if the session still exists and
    /// is in the cycle that issued it.
    pub async fn apply_if_current(&self, id: &str, cycle: u64, event: Event) -> bool {
        let mut guard = self.inner.write().await;
        let Some(session) = guard.get_mut(id) else {
            debug!(session_id = id, "session gone, discarding {}", event.name());
            return false;
        };
        if session.wizard.cycle() != cycle {
            debug!(session_id = id, cycle, "stale cycle, discarding {}", event.name());
            return false;
        }
        match session.wizard.handle(event) {
            Ok(_) => true,
            Err(err) => {
                debug!(session_id = id, error = %err, "outcome rejected");
                false
            }
        }
    }

    /// Remove a session by id. Pending work is cancelled with it.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(session_id).is_some()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < self.ttl);
        before - guard.len()
    }

    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn list_session_ids(&self) -> Vec<String> {
        let guard = self.inner.read().await;
        guard.keys().cloned().collect()
    }
}
