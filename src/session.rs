//! Per-browser chat sessions
//!
//! Each session owns one `ConversationHistory`. A turn lock is held for the
//! whole turn, so turns within a session run one at a time while separate
//! sessions proceed independently. The history itself is only locked to
//! snapshot it before the remote call and to store the result after, so
//! readers never wait on a turn in flight. Nothing here outlives the
//! process, and sessions left idle are evicted.

use crate::conversation::{ConversationHistory, ConversationTurnProcessor};
use crate::llm::Message;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, RwLock};

/// Idle time after which a session is evicted (30 minutes)
const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Events pushed to stream subscribers of a session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A turn started; the remote call is in flight
    Thinking,
    /// A message was appended to the history
    Message { message: Message },
    /// The turn finished
    Done,
}

/// Outcome of one turn as seen by the UI
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: String,
    pub messages: Vec<Message>,
}

pub struct Session {
    id: String,
    turn: Mutex<()>,
    history: RwLock<ConversationHistory>,
    last_activity: std::sync::Mutex<Instant>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    fn new(id: String) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            id,
            turn: Mutex::new(()),
            history: RwLock::new(ConversationHistory::new()),
            last_activity: std::sync::Mutex::new(Instant::now()),
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Copy of the current messages
    pub async fn messages(&self) -> Vec<Message> {
        self.history.read().await.messages().to_vec()
    }

    /// Whether a turn is in flight
    pub fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        let last = *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        !self.is_busy() && now.saturating_duration_since(last) > timeout
    }

    /// Run one turn against this session's history
    pub async fn run_turn(
        &self,
        processor: &ConversationTurnProcessor,
        utterance: &str,
    ) -> TurnResult {
        let _turn = self.turn.lock().await;
        self.touch();

        let mut history = self.history.read().await.clone();
        let before = history.len();

        self.publish(SessionEvent::Thinking);
        let reply = processor.process_turn(&mut history, utterance).await;

        let messages = history.messages().to_vec();
        *self.history.write().await = history;

        for message in &messages[before..] {
            self.publish(SessionEvent::Message {
                message: message.clone(),
            });
        }
        self.publish(SessionEvent::Done);
        self.touch();

        TurnResult { reply, messages }
    }
}

/// All live sessions, keyed by id
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Start a session with an empty history, evicting idle ones first
    pub async fn create(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone()));

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|key, existing| {
            let idle = existing.is_idle(now, self.idle_timeout);
            if idle {
                tracing::info!(session = %key, "Evicting idle session");
            }
            !idle
        });
        sessions.insert(id, session.clone());
        tracing::debug!(session = %session.id(), live = sessions.len(), "Session created");
        session
    }

    /// Look up a session, counting the lookup as activity
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(id).cloned();
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    /// Drop a session and its history. Returns false if it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session = %id, "Session ended");
        }
        removed
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
