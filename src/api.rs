//! HTTP API and chat page

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::conversation::ConversationTurnProcessor;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<ConversationTurnProcessor>,
    pub sessions: Arc<SessionStore>,
    /// Whether the API key was found at startup
    pub api_key_found: bool,
}

impl AppState {
    pub fn new(processor: ConversationTurnProcessor, api_key_found: bool) -> Self {
        Self {
            processor: Arc::new(processor),
            sessions: Arc::new(SessionStore::new()),
            api_key_found,
        }
    }
}
