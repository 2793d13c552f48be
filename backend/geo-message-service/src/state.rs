use crate::config::RetrievalConfig;
use crate::db::{MessageRepository, MessageStore};
use crate::services::{MessageEditor, MessageFinder};
use std::sync::Arc;

/// Shared handler state. Built once at startup and cloned per worker.
#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<MessageFinder>,
    pub editor: Arc<MessageEditor>,
    pub store: Arc<dyn MessageStore>,
    /// Report bounding-box validation failures as `200` + plain text
    pub legacy_inband_errors: bool,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, retrieval: &RetrievalConfig) -> Self
    where
        S: MessageRepository + 'static,
    {
        Self {
            finder: Arc::new(MessageFinder::new(store.clone(), retrieval)),
            editor: Arc::new(MessageEditor::new(store.clone())),
            store,
            legacy_inband_errors: retrieval.legacy_inband_errors,
        }
    }
}
