use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::conversation::orchestrator::{Orchestrator, TurnSettings};
use crate::inference_client::CompletionBackend;
use crate::store::{ChatStore, FeedbackStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the tutor catalogue and progress queries.
    pub db: PgPool,
    pub chats: Arc<dyn ChatStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub inference: Arc<dyn CompletionBackend>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(
        db: PgPool,
        chats: Arc<dyn ChatStore>,
        feedback: Arc<dyn FeedbackStore>,
        inference: Arc<dyn CompletionBackend>,
        config: Config,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            chats.clone(),
            inference.clone(),
            TurnSettings::from_config(&config),
        );
        Self {
            db,
            chats,
            feedback,
            inference,
            orchestrator,
        }
    }
}
