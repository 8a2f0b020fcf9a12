//! Runs one conversational turn end to end.
//!
//! Order per turn, under the chat's lock:
//! 1. persist the user message
//! 2. load the recent window of prior messages
//! 3. build the prompt and call the inference backend
//! 4. persist the reply and move `last_message_at` (one transaction)
//!
//! A failed inference call leaves the user message in place and produces no
//! assistant message.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::conversation::context::{build_prompt, retrieve_context};
use crate::conversation::locks::ChatLocks;
use crate::inference_client::{CompletionBackend, InferenceError, SamplingParams};
use crate::models::chat::{ChatRow, MessageRow};
use crate::models::tutor::TutorRow;
use crate::store::{ChatStore, NewMessage, StoreError};

#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub window: usize,
    pub sampling: SamplingParams,
    /// Model used when the tutor does not name one.
    pub default_model: String,
}

impl TurnSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window: config.context_window,
            sampling: SamplingParams {
                temperature: config.inference.temperature,
                max_tokens: config.inference.max_tokens,
                top_p: config.inference.top_p,
            },
            default_model: config.inference.default_model.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnOutcome {
    pub user_message: MessageRow,
    #[serde(rename = "ai_response")]
    pub assistant_message: MessageRow,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// The user message was stored; the reply was not.
    #[error("inference failed for chat {chat_id}: {source}")]
    Inference {
        chat_id: i64,
        user_message: MessageRow,
        #[source]
        source: InferenceError,
    },
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn ChatStore>,
    backend: Arc<dyn CompletionBackend>,
    settings: Arc<TurnSettings>,
    locks: ChatLocks,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ChatStore>,
        backend: Arc<dyn CompletionBackend>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            store,
            backend,
            settings: Arc::new(settings),
            locks: ChatLocks::new(),
        }
    }

    /// Generates the tutor's reply to `user_message` given the prior `history`
    /// (chronological, not containing `user_message`). Persists nothing.
    pub async fn reply(
        &self,
        chat: &ChatRow,
        tutor: &TutorRow,
        user_message: &str,
        history: &[MessageRow],
    ) -> Result<String, InferenceError> {
        let retrieved = retrieve_context(tutor, user_message);
        let prompt = build_prompt(
            tutor,
            history,
            user_message,
            self.settings.window,
            retrieved.as_deref(),
        );

        let model = self.model_for(tutor);
        info!(
            "Chat {}: requesting reply from {model} with {} prompt entries",
            chat.id,
            prompt.len()
        );

        self.backend
            .complete(model, &prompt, &self.settings.sampling)
            .await
    }

    /// Runs a full turn and returns both persisted messages, user first.
    pub async fn send_turn(
        &self,
        chat: &ChatRow,
        tutor: &TutorRow,
        content: String,
        attachments: Option<Value>,
    ) -> Result<TurnOutcome, TurnError> {
        let _turn = self.locks.acquire(chat.id).await;

        let user_message = self
            .store
            .append_message(NewMessage::user(chat.id, content, attachments))
            .await?;

        let mut history = self
            .store
            .recent_messages(chat.id, Some(user_message.id), self.settings.window as i64)
            .await?;
        history.reverse();

        let text = match self
            .reply(chat, tutor, &user_message.content, &history)
            .await
        {
            Ok(text) => text,
            Err(source) => {
                warn!("Chat {}: no reply to message {}: {source}", chat.id, user_message.id);
                return Err(TurnError::Inference {
                    chat_id: chat.id,
                    user_message,
                    source,
                });
            }
        };

        let metadata = json!({
            "model_id": self.model_for(tutor),
            "tutor_id": tutor.id,
            "temperature": self.settings.sampling.temperature,
            "max_tokens": self.settings.sampling.max_tokens,
            "top_p": self.settings.sampling.top_p,
        });
        let assistant_message = self
            .store
            .append_reply(NewMessage::assistant(chat.id, text, metadata))
            .await?;

        info!(
            "Chat {}: stored turn {} -> {}",
            chat.id, user_message.id, assistant_message.id
        );
        Ok(TurnOutcome {
            user_message,
            assistant_message,
        })
    }

    fn model_for<'a>(&'a self, tutor: &'a TutorRow) -> &'a str {
        let model = tutor.model_id.trim();
        if model.is_empty() {
            &self.settings.default_model
        } else {
            model
        }
    }
}
