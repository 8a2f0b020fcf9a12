//! Fixtures shared by unit and router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::conversation::orchestrator::TurnSettings;
use crate::inference_client::{CompletionBackend, InferenceError, PromptMessage, SamplingParams};
use crate::models::chat::{MessageRole, MessageRow};
use crate::models::tutor::TutorRow;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

pub fn tutor(system_prompt: Option<&str>) -> TutorRow {
    TutorRow {
        id: 1,
        course_id: None,
        name: "Python for beginners".to_string(),
        description: None,
        avatar_url: None,
        model_id: "tutor_python_v1".to_string(),
        system_prompt: system_prompt.map(str::to_string),
        knowledge_base_id: None,
        rating: 0.0,
        total_feedbacks: 0,
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn message(id: i64, role: MessageRole, content: &str) -> MessageRow {
    MessageRow {
        id,
        chat_id: 1,
        role,
        content: content.to_string(),
        attachments: None,
        metadata: None,
        created_at: Utc::now(),
    }
}

pub fn settings() -> TurnSettings {
    TurnSettings {
        window: 10,
        sampling: SamplingParams {
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 0.95,
        },
        default_model: "qwen2.5-7b-instruct".to_string(),
    }
}

/// What a scripted backend does on its next call.
pub enum Script {
    Reply(String),
    Fail(InferenceError),
}

/// Completion backend that plays back scripted results and records every prompt.
/// Once the script runs out it answers "ok".
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<(String, Vec<PromptMessage>)>>,
    delay: Option<Duration>,
    unhealthy: bool,
}

impl ScriptedBackend {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            script: Mutex::new(
                replies
                    .iter()
                    .map(|r| Script::Reply(r.to_string()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn failing(error: InferenceError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Script::Fail(error)])),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn models(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        model: &str,
        prompt: &[PromptMessage],
        _params: &SamplingParams,
    ) -> Result<String, InferenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_vec()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Reply(text)) => Ok(text),
            Some(Script::Fail(error)) => Err(error),
            None => Ok("ok".to_string()),
        }
    }

    async fn health(&self) -> bool {
        !self.unhealthy
    }
}

/// App state over the in-memory store. The pool is lazy and never connects;
/// only the inline-SQL routes (tutor list, progress) would touch it.
pub fn app_state(store: Arc<MemoryStore>, backend: Arc<ScriptedBackend>) -> AppState {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/tutor_test".to_string()),
        _ => None,
    })
    .unwrap();
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    AppState::new(db, store.clone(), store, backend, config)
}
