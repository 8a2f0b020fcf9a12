//! Turns a tutor profile, a slice of chat history and the new
//! user message into the ordered prompt sent to the inference backend.
//!
//! Shape: `[system, (retrieved-context system)?, history.., user]`.
//! Entries are never reordered; only the oldest history is dropped.

use crate::conversation::prompts::{DEFAULT_TUTOR_INSTRUCTION, RETRIEVED_CONTEXT_TEMPLATE};
use crate::inference_client::{PromptMessage, PromptRole};
use crate::models::chat::{MessageRole, MessageRow};
use crate::models::tutor::TutorRow;

/// Prior messages included in a prompt unless configured otherwise.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;
/// Largest window accepted from configuration.
pub const MAX_CONTEXT_WINDOW: usize = 100;

/// Builds the prompt for one turn.
///
/// `history` must be in chronological order and must not contain `user_message`.
pub fn build_prompt(
    tutor: &TutorRow,
    history: &[MessageRow],
    user_message: &str,
    window: usize,
    retrieved_context: Option<&str>,
) -> Vec<PromptMessage> {
    let recent = &history[history.len().saturating_sub(window)..];

    let mut prompt = Vec::with_capacity(recent.len() + 3);
    prompt.push(PromptMessage::system(system_instruction(tutor)));

    if let Some(context) = retrieved_context.filter(|c| !c.trim().is_empty()) {
        prompt.push(PromptMessage::system(
            RETRIEVED_CONTEXT_TEMPLATE.replace("{retrieved_context}", context),
        ));
    }

    prompt.extend(recent.iter().map(|message| PromptMessage {
        role: match message.role {
            MessageRole::User => PromptRole::User,
            MessageRole::Assistant => PromptRole::Assistant,
        },
        content: message.content.clone(),
    }));

    prompt.push(PromptMessage::user(user_message));
    prompt
}

/// The tutor's own instruction, or a default one naming its subject.
pub fn system_instruction(tutor: &TutorRow) -> String {
    match tutor.system_prompt.as_deref().map(str::trim) {
        Some(instruction) if !instruction.is_empty() => instruction.to_string(),
        _ => DEFAULT_TUTOR_INSTRUCTION.replace("{tutor_name}", &tutor.name),
    }
}

/// Knowledge-base lookup for the tutor. Retrieval is not wired up yet, so there
/// is never anything to add.
pub fn retrieve_context(_tutor: &TutorRow, _query: &str) -> Option<String> {
    None
}
