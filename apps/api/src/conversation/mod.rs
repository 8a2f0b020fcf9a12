// Conversation pipeline: context building, the inference round trip and the
// persistence of both sides of a turn. All inference calls go through
// inference_client, never directly over HTTP from here.

pub mod context;
pub mod handlers;
pub mod locks;
pub mod orchestrator;
pub mod prompts;
