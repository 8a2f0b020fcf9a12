// Conversation prompt templates.

/// Instruction used when a tutor has no system prompt of its own.
pub const DEFAULT_TUTOR_INSTRUCTION: &str = "\
You are a tutor for the course \"{tutor_name}\". \
Help the user learn by explaining simply and clearly. \
Always give code examples or formulas. \
If the student is struggling, ask a guiding question instead of giving the finished answer.";

/// Wraps retrieved knowledge-base text in its own system entry.
pub const RETRIEVED_CONTEXT_TEMPLATE: &str = "\
Relevant information from the knowledge base:

{retrieved_context}";
