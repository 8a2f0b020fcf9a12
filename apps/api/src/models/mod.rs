pub mod chat;
pub mod feedback;
pub mod progress;
pub mod tutor;
