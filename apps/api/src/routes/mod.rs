pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::chats::handlers as chats;
use crate::conversation::handlers as conversation;
use crate::feedback::handlers as feedback;
use crate::history::handlers as history;
use crate::progress::handlers as progress;
use crate::state::AppState;
use crate::tutors::handlers as tutors;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tutors
        .route("/api/tutors", get(tutors::handle_list_tutors))
        .route("/api/tutors/:id", get(tutors::handle_get_tutor))
        // Chats
        .route(
            "/api/chats",
            post(chats::handle_create_chat).get(chats::handle_list_chats),
        )
        .route(
            "/api/chats/:id",
            get(chats::handle_get_chat)
                .patch(chats::handle_rename_chat)
                .delete(chats::handle_delete_chat),
        )
        // Messages
        .route(
            "/api/chats/:id/messages",
            get(history::handle_list_messages)
                .post(conversation::handle_send_message)
                .delete(history::handle_clear_messages),
        )
        // Feedback
        .route("/api/feedbacks", post(feedback::handle_detailed_feedback))
        .route("/api/feedbacks/quick", post(feedback::handle_quick_feedback))
        .route(
            "/api/feedbacks/unprocessed",
            get(feedback::handle_unprocessed_feedback),
        )
        .route(
            "/api/feedbacks/:id/mark-processed",
            patch(feedback::handle_mark_processed),
        )
        // Progress
        .route(
            "/api/progress/:tutor_id",
            get(progress::handle_get_progress).patch(progress::handle_update_progress),
        )
        .with_state(state)
}
