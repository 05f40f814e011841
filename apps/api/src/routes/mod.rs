pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::events::handlers as events;
use crate::messages::handlers as messages;
use crate::profiles::handlers as profiles;
use crate::rsvp::handlers as rsvp;
use crate::search::handlers as search;
use crate::state::AppState;
use crate::tags;

/// Headroom on top of the resume size cap for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let resume_limit = state.config.resume_max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/me", get(auth::handle_me))
        // Profiles
        .route(
            "/api/profile/student",
            get(profiles::handle_get_own_student).put(profiles::handle_update_student),
        )
        .route(
            "/api/profile/student/resume",
            post(profiles::handle_upload_resume).layer(DefaultBodyLimit::max(resume_limit)),
        )
        .route("/api/profile/student/:id", get(profiles::handle_get_student))
        .route(
            "/api/profile/employer",
            get(profiles::handle_get_own_employer).put(profiles::handle_update_employer),
        )
        .route(
            "/api/profile/employer/:id",
            get(profiles::handle_get_employer),
        )
        // Events; static segments win over `:id`
        .route(
            "/api/events",
            get(events::handle_list_events).post(events::handle_create_event),
        )
        .route("/api/events/browse", get(events::handle_browse_events))
        .route("/api/events/rsvp", get(rsvp::handle_my_rsvps))
        .route("/api/events/rsvp-status", get(rsvp::handle_rsvp_status))
        .route(
            "/api/events/:id",
            get(events::handle_get_event)
                .put(events::handle_update_event)
                .delete(events::handle_delete_event),
        )
        .route(
            "/api/events/:id/rsvp",
            post(rsvp::handle_rsvp).delete(rsvp::handle_cancel_rsvp),
        )
        .route("/api/events/:id/applicants", get(rsvp::handle_applicants))
        .route("/api/my-rsvps", get(rsvp::handle_my_rsvps))
        // Messages
        .route(
            "/api/messages",
            get(messages::handle_sent).post(messages::handle_send),
        )
        .route(
            "/api/messages/conversations",
            get(messages::handle_conversations),
        )
        .route(
            "/api/messages/conversation/:id",
            get(messages::handle_thread),
        )
        .route(
            "/api/messages/conversation/:id/reply",
            post(messages::handle_reply),
        )
        .route(
            "/api/messages/unread-count",
            get(messages::handle_unread_count),
        )
        // Search
        .route("/api/search", get(search::handle_search))
        .route("/api/search/autocomplete", get(search::handle_autocomplete))
        // Tags
        .route("/api/tags/skills", get(tags::handle_skills))
        .route("/api/tags/preferences", get(tags::handle_preferences))
        .route("/api/tags/event-types", get(tags::handle_event_types))
        .with_state(state)
}
