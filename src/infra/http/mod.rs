//! HTTP surface: router, handlers, error envelope, middleware.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
};

use middleware::{log_responses, set_request_context};

/// Build the public router. Static segments (`/api/news/ticker`,
/// `/api/admin/contacts/stats`) take precedence over the id captures that
/// share their prefix.
pub fn build_router(state: ApiState, upload_body_limit: usize) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/stream", get(handlers::stream))
        .route(
            "/api/sharing-rates",
            get(handlers::list_rates).post(handlers::create_rate),
        )
        .route(
            "/api/sharing-rates/{id}",
            put(handlers::update_rate).delete(handlers::delete_rate),
        )
        .route(
            "/api/chairmen",
            get(handlers::list_chairmen).post(handlers::create_chairman),
        )
        .route(
            "/api/chairmen/{id}",
            put(handlers::update_chairman).delete(handlers::delete_chairman),
        )
        .route(
            "/api/news",
            get(handlers::list_news).post(handlers::create_news),
        )
        .route(
            "/api/news/ticker",
            get(handlers::list_ticker).post(handlers::create_ticker_message),
        )
        .route(
            "/api/news/ticker/{id}",
            put(handlers::update_ticker_message).delete(handlers::delete_ticker_message),
        )
        .route(
            "/api/news/{id}",
            get(handlers::get_news)
                .put(handlers::update_news)
                .delete(handlers::delete_news),
        )
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/contact/submit", post(handlers::submit_contact))
        .route("/api/admin/contacts", get(handlers::list_contacts))
        .route("/api/admin/contacts/stats", get(handlers::contact_stats))
        .route(
            "/api/admin/contacts/{id}",
            get(handlers::get_contact).delete(handlers::delete_contact),
        )
        .route(
            "/api/admin/contacts/{id}/replied",
            put(handlers::set_contact_replied),
        )
        .route("/uploads/{*path}", get(handlers::serve_upload))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}
