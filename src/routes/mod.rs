mod auth;
mod devices;
mod history;
mod import;
mod permissions;
mod system;
mod users;

use crate::extractors::REQUEST_SEQ_HEADER;
use crate::middlewares::trace_id::{REQUEST_ID_HEADER, TraceId, TraceIdLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::time::Duration;
use tracing::Span;

pub fn build() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/version", get(system::version))
        // ======== auth ========
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // ======== users ========
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/import", post(users::import))
        .route("/api/users/import/template", get(users::import_template_csv))
        .route(
            "/api/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        // ======== devices ========
        .route("/api/devices", get(devices::list).post(devices::create))
        .route("/api/devices/profiles", get(devices::profiles))
        .route("/api/devices/import", post(devices::import))
        .route(
            "/api/devices/import/template",
            get(devices::import_template_csv),
        )
        .route(
            "/api/devices/{id}",
            get(devices::get).put(devices::update).delete(devices::delete),
        )
        // ======== permissions ========
        .route(
            "/api/permissions",
            get(permissions::list).post(permissions::create),
        )
        .route(
            "/api/permissions/{id}",
            put(permissions::update).delete(permissions::delete),
        )
        // ======== history ========
        .route("/api/history/query", post(history::query))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| match request.extensions().get::<TraceId>() {
                    Some(trace_id) => tracing::debug_span!("request", trace_id = %trace_id),
                    None => tracing::debug_span!("request"),
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::debug!(
                        method = %req.method(),
                        uri = %req.uri(),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::debug!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(TraceIdLayer)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    HeaderName::from_static(REQUEST_SEQ_HEADER),
                ]),
        )
}
