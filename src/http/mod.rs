//! JSON surface over the engine.

mod dto;
mod error;
mod hotels;
mod reservations;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::engine::Engine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// Build the application router.
///
/// - `GET /health`
/// - `GET /hotels` search
/// - `GET /hotels/:id` detail
/// - `GET /hotels/:id/availability`
/// - `GET /hotels/:id/reservations`
/// - `POST /reservations`
/// - `GET|DELETE /reservations/:id`
/// - `PATCH /reservations/:id/status`
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/hotels", get(hotels::search))
        .route("/hotels/:id", get(hotels::detail))
        .route("/hotels/:id/availability", get(hotels::availability))
        .route("/hotels/:id/reservations", get(reservations::list_for_hotel))
        .route("/reservations", post(reservations::create))
        .route(
            "/reservations/:id",
            get(reservations::get_one).delete(reservations::remove),
        )
        .route("/reservations/:id/status", patch(reservations::set_status))
        .route_layer(middleware::from_fn(count_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "hotels": state.engine.hotel_count() }))
}

async fn count_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let method = req.method().to_string();
    let response = next.run(req).await;
    metrics::counter!(
        crate::observability::HTTP_REQUESTS_TOTAL,
        "method" => method,
        "route" => route,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}
