//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the signed-in pages, the sign-in flow, the data
//! API (websocket) and file storage. Page paths resolve the session and load
//! data here; the Leptos router inside `app::App` then picks the component.
//! The two static assets are compiled in.

pub mod auth;
pub mod pages;
pub mod storage;
pub mod ws;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const LIVE_JS: &str = include_str!("../../static/live.js");
const APP_CSS: &str = include_str!("../../static/app.css");

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::static_page))
        .route("/games", get(pages::games_list))
        .route("/games/{id}/delete", post(pages::game_delete))
        .route("/game-create", get(pages::game_create_form).post(pages::game_create))
        .route("/locations", get(pages::locations_list))
        .route("/locations/{id}/delete", post(pages::location_delete))
        .route("/location/create", get(pages::location_create_form).post(pages::location_create))
        .route("/events", get(pages::static_page))
        .route("/event/create", get(pages::static_page))
        .route("/auth/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/me", get(auth::me))
        .route("/api/ws", get(ws::handle_ws))
        .route(
            "/api/storage/{*key}",
            get(storage::get_object)
                .put(storage::put_object)
                .delete(storage::delete_object),
        )
        .route("/static/live.js", get(live_js))
        .route("/static/app.css", get(app_css))
        .route("/healthz", get(healthz))
        .fallback(pages::not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn live_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], LIVE_JS)
}

async fn app_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], APP_CSS)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
