//! Page routes — resolve the session, load page data, render the app.
//!
//! DESIGN
//! ======
//! Every page is rendered by `leptos_axum` from `app::shell`; the router
//! picks the page from the request path. Handlers provide the viewer and
//! whatever the page reads (`ListData`, form state) as context first. Lists
//! are rendered from the current result set; `static/live.js` then
//! subscribes over the websocket and swaps in every later snapshot. Form
//! posts redirect on success (303) and re-render with the message on a
//! validation failure (400).

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use leptos::prelude::provide_context;
use uuid::Uuid;

use crate::app::shell;
use crate::components::layout::Viewer;
use crate::frame::ErrorCode;
use crate::model::ModelKind;
use crate::pages::ListData;
use crate::pages::games::GameFormData;
use crate::pages::locations::LocationFormData;
use crate::routes::auth::PageUser;
use crate::services::store::StoreError;
use crate::state::AppState;
use crate::views::create::{self, FormError, GameFormInput, LocationFormInput};
use crate::views::list::{GameItem, ListItem, ListView, LocationItem};

/// Render the app for `uri` with `context` provided, answering `status`.
pub(crate) async fn render_page<C>(uri: Uri, status: StatusCode, context: C) -> Response
where
    C: Fn() + Clone + Send + Sync + 'static,
{
    let mut req = Request::new(Body::empty());
    *req.uri_mut() = uri;

    let handler = leptos_axum::render_app_async_with_context(context, shell);
    let mut response = handler(req).await.into_response();
    *response.status_mut() = status;
    response
}

/// Context for a signed-in page: the viewer plus the page's own data.
fn signed_in<D>(user: &PageUser, data: D) -> impl Fn() + Clone + Send + Sync + 'static
where
    D: Clone + Send + Sync + 'static,
{
    let viewer = Viewer { login_id: user.login_id().to_owned() };
    move || {
        provide_context(viewer.clone());
        provide_context(data.clone());
    }
}

pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Database(_) | StoreError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn form_error_to_status(err: &FormError) -> StatusCode {
    match err {
        FormError::MissingFields(_) | FormError::InvalidGameId(_) => StatusCode::BAD_REQUEST,
        FormError::Store(e) => store_error_to_status(e),
        FormError::InvalidLocation | FormError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// STATIC PAGES
// =============================================================================

/// `/`, `/events` and `/event/create`: nothing to load.
pub async fn static_page(user: PageUser, uri: Uri) -> Response {
    render_page(uri, StatusCode::OK, signed_in(&user, ())).await
}

/// Fallback for every unmatched path.
pub async fn not_found(user: PageUser, uri: Uri) -> Response {
    render_page(uri, StatusCode::NOT_FOUND, signed_in(&user, ())).await
}

// =============================================================================
// LISTS
// =============================================================================

async fn list_page<T: ListItem>(state: &AppState, user: &PageUser, uri: Uri) -> Response {
    match ListView::<T>::load(&state.data).await {
        Ok(view) => render_page(uri, StatusCode::OK, signed_in(user, ListData::loaded(view.into_items()))).await,
        Err(e) => {
            let kind = T::KIND;
            tracing::error!(model = %kind, code = e.error_code(), error = %e, "view load failed");
            render_page(uri, StatusCode::INTERNAL_SERVER_ERROR, signed_in(user, ListData::<T>::failed())).await
        }
    }
}

pub async fn games_list(State(state): State<AppState>, user: PageUser, uri: Uri) -> Response {
    list_page::<GameItem>(&state, &user, uri).await
}

pub async fn locations_list(State(state): State<AppState>, user: PageUser, uri: Uri) -> Response {
    list_page::<LocationItem>(&state, &user, uri).await
}

// =============================================================================
// GAMES
// =============================================================================

pub async fn game_create_form(user: PageUser, uri: Uri) -> Response {
    render_page(uri, StatusCode::OK, signed_in(&user, GameFormData::default())).await
}

pub async fn game_create(
    State(state): State<AppState>,
    user: PageUser,
    uri: Uri,
    Form(input): Form<GameFormInput>,
) -> Response {
    match create::submit_game(&state.data, input).await {
        Ok(_) => Redirect::to("/games").into_response(),
        Err(e) => {
            let status = form_error_to_status(&e);
            if status.is_server_error() {
                tracing::error!(code = e.error_code(), error = %e, "game create failed");
            }
            render_page(uri, status, signed_in(&user, GameFormData { error: Some(e.to_string()) })).await
        }
    }
}

pub async fn game_delete(State(state): State<AppState>, _user: PageUser, Path(id): Path<Uuid>) -> Response {
    delete_and_redirect(&state, ModelKind::Game, id, "/games").await
}

// =============================================================================
// LOCATIONS
// =============================================================================

async fn location_form_page(state: &AppState, user: &PageUser, uri: Uri, status: StatusCode, error: Option<String>) -> Response {
    match create::load_game_options(&state.data).await {
        Ok(games) => render_page(uri, status, signed_in(user, LocationFormData { games, error, games_failed: false })).await,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "game options load failed");
            let form = LocationFormData { games: Vec::new(), error, games_failed: true };
            render_page(uri, StatusCode::INTERNAL_SERVER_ERROR, signed_in(user, form)).await
        }
    }
}

pub async fn location_create_form(State(state): State<AppState>, user: PageUser, uri: Uri) -> Response {
    location_form_page(&state, &user, uri, StatusCode::OK, None).await
}

/// Join creates keep running after the redirect.
pub async fn location_create(
    State(state): State<AppState>,
    user: PageUser,
    uri: Uri,
    Form(input): Form<LocationFormInput>,
) -> Response {
    match create::submit_location(&state.data, input).await {
        Ok(_created) => Redirect::to("/locations").into_response(),
        Err(e) => {
            let status = form_error_to_status(&e);
            if status.is_server_error() {
                tracing::error!(code = e.error_code(), error = %e, "location create failed");
            }
            location_form_page(&state, &user, uri, status, Some(e.to_string())).await
        }
    }
}

pub async fn location_delete(State(state): State<AppState>, _user: PageUser, Path(id): Path<Uuid>) -> Response {
    delete_and_redirect(&state, ModelKind::Location, id, "/locations").await
}

/// No-script fallback for the delete buttons; `live.js` sends `view:delete`
/// instead.
async fn delete_and_redirect(state: &AppState, kind: ModelKind, id: Uuid, back_to: &str) -> Response {
    match state.data.delete(kind, id).await {
        Ok(()) => Redirect::to(back_to).into_response(),
        Err(e) => {
            tracing::warn!(%kind, %id, error = %e, "delete failed");
            store_error_to_status(&e).into_response()
        }
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
