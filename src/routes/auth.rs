//! Auth routes — access-code sign-in, session cookie, sign-out.

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use leptos::prelude::provide_context;
use serde::Deserialize;
use time::Duration;

use crate::pages::sign_in::{SignInData, SignInStep};
use crate::routes::pages::render_page;
use crate::services::{email_auth, session};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
pub(crate) const SIGN_IN_PATH: &str = "/auth/sign-in";
const VERIFY_PATH: &str = "/auth/verify";
const UNAVAILABLE: &str = "sign-in is unavailable, try again";

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Authenticated user extracted from the session cookie. API routes reject
/// with `401`.
pub struct AuthUser {
    pub user: session::SessionUser,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session validation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user })
    }
}

/// Page-route variant of [`AuthUser`]: signed-out visitors are sent to the
/// sign-in form instead of getting a bare `401`.
pub struct PageUser(pub AuthUser);

impl<S> FromRequestParts<S> for PageUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(auth) => Ok(Self(auth)),
            Err(StatusCode::UNAUTHORIZED) => Err(Redirect::to(SIGN_IN_PATH).into_response()),
            Err(status) => Err(status.into_response()),
        }
    }
}

impl PageUser {
    #[must_use]
    pub fn login_id(&self) -> &str {
        &self.0.user.login_id
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    code: String,
}

async fn auth_page(path: &'static str, status: StatusCode, data: SignInData) -> Response {
    render_page(Uri::from_static(path), status, move || provide_context(data.clone())).await
}

fn email_step(error: &str) -> SignInData {
    SignInData { step: SignInStep::Email, error: Some(error.to_owned()) }
}

/// `GET /auth/sign-in` — email form.
pub async fn sign_in_page() -> Response {
    auth_page(SIGN_IN_PATH, StatusCode::OK, SignInData::default()).await
}

/// `POST /auth/sign-in` — issue a code, deliver it, show the code form.
pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let code = match email_auth::request_access_code(&state.pool, &form.email).await {
        Ok(code) => code,
        Err(e) if e.is_user_facing() => {
            return auth_page(SIGN_IN_PATH, StatusCode::BAD_REQUEST, email_step(&e.to_string())).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "access code request failed");
            return auth_page(SIGN_IN_PATH, StatusCode::INTERNAL_SERVER_ERROR, email_step(UNAVAILABLE)).await;
        }
    };

    let email = email_auth::normalize_email(&form.email).unwrap_or(form.email);
    if let Some(resend) = &state.config.resend {
        if let Err(e) = email_auth::send_access_code_email(resend, &email, &code).await {
            tracing::error!(error = %e, %email, "access code email failed");
            return auth_page(SIGN_IN_PATH, StatusCode::BAD_GATEWAY, email_step("could not send the code, try again")).await;
        }
    } else if !state.config.dev_echo_code {
        tracing::warn!(%email, "no email delivery configured; access code not sent");
    }

    let dev_code = state.config.dev_echo_code.then_some(code);
    let data = SignInData { step: SignInStep::Code { email, dev_code }, error: None };
    auth_page(SIGN_IN_PATH, StatusCode::OK, data).await
}

/// `POST /auth/verify` — check the code, start a session, go home.
pub async fn verify(State(state): State<AppState>, jar: CookieJar, Form(form): Form<VerifyForm>) -> Response {
    let user_id = match email_auth::verify_access_code(&state.pool, &form.email, &form.code).await {
        Ok(id) => id,
        Err(e) if e.is_user_facing() => {
            let data = SignInData {
                step: SignInStep::Code { email: form.email, dev_code: None },
                error: Some(e.to_string()),
            };
            return auth_page(VERIFY_PATH, StatusCode::BAD_REQUEST, data).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "access code verification failed");
            return auth_page(SIGN_IN_PATH, StatusCode::INTERNAL_SERVER_ERROR, email_step(UNAVAILABLE)).await;
        }
    };

    let token = match session::create_session(&state.pool, user_id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(%user_id, "auth: signed in");
    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    (jar, Redirect::to("/")).into_response()
}

/// `POST /auth/sign-out` — drop the session if there is one, clear the
/// cookie, back to the sign-in form.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty()) {
        if let Err(e) = session::delete_session(&state.pool, token).await {
            tracing::warn!(error = %e, "session delete failed");
        }
    }

    let jar = jar.add(cleared_session_cookie(state.config.cookie_secure));
    (jar, Redirect::to(SIGN_IN_PATH)).into_response()
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
