//! Email access-code sign-in.
//!
//! `POST /auth/sign-in` issues a six-character code for an email address and
//! stores only its SHA-256 hash. `POST /auth/verify` checks the newest live
//! code for that address. A code is single-use, expires after ten minutes
//! (column default) and is burned after five wrong guesses.

use leptos::prelude::*;
use rand::Rng;
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::app::render_detached;
use crate::components::access_code_email::AccessCodeEmail;
use crate::config::ResendConfig;
use crate::services::session::bytes_to_hex;

const CODE_LEN: usize = 6;
/// No 0/O or 1/I, so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_FAILED_ATTEMPTS: i32 = 5;
const EMAIL_SUBJECT: &str = "Your 8-Bit Club sign-in code";

#[derive(Debug, thiserror::Error)]
pub enum EmailAuthError {
    #[error("enter a valid email address")]
    InvalidEmail,
    #[error("codes are six letters or digits")]
    InvalidCode,
    #[error("expired or incorrect code")]
    VerificationFailed,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("email delivery failed: {0}")]
    EmailDelivery(String),
}

impl EmailAuthError {
    /// True when the message is safe and useful to show on the form.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::InvalidEmail | Self::InvalidCode | Self::VerificationFailed)
    }
}

/// Trim and lowercase; exactly one `@` with text on both sides.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Trim and uppercase; must be `CODE_LEN` characters from the alphabet.
#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    let valid = normalized.len() == CODE_LEN && normalized.bytes().all(|b| CODE_ALPHABET.contains(&b));
    valid.then_some(normalized)
}

#[must_use]
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[must_use]
pub fn hash_access_code(code: &str) -> String {
    bytes_to_hex(&Sha256::digest(code.as_bytes()))
}

/// Issue a fresh code for `email`, replacing any unused one. Returns the
/// plaintext code for delivery.
pub async fn request_access_code(pool: &PgPool, email: &str) -> Result<String, EmailAuthError> {
    let email = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;

    sqlx::query("INSERT INTO users (email) VALUES ($1) ON CONFLICT (email) DO NOTHING")
        .bind(&email)
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM email_login_codes WHERE email = $1 AND consumed_at IS NULL")
        .bind(&email)
        .execute(pool)
        .await?;

    let code = generate_access_code();
    sqlx::query("INSERT INTO email_login_codes (email, code_hash) VALUES ($1, $2)")
        .bind(&email)
        .bind(hash_access_code(&code))
        .execute(pool)
        .await?;

    tracing::info!(%email, "auth: access code issued");
    Ok(code)
}

/// Check `code` against the newest live code for `email` and return the
/// user id on success.
pub async fn verify_access_code(pool: &PgPool, email: &str, code: &str) -> Result<Uuid, EmailAuthError> {
    let email = normalize_email(email).ok_or(EmailAuthError::InvalidEmail)?;
    let code = normalize_code(code).ok_or(EmailAuthError::InvalidCode)?;

    let active = sqlx::query(
        r"SELECT id, code_hash
          FROM email_login_codes
          WHERE email = $1 AND consumed_at IS NULL AND expires_at > now()
          ORDER BY created_at DESC
          LIMIT 1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let Some(active) = active else {
        return Err(EmailAuthError::VerificationFailed);
    };
    let code_id: Uuid = active.get("id");
    let stored_hash: String = active.get("code_hash");

    if stored_hash != hash_access_code(&code) {
        sqlx::query(
            r"UPDATE email_login_codes
              SET attempts = attempts + 1,
                  consumed_at = CASE WHEN attempts + 1 >= $2 THEN now() ELSE consumed_at END
              WHERE id = $1",
        )
        .bind(code_id)
        .bind(MAX_FAILED_ATTEMPTS)
        .execute(pool)
        .await?;
        tracing::warn!(%email, "auth: wrong access code");
        return Err(EmailAuthError::VerificationFailed);
    }

    // Guarded on consumed_at so two concurrent verifies cannot both win.
    let consumed = sqlx::query("UPDATE email_login_codes SET consumed_at = now() WHERE id = $1 AND consumed_at IS NULL")
        .bind(code_id)
        .execute(pool)
        .await?;
    if consumed.rows_affected() == 0 {
        return Err(EmailAuthError::VerificationFailed);
    }

    let user_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    user_id.ok_or(EmailAuthError::VerificationFailed)
}

/// Mail the code through Resend.
pub async fn send_access_code_email(resend: &ResendConfig, to_email: &str, code: &str) -> Result<(), EmailAuthError> {
    let client = Resend::new(&resend.api_key);
    let html = render_access_code_email(to_email, code);
    let message = CreateEmailBaseOptions::new(&resend.from, [to_email], EMAIL_SUBJECT).with_html(&html);

    client
        .emails
        .send(message)
        .await
        .map_err(|e| EmailAuthError::EmailDelivery(e.to_string()))?;
    Ok(())
}

#[must_use]
pub fn render_access_code_email(email: &str, code: &str) -> String {
    let (email, code) = (email.to_owned(), code.to_owned());
    render_detached(move || view! { <AccessCodeEmail email=email code=code/> })
}

#[cfg(test)]
#[path = "email_auth_test.rs"]
mod tests;
