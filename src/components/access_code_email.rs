//! Sign-in email body.

use leptos::prelude::*;

use crate::components::layout::SITE_TITLE;

#[component]
pub fn AccessCodeEmail(email: String, code: String) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <body style="font-family: monospace; background: #111; color: #eee; padding: 24px;">
                <h1 style="color: #ffeb3b;">{SITE_TITLE}</h1>
                <p>{format!("Use this code to sign in as {email}:")}</p>
                <p style="font-size: 32px; letter-spacing: 8px;">
                    <strong>{code}</strong>
                </p>
                <p>"The code expires in 10 minutes. If you did not request it, ignore this email."</p>
            </body>
        </html>
    }
}
