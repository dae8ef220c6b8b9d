//! Access-code sign-in: the email form, then the code form.

use leptos::prelude::*;

use crate::components::layout::{AuthShell, ErrorBanner};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignInStep {
    #[default]
    Email,
    /// A code was issued for `email`. `dev_code` is only set when the server
    /// echoes codes for local development.
    Code { email: String, dev_code: Option<String> },
}

/// Context for the sign-in page.
#[derive(Debug, Clone, Default)]
pub struct SignInData {
    pub step: SignInStep,
    pub error: Option<String>,
}

#[component]
pub fn SignInPage() -> impl IntoView {
    let data = use_context::<SignInData>().unwrap_or_default();
    let error = data.error;

    let body = match data.step {
        SignInStep::Email => view! {
            <form method="POST" action="/auth/sign-in">
                <h2>"Sign in"</h2>
                <ErrorBanner error=error/>
                <label>"Email" <input type="email" name="email" autocomplete="email" required="required"/></label>
                <button type="submit">"Send code"</button>
            </form>
        }
        .into_any(),
        SignInStep::Code { email, dev_code } => {
            let sent_to = format!("We sent a sign-in code to {email}.");
            let dev = dev_code.map(|code| {
                view! {
                    <p class="dev-code">"Development code: " <code>{code}</code></p>
                }
            });
            view! {
                <form method="POST" action="/auth/verify">
                    <h2>"Enter your code"</h2>
                    <p>{sent_to}</p>
                    {dev}
                    <ErrorBanner error=error/>
                    <input type="hidden" name="email" value=email/>
                    <label>"Code" <input type="text" name="code" autocomplete="one-time-code" required="required"/></label>
                    <button type="submit">"Sign in"</button>
                </form>
                <p>
                    <a href="/auth/sign-in">"Use a different email"</a>
                </p>
            }
            .into_any()
        }
    };

    view! { <AuthShell>{body}</AuthShell> }
}
