//! Page shells: the signed-in layout with site navigation, and the
//! signed-out shell used by the sign-in flow.

use leptos::prelude::*;

pub const SITE_TITLE: &str = "8-Bit Club";

/// The signed-in user shown in the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub login_id: String,
}

fn document_title(title: &str) -> String {
    if title == SITE_TITLE { title.to_owned() } else { format!("{title} | {SITE_TITLE}") }
}

/// Signed-in page: header with nav, identity and sign-out, then `children`.
#[component]
pub fn Layout(#[prop(into)] title: String, children: Children) -> impl IntoView {
    let viewer = use_context::<Viewer>().unwrap_or_default();

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{document_title(&title)}</title>
                <link rel="stylesheet" href="/static/app.css"/>
            </head>
            <body>
                <header>
                    <a rel="home" href="/">{SITE_TITLE}</a>
                    <nav>
                        <a href="/games">"Games"</a>
                        <a href="/events">"Events"</a>
                        <a href="/locations">"Locations"</a>
                    </nav>
                    <div class="user">
                        <p>{format!("signed in as {}", viewer.login_id)}</p>
                        <form method="post" action="/auth/sign-out">
                            <button type="submit">"Sign out"</button>
                        </form>
                    </div>
                </header>
                <main>{children()}</main>
                <script src="/static/live.js" defer="defer"></script>
            </body>
        </html>
    }
}

/// Signed-out shell for the sign-in flow.
#[component]
pub fn AuthShell(children: Children) -> impl IntoView {
    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{document_title("Sign in")}</title>
                <link rel="stylesheet" href="/static/app.css"/>
            </head>
            <body class="auth">
                <main>
                    <h1>{SITE_TITLE}</h1>
                    {children()}
                </main>
            </body>
        </html>
    }
}

#[component]
pub fn ErrorBanner(error: Option<String>) -> impl IntoView {
    error.map(|message| view! { <p class="error">{message}</p> })
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
