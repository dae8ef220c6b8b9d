//! Root application component with routing.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages are rendered on the server only. `routes::pages` resolves the
//! session and loads page data, then renders `shell` through `leptos_axum`
//! with that data in context. The router picks the page from the request
//! path.

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use crate::pages::events::{EventCreatePage, EventsPage};
use crate::pages::games::{GameCreatePage, GamesPage};
use crate::pages::home::HomePage;
use crate::pages::locations::{LocationCreatePage, LocationsPage};
use crate::pages::not_found::NotFoundPage;
use crate::pages::sign_in::SignInPage;

/// HTML document rendered for every page request.
pub fn shell() -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <App/>
    }
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <Routes fallback=|| view! { <NotFoundPage/> }>
                <Route path=path!("/") view=HomePage/>
                <Route path=path!("/games") view=GamesPage/>
                <Route path=path!("/game-create") view=GameCreatePage/>
                <Route path=path!("/locations") view=LocationsPage/>
                <Route path=path!("/location/create") view=LocationCreatePage/>
                <Route path=path!("/events") view=EventsPage/>
                <Route path=path!("/event/create") view=EventCreatePage/>
                <Route path=path!("/auth/sign-in") view=SignInPage/>
                <Route path=path!("/auth/verify") view=SignInPage/>
                <Route path=path!("/*any") view=NotFoundPage/>
            </Routes>
        </Router>
    }
}

/// Render a view outside any request, for websocket pushes and email bodies.
pub fn render_detached<F, V>(view_fn: F) -> String
where
    F: FnOnce() -> V,
    V: IntoView + 'static,
{
    Owner::new().with(|| view_fn().to_html())
}
