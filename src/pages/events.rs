//! Event pages are placeholders until events have a data model.

use leptos::prelude::*;

use crate::components::layout::Layout;

#[component]
pub fn EventsPage() -> impl IntoView {
    view! {
        <Layout title="Events">
            <h1>"TODO: List Events"</h1>
        </Layout>
    }
}

#[component]
pub fn EventCreatePage() -> impl IntoView {
    view! {
        <Layout title="Create Event">
            <h1>"TODO: Create Events"</h1>
        </Layout>
    }
}
