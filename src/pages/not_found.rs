use leptos::prelude::*;

use crate::components::layout::{Layout, SITE_TITLE};

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <Layout title=SITE_TITLE>
            <h1>"No match"</h1>
        </Layout>
    }
}
