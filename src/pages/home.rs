use leptos::prelude::*;

use crate::components::layout::{Layout, SITE_TITLE};

const INTRO: &str = "Find local events where you can play your favorite classic arcade games with friends. \
    See where your favorite games are around town, and set up times to play with your friends (coming soon!).";

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <Layout title=SITE_TITLE>
            <h1>{SITE_TITLE}</h1>
            <p>
                {INTRO}
            </p>
            <p>
                <a href="/games">"Browse games →"</a>
            </p>
        </Layout>
    }
}
