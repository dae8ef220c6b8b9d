//! Games list and the create-game form.

use leptos::prelude::*;

use crate::components::cards::GameCard;
use crate::components::layout::{ErrorBanner, Layout};
use crate::pages::ListData;
use crate::views::list::GameItem;

/// Context for the create-game form.
#[derive(Debug, Clone, Default)]
pub struct GameFormData {
    pub error: Option<String>,
}

#[component]
pub fn GamesPage() -> impl IntoView {
    let data = use_context::<ListData<GameItem>>().unwrap_or_default();
    let failed = data.failed.then(|| view! { <p class="error">"Could not load this page. Try again."</p> });
    let cards = data.items.into_iter().map(|item| view! { <GameCard item=item/> }).collect::<Vec<_>>();

    view! {
        <Layout title="Games">
            <a href="/game-create">"Create New Game"</a>
            {failed}
            <div class="items" data-live-view="games">{cards}</div>
        </Layout>
    }
}

#[component]
pub fn GameCreatePage() -> impl IntoView {
    let form = use_context::<GameFormData>().unwrap_or_default();

    view! {
        <Layout title="Create Game">
            <form method="POST" action="/game-create">
                <h1>"Create Game"</h1>
                <ErrorBanner error=form.error/>
                <label>"Name" <input type="text" name="name" required="required"/></label>
                <label>"Description" <textarea name="description" required="required"></textarea></label>
                <button type="submit">"Create Game"</button>
            </form>
        </Layout>
    }
}
