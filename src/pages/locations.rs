//! Locations list and the create-location form.

use leptos::prelude::*;

use crate::components::cards::LocationCard;
use crate::components::layout::{ErrorBanner, Layout};
use crate::pages::ListData;
use crate::views::create::GameOption;
use crate::views::list::LocationItem;

/// Context for the create-location form. `games` feeds the multi-select.
#[derive(Debug, Clone, Default)]
pub struct LocationFormData {
    pub games: Vec<GameOption>,
    pub error: Option<String>,
    pub games_failed: bool,
}

#[component]
pub fn LocationsPage() -> impl IntoView {
    let data = use_context::<ListData<LocationItem>>().unwrap_or_default();
    let failed = data.failed.then(|| view! { <p class="error">"Could not load this page. Try again."</p> });
    let cards = data.items.into_iter().map(|item| view! { <LocationCard item=item/> }).collect::<Vec<_>>();

    view! {
        <Layout title="Locations">
            <a href="/location/create">"Create New Location"</a>
            {failed}
            <div class="items" data-live-view="locations">{cards}</div>
        </Layout>
    }
}

#[component]
pub fn LocationCreatePage() -> impl IntoView {
    let form = use_context::<LocationFormData>().unwrap_or_default();
    let error = if form.games_failed { Some("Could not load games. Try again.".to_owned()) } else { form.error };
    let options = form
        .games
        .into_iter()
        .map(|game| view! { <option value=game.id.to_string()>{game.name}</option> })
        .collect::<Vec<_>>();

    view! {
        <Layout title="Create Location">
            <form method="POST" action="/location/create">
                <h1>"Create Location"</h1>
                <ErrorBanner error=error/>
                <label>"Name" <input type="text" name="name" required="required"/></label>
                <label>
                    "Games"
                    <select multiple="multiple" name="games" required="required">{options}</select>
                </label>
                <button type="submit">"Create Location"</button>
            </form>
        </Layout>
    }
}
