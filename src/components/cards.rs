//! List cards. The same markup is rendered into pages and pushed over the
//! websocket on every snapshot.

use leptos::prelude::*;
use uuid::Uuid;

use crate::views::list::{GameItem, LocationItem};

/// No-script delete; `live.js` intercepts the submit and sends `view:delete`.
#[component]
pub fn DeleteButton(base: &'static str, id: Uuid) -> impl IntoView {
    view! {
        <form method="post" action=format!("{base}/{id}/delete") data-live-delete=id.to_string()>
            <button type="submit">"delete"</button>
        </form>
    }
}

#[component]
pub fn GameCard(item: GameItem) -> impl IntoView {
    let where_to_play = format!("Where to play: {}", item.location_names().join(", "));
    view! {
        <div class="item" data-id=item.id.to_string()>
            <h2>{item.name}</h2>
            <p>{item.description}</p>
            <p>{where_to_play}</p>
            <DeleteButton base="/games" id=item.id/>
        </div>
    }
}

#[component]
pub fn LocationCard(item: LocationItem) -> impl IntoView {
    let games = format!("Games: {}", item.game_names().join(", "));
    view! {
        <div class="item" data-id=item.id.to_string()>
            <h2>{item.name}</h2>
            <p>{games}</p>
            <DeleteButton base="/locations" id=item.id/>
        </div>
    }
}
