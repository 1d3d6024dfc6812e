use gloo_timers::callback::Timeout;
use yew::prelude::*;

const SESSION_KEY: &str = "hasVisitedLandingPage";
const HOLD_MS: u32 = 1_200;

/// First visit this session claims the gate; later mounts see it taken.
/// Session storage, not the durable timer storage: the gate resets when
/// the browser closes.
fn claim_first_visit() -> bool {
    let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());
    let Some(storage) = storage else {
        return false;
    };
    if storage.get_item(SESSION_KEY).ok().flatten().is_some() {
        return false;
    }
    let _ = storage.set_item(SESSION_KEY, "true");
    true
}

#[function_component(LoadingScreen)]
pub fn loading_screen() -> Html {
    let visible = use_state(claim_first_visit);

    {
        let visible = visible.clone();
        use_effect_with_deps(
            move |_| {
                if *visible {
                    Timeout::new(HOLD_MS, move || visible.set(false)).forget();
                }
                || ()
            },
            (),
        );
    }

    if !*visible {
        return html! {};
    }

    html! {
        <div class="loading-screen">
            <p class="loading-text">{"unlimited "}<span class="accent-word">{"you"}</span></p>
        </div>
    }
}
