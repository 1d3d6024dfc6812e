use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::newsletter::NewsletterForm;
use crate::Route;

#[function_component(Home)]
pub fn home() -> Html {
    // Scroll to top only on initial mount
    {
        use_effect_with_deps(
            move |_| {
                if let Some(window) = web_sys::window() {
                    window.scroll_to_with_x_and_y(0.0, 0.0);
                }
                || ()
            },
            (),
        );
    }

    html! {
        <div class="landing-page">
            <section class="hero">
                <h1>{"unlimited heights"}</h1>
                <p class="hero-sub">{"unlimited transformation. unlimited you."}</p>
                <Link<Route> to={Route::LearnMore} classes="hero-cta">
                    {"Learn more"}
                </Link<Route>>
            </section>

            <footer class="site-footer">
                <h4>{"Stay in the loop"}</h4>
                <NewsletterForm />
            </footer>
        </div>
    }
}
