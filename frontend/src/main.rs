use yew::prelude::*;
use yew_router::prelude::*;
use log::{info, Level};

mod config;
mod components {
    pub mod loading_screen;
    pub mod newsletter;
}
mod pages {
    pub mod home;
    pub mod learnmore;
}
mod popup {
    pub mod component;
    pub mod engagement;
    pub mod scroll_lock;
    pub mod storage;
}

use components::loading_screen::LoadingScreen;
use pages::{home::Home, learnmore::LearnMore};
use popup::component::TimerPopup;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/learn-more")]
    LearnMore,
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => {
            info!("Rendering Home page");
            html! { <Home /> }
        }
        Route::LearnMore => {
            info!("Rendering Learn More page");
            html! { <LearnMore /> }
        }
    }
}

#[function_component(Nav)]
pub fn nav() -> Html {
    html! {
        <nav class="top-nav">
            <div class="nav-content">
                <Link<Route> to={Route::Home} classes="nav-logo">
                    {"unlimited"}
                </Link<Route>>
                <div class="nav-right">
                    <Link<Route> to={Route::LearnMore} classes="nav-link">
                        {"Learn More"}
                    </Link<Route>>
                </div>
            </div>
        </nav>
    }
}

#[function_component]
fn App() -> Html {
    html! {
        <BrowserRouter>
            <LoadingScreen />
            <Nav />
            <Switch<Route> render={switch} />
            <TimerPopup />
        </BrowserRouter>
    }
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(Level::Info).expect("error initializing log");

    info!("Starting application");
    yew::Renderer::<App>::new().render();
}
