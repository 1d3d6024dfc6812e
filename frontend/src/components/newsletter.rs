use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::config;
use crate::popup::engagement::looks_like_email;

#[derive(Serialize)]
struct SubscribeRequest {
    email: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Footer newsletter signup. Subscribing an already-known address is fine;
/// the server answers with its "already subscribed" message.
#[function_component(NewsletterForm)]
pub fn newsletter_form() -> Html {
    let email = use_state(String::new);
    let message = use_state(|| None::<(String, bool)>); // (text, is_error)
    let submitting = use_state(|| false);

    let onsubmit = {
        let email = email.clone();
        let message = message.clone();
        let submitting = submitting.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *submitting {
                return;
            }
            let value = email.trim().to_string();
            if !looks_like_email(&value) {
                message.set(Some(("Please enter a valid email address.".to_string(), true)));
                return;
            }

            submitting.set(true);
            message.set(None);
            let email = email.clone();
            let message = message.clone();
            let submitting = submitting.clone();

            spawn_local(async move {
                let result = Request::post(&format!(
                    "{}/api/newsletter/subscribe",
                    config::get_backend_url()
                ))
                .json(&SubscribeRequest { email: value })
                .unwrap()
                .send()
                .await;

                match result {
                    Ok(response) if response.ok() => {
                        match response.json::<MessageResponse>().await {
                            Ok(body) => {
                                email.set(String::new());
                                message.set(Some((body.message, false)));
                            }
                            Err(_) => {
                                email.set(String::new());
                                message.set(Some(("Thank you for subscribing!".to_string(), false)));
                            }
                        }
                    }
                    Ok(response) => match response.json::<ErrorResponse>().await {
                        Ok(body) => message.set(Some((body.error, true))),
                        Err(_) => message.set(Some((
                            "Subscription failed. Please try again.".to_string(),
                            true,
                        ))),
                    },
                    Err(_) => message.set(Some((
                        "Subscription failed. Please try again.".to_string(),
                        true,
                    ))),
                }

                // Brief cooldown before the button comes back
                TimeoutFuture::new(2_000).await;
                submitting.set(false);
            });
        })
    };

    html! {
        <form class="footer-newsletter" onsubmit={onsubmit}>
            <input
                type="email"
                placeholder="Your email address"
                value={(*email).clone()}
                oninput={let email = email.clone(); move |e: InputEvent| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    email.set(input.value());
                }}
            />
            <button type="submit" disabled={*submitting}>
                { if *submitting { "Submitting..." } else { "Subscribe" } }
            </button>
            {
                if let Some((text, is_error)) = (*message).as_ref() {
                    let class = if *is_error { "form-message form-message-error" } else { "form-message" };
                    html! { <p class={class}>{text}</p> }
                } else {
                    html! {}
                }
            }
        </form>
    }
}
