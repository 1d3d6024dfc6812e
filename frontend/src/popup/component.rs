use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use futures::future::{select, Either};
use futures::pin_mut;
use gloo_console::log;
use gloo_net::http::Request;
use gloo_timers::callback::{Interval, Timeout};
use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::config;
use crate::popup::engagement::{
    FormError, LeadSubmission, PopupController, PopupPhase, Wake, FAILURE_CLOSE_MS,
    POLL_INTERVAL_MS, SUBMIT_TIMEOUT_MS, SUCCESS_CLOSE_MS,
};
use crate::popup::scroll_lock::host_scroll_lock;
use crate::popup::storage::LocalStorageStore;

const GENERIC_FAILURE: &str = "Sorry, there was an error. Please try again later.";

fn now_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

#[derive(Serialize)]
struct SubmitLeadRequest {
    name: String,
    email: String,
    #[serde(rename = "flowType")]
    flow_type: &'static str,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

type SharedController = Rc<RefCell<PopupController<LocalStorageStore>>>;
type SharedInterval = Rc<RefCell<Option<Interval>>>;

fn spawn_poll(controller: &SharedController, phase: &UseStateHandle<PopupPhase>) -> Interval {
    let controller = controller.clone();
    let phase = phase.clone();
    Interval::new(POLL_INTERVAL_MS, move || {
        if controller.borrow_mut().tick(now_ms()) {
            phase.set(controller.borrow().phase().clone());
        }
    })
}

/// POST the lead, bounded by a fixed timeout. Ok carries the server's
/// message, Err the text to show in the failure panel.
async fn submit_lead(submission: LeadSubmission) -> Result<String, String> {
    let request = Request::post(&format!("{}/api/leads/submit", config::get_backend_url()))
        .json(&SubmitLeadRequest {
            name: submission.name,
            email: submission.email,
            flow_type: "download",
        })
        .unwrap()
        .send();
    let timeout = TimeoutFuture::new(SUBMIT_TIMEOUT_MS);
    pin_mut!(request);
    pin_mut!(timeout);

    match select(request, timeout).await {
        Either::Left((Ok(response), _)) => {
            if response.ok() {
                match response.json::<MessageResponse>().await {
                    Ok(body) => Ok(body.message),
                    Err(_) => Ok("Data successfully submitted!".to_string()),
                }
            } else {
                log!("submission rejected with status:", response.status());
                match response.json::<ErrorResponse>().await {
                    Ok(body) => Err(body.error),
                    Err(_) => Err(GENERIC_FAILURE.to_string()),
                }
            }
        }
        Either::Left((Err(e), _)) => {
            log!("submission request failed:", e.to_string());
            Err(GENERIC_FAILURE.to_string())
        }
        Either::Right(_) => {
            log!("submission timed out");
            Err(GENERIC_FAILURE.to_string())
        }
    }
}

#[function_component(TimerPopup)]
pub fn timer_popup() -> Html {
    let controller: SharedController =
        use_mut_ref(|| PopupController::new(LocalStorageStore, now_ms()));
    let interval: SharedInterval = use_mut_ref(|| None);
    let phase = use_state(|| PopupPhase::Hidden);
    let name_value = use_state(|| controller.borrow().captured_name().unwrap_or_default());
    let email_value = use_state(String::new);
    let field_error = use_state(|| None::<String>);

    // Page-load protocol plus the listeners that keep the timer honest
    // across tab switches and navigations.
    {
        let controller = controller.clone();
        let phase = phase.clone();
        let interval = interval.clone();
        use_effect_with_deps(
            move |_| {
                let wake = controller.borrow_mut().bootstrap(now_ms());
                match wake {
                    Wake::Polling => {
                        *interval.borrow_mut() = Some(spawn_poll(&controller, &phase));
                    }
                    Wake::Reopened => phase.set(controller.borrow().phase().clone()),
                    Wake::Dormant => {}
                }

                let window = web_sys::window().expect("window");
                let document = window.document().expect("document");

                let on_visibility = {
                    let controller = controller.clone();
                    let phase = phase.clone();
                    let interval = interval.clone();
                    let document = document.clone();
                    Closure::wrap(Box::new(move || {
                        if document.hidden() {
                            controller.borrow_mut().page_hidden(now_ms());
                            interval.borrow_mut().take();
                        } else {
                            let wake = controller.borrow_mut().page_visible(now_ms());
                            match wake {
                                Wake::Polling => {
                                    *interval.borrow_mut() =
                                        Some(spawn_poll(&controller, &phase));
                                }
                                Wake::Reopened => {
                                    phase.set(controller.borrow().phase().clone());
                                }
                                Wake::Dormant => {}
                            }
                        }
                    }) as Box<dyn FnMut()>)
                };
                let _ = document.add_event_listener_with_callback(
                    "visibilitychange",
                    on_visibility.as_ref().unchecked_ref(),
                );

                let on_unload = {
                    let controller = controller.clone();
                    Closure::wrap(Box::new(move || {
                        controller.borrow_mut().fold_elapsed(now_ms());
                    }) as Box<dyn FnMut()>)
                };
                let _ = window.add_event_listener_with_callback(
                    "beforeunload",
                    on_unload.as_ref().unchecked_ref(),
                );

                move || {
                    let _ = document.remove_event_listener_with_callback(
                        "visibilitychange",
                        on_visibility.as_ref().unchecked_ref(),
                    );
                    let _ = window.remove_event_listener_with_callback(
                        "beforeunload",
                        on_unload.as_ref().unchecked_ref(),
                    );
                    interval.borrow_mut().take();
                }
            },
            (),
        );
    }

    // Phase side effects: scroll lock, stopping the poll once open, and
    // the auto-close timers after a submission settles.
    {
        let controller = controller.clone();
        let phase_setter = phase.clone();
        let interval = interval.clone();
        use_effect_with_deps(
            move |phase: &PopupPhase| {
                let lock = host_scroll_lock();
                match phase {
                    PopupPhase::Hidden => lock.resume(),
                    open => {
                        lock.suspend();
                        interval.borrow_mut().take();
                        let close_after = match open {
                            PopupPhase::Success => Some(SUCCESS_CLOSE_MS),
                            PopupPhase::Failure(_) => Some(FAILURE_CLOSE_MS),
                            _ => None,
                        };
                        if let Some(delay) = close_after {
                            let controller = controller.clone();
                            let phase_setter = phase_setter.clone();
                            Timeout::new(delay, move || {
                                controller.borrow_mut().dismiss();
                                phase_setter.set(PopupPhase::Hidden);
                            })
                            .forget();
                        }
                    }
                }
                || ()
            },
            (*phase).clone(),
        );
    }

    let do_next: Callback<()> = {
        let controller = controller.clone();
        let phase = phase.clone();
        let name_value = name_value.clone();
        let field_error = field_error.clone();
        Callback::from(move |_| {
            match controller.borrow_mut().advance_with_name(&name_value) {
                Ok(()) => {
                    field_error.set(None);
                    phase.set(PopupPhase::EmailStep);
                }
                Err(_) => field_error.set(Some("Please enter your name.".to_string())),
            }
        })
    };

    let do_submit: Callback<()> = {
        let controller = controller.clone();
        let phase = phase.clone();
        let email_value = email_value.clone();
        let field_error = field_error.clone();
        Callback::from(move |_| {
            let submission = match controller.borrow_mut().begin_submit(&email_value) {
                Ok(submission) => submission,
                Err(FormError::InvalidEmail) => {
                    field_error.set(Some("Please enter a valid email address.".to_string()));
                    return;
                }
                Err(FormError::MissingName) => {
                    field_error.set(Some("Please enter your name first.".to_string()));
                    return;
                }
                Err(_) => return,
            };
            field_error.set(None);
            phase.set(PopupPhase::Submitting);

            let controller = controller.clone();
            let phase = phase.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match submit_lead(submission).await {
                    Ok(message) => {
                        log!("lead submitted:", message);
                        controller.borrow_mut().submission_succeeded();
                    }
                    Err(message) => controller.borrow_mut().submission_failed(message),
                }
                phase.set(controller.borrow().phase().clone());
            });
        })
    };

    let do_dismiss = {
        let controller = controller.clone();
        let phase = phase.clone();
        Callback::from(move |_: MouseEvent| {
            controller.borrow_mut().dismiss();
            phase.set(PopupPhase::Hidden);
        })
    };

    if *phase == PopupPhase::Hidden {
        return html! {};
    }

    let on_enter = |action: &Callback<()>| {
        let action = action.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                e.prevent_default();
                action.emit(());
            }
        })
    };
    let on_click = |action: &Callback<()>| {
        let action = action.clone();
        Callback::from(move |_: MouseEvent| action.emit(()))
    };

    let body = match &*phase {
        PopupPhase::NameStep => html! {
            <div class="popup-step">
                <h3>{"Before you go, what's your name?"}</h3>
                <input
                    type="text"
                    placeholder="Your name"
                    value={(*name_value).clone()}
                    oninput={let name_value = name_value.clone(); move |e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        name_value.set(input.value());
                    }}
                    onkeydown={on_enter(&do_next)}
                />
                <button onclick={on_click(&do_next)}>{"Next"}</button>
            </div>
        },
        PopupPhase::EmailStep => html! {
            <div class="popup-step">
                <h3>{"Where should we send your code?"}</h3>
                <input
                    type="email"
                    placeholder="you@example.com"
                    value={(*email_value).clone()}
                    oninput={let email_value = email_value.clone(); move |e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        email_value.set(input.value());
                    }}
                    onkeydown={on_enter(&do_submit)}
                />
                <button onclick={on_click(&do_submit)}>{"Get My Code"}</button>
            </div>
        },
        PopupPhase::Submitting => html! {
            <div class="popup-step popup-submitting">
                <p>{"Submitting..."}</p>
            </div>
        },
        PopupPhase::Success => html! {
            <div class="popup-step popup-success">
                <p>{"Thank you! Your code is on its way to your inbox."}</p>
            </div>
        },
        PopupPhase::Failure(message) => html! {
            <div class="popup-step popup-error">
                <p>{message.clone()}</p>
            </div>
        },
        PopupPhase::Hidden => html! {},
    };

    html! {
        <div class="timer-popup popup-visible">
            <div class="popup-card">
                <button class="popup-close" aria-label="Close" onclick={do_dismiss}>{"×"}</button>
                { body }
                {
                    if let Some(message) = (*field_error).as_ref() {
                        html! { <p class="popup-field-error">{message}</p> }
                    } else {
                        html! {}
                    }
                }
            </div>
        </div>
    }
}
