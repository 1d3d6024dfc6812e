use yew::prelude::*;

use crate::components::newsletter::NewsletterForm;

#[function_component(LearnMore)]
pub fn learn_more() -> Html {
    html! {
        <div class="learnmore-page">
            <section class="learnmore-intro">
                <h2>{"Made for every height you reach for"}</h2>
                <p>
                    {"Each pair is built around a sculpted heel that carries you \
                      from the first meeting of the morning to the last dance of \
                      the night. No pinching, no wobble, no compromise."}
                </p>
            </section>

            <footer class="site-footer">
                <h4>{"Stay in the loop"}</h4>
                <NewsletterForm />
            </footer>
        </div>
    }
}
