use maud::{html, Markup};

pub mod error;

pub fn card(title: &str, body: Markup) -> Markup {
    html! {
        div class="card" {
            h2 { (title) }
            div class="card-body" {
                (body)
            }
        }
    }
}

/// Whole shillings with thousands separators, or a dash.
pub fn kes(v: Option<f64>) -> Markup {
    html! {
        @match v.filter(|v| v.is_finite()) {
            Some(v) => { "KSh " (crate::pipeline::audit::fmt_thousands(v)) }
            None => { "–" }
        }
    }
}
