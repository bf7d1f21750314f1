// templates/pages/home.rs

use crate::db::listings::LocationAggregate;
use crate::db::scrapes::ScrapeRun;
use crate::templates::{
    components::{card, kes},
    desktop_layout,
};
use chrono::DateTime;
use maud::{html, Markup};

pub struct HomeVm {
    pub total_listings: i64,
    pub locations: Vec<LocationAggregate>,
    pub scrapes: Vec<ScrapeRun>,
}

fn fmt_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn home_page(vm: &HomeVm) -> Markup {
    desktop_layout(
        "Home",
        html! {
            h1 { "Nairobi property prices" }
            p { (vm.total_listings) " listings across " (vm.locations.len()) " locations." }

            (card("Locations by price per bedroom", html! {
                @if vm.locations.is_empty() {
                    p { "No listings stored yet. Run " code { "nairobi_listings pipeline" } "." }
                } @else {
                    table {
                        thead {
                            tr {
                                th { "#" }
                                th { "Location" }
                                th { "Listings" }
                                th { "Avg price" }
                                th { "Avg price / bedroom" }
                            }
                        }
                        tbody {
                            @for (i, loc) in vm.locations.iter().enumerate() {
                                tr {
                                    td { (i + 1) }
                                    td { (loc.location) }
                                    td class="num" { (loc.listings) }
                                    td class="num" { (kes(loc.avg_price)) }
                                    td class="num" { (kes(loc.avg_price_per_bedroom)) }
                                }
                            }
                        }
                    }
                }
            }))

            @if !vm.scrapes.is_empty() {
                (card("Recent scrapes", html! {
                    table {
                        thead {
                            tr {
                                th { "Started" }
                                th { "Sources" }
                                th { "Pages" }
                                th { "Listings" }
                                th { "Status" }
                            }
                        }
                        tbody {
                            @for run in &vm.scrapes {
                                tr {
                                    td { (fmt_ts(run.started_at)) }
                                    td { (run.sources) }
                                    td class="num" { (run.pages_fetched.unwrap_or(0)) }
                                    td class="num" { (run.listings_seen.unwrap_or(0)) }
                                    td {
                                        @match (run.finished_at, run.success) {
                                            (None, _) => { "running" }
                                            (Some(_), true) => { "ok" }
                                            (Some(_), false) => { (run.error_message.as_deref().unwrap_or("failed")) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }))
            }
        },
    )
}
