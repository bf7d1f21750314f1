use maud::{html, Markup, DOCTYPE};

const STYLE: &str = "
body { font-family: system-ui, sans-serif; max-width: 1080px; margin: 0 auto; padding: 1rem; color: #222; }
header { display: flex; align-items: center; justify-content: space-between; border-bottom: 1px solid #ddd; }
nav ul { display: flex; gap: 1rem; list-style: none; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.35rem 0.6rem; border-bottom: 1px solid #eee; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.card { margin: 1.5rem 0; }
";

pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Nairobi Listings" }
                style { (STYLE) }
            }
            body {
                header {
                    h3 { a href="/" { "Nairobi Listings" } }
                    nav {
                        ul {
                            li { a href="/properties" { "Properties" } }
                            li { a href="/summary/location" { "Summary" } }
                            li { a href="/schema" { "Schema" } }
                            li { a href="/export.xlsx" { "Download" } }
                        }
                    }
                }
                (content)
            }
        }
    }
}
