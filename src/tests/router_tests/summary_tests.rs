use crate::db::listings::replace_listings;
use crate::domain::RawListing;
use crate::pipeline::prepare::prepare;
use crate::router::handle;
use crate::tests::utils::{body_string, get, setup_test_db};
use serde_json::Value;

fn raw(title: &str, price: &str, location: &str, url: &str) -> RawListing {
    RawListing {
        source: "Jiji".into(),
        listing_type: "Rent".into(),
        title: title.into(),
        price: price.into(),
        location: location.into(),
        url: url.into(),
        scraped_at: "2025-02-01T12:00:00".into(),
        ..Default::default()
    }
}

#[test]
fn location_summary_json() {
    let db = setup_test_db("summary_json");
    let rows = prepare(&[
        raw("2 bedroom flat", "KSh 60,000", "Kilimani", "https://jiji.co.ke/a"),
        raw("1 bedroom flat", "KSh 25,000", "Roysambu", "https://jiji.co.ke/b"),
        raw("bedsitter", "KSh 9,000", "Githurai", "https://jiji.co.ke/c"),
    ]);
    replace_listings(&db, &rows).unwrap();

    let mut resp = handle(get("/summary/location"), &db).unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_str(&body_string(&mut resp)).unwrap();
    let rows = body.as_array().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["location"], "Roysambu");
    assert_eq!(rows[1]["avg_price_per_bedroom"], 30_000.0);
    // no bedroom count, so no per-bedroom price
    assert_eq!(rows[2]["location"], "Githurai");
    assert!(rows[2]["avg_price_per_bedroom"].is_null());
}

#[test]
fn schema_json_lists_eight_columns() {
    let db = setup_test_db("schema_json");

    let mut resp = handle(get("/schema"), &db).unwrap();
    let body: Value = serde_json::from_str(&body_string(&mut resp)).unwrap();
    let cols = body.as_array().unwrap();

    assert_eq!(cols.len(), 8);
    assert_eq!(cols[0]["name"], "location");
    assert_eq!(cols[7]["name"], "listing_date");
}
