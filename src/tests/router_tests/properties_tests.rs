// src/tests/router_tests/properties_tests.rs

use crate::db::listings::replace_listings;
use crate::db::Database;
use crate::domain::RawListing;
use crate::pipeline::prepare::prepare;
use crate::router::{handle, MAX_LIMIT};
use crate::tests::utils::{body_string, get, setup_test_db};
use serde_json::Value;

fn seed(db: &Database, n: usize) {
    let raw: Vec<RawListing> = (0..n)
        .map(|i| RawListing {
            source: "BuyRentKenya".into(),
            listing_type: "Sale".into(),
            title: format!("{} Bedroom Apartment in Kilimani", i % 4 + 1),
            price: format!("KSh {},000,000", 10 + i),
            location: "Kilimani, Dagoretti North".into(),
            url: format!("https://www.buyrentkenya.com/listings/{i}"),
            scraped_at: format!("2025-03-{:02}T08:00:00", i % 28 + 1),
            ..Default::default()
        })
        .collect();
    replace_listings(db, &prepare(&raw)).unwrap();
}

fn get_json(db: &Database, path: &str) -> (u16, Value) {
    let mut resp = handle(get(path), db).unwrap();
    let status = resp.status().as_u16();
    let body = body_string(&mut resp);
    (status, serde_json::from_str(&body).unwrap())
}

#[test]
fn properties_default_page() {
    let db = setup_test_db("props_default");
    seed(&db, 30);

    let (status, body) = get_json(&db, "/properties");
    assert_eq!(status, 200);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 20);
    // newest first
    assert_eq!(rows[0]["listing_date"], "2025-03-28");
    assert_eq!(rows[0]["price_kes"], 37_000_000.0);
}

#[test]
fn properties_limit_and_offset() {
    let db = setup_test_db("props_paging");
    seed(&db, 5);

    let (_, all) = get_json(&db, "/properties?limit=10");
    let (_, page) = get_json(&db, "/properties?limit=2&offset=3");
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["id"], all[3]["id"]);
    assert_eq!(page[1]["id"], all[4]["id"]);
}

#[test]
fn properties_limit_is_capped() {
    let db = setup_test_db("props_cap");
    seed(&db, MAX_LIMIT + 10);

    let (status, body) = get_json(&db, "/properties?limit=600");
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), MAX_LIMIT);

    let (_, body) = get_json(&db, &format!("/properties?limit={MAX_LIMIT}&offset={MAX_LIMIT}"));
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[test]
fn properties_bad_query_is_400() {
    let db = setup_test_db("props_bad_query");

    let (status, body) = get_json(&db, "/properties?limit=ten");
    assert_eq!(status, 400);
    assert!(body["detail"].as_str().unwrap().contains("limit"));

    let (status, _) = get_json(&db, "/properties?offset=-1");
    assert_eq!(status, 400);
}

#[test]
fn property_by_id() {
    let db = setup_test_db("props_by_id");
    seed(&db, 2);

    let (_, all) = get_json(&db, "/properties");
    let id = all[0]["id"].as_i64().unwrap();

    let (status, body) = get_json(&db, &format!("/properties/{id}"));
    assert_eq!(status, 200);
    assert_eq!(body["id"], id);
    assert_eq!(body["property_type"], "apartment");
}

#[test]
fn missing_property_is_404() {
    let db = setup_test_db("props_missing");

    let (status, body) = get_json(&db, "/properties/999");
    assert_eq!(status, 404);
    assert_eq!(body, serde_json::json!({ "detail": "Property not found" }));

    let (status, _) = get_json(&db, "/properties/abc");
    assert_eq!(status, 400);
}
