use crate::db::listings::replace_listings;
use crate::db::scrapes::{end_scrape_run, start_scrape_run};
use crate::domain::RawListing;
use crate::errors::ServerError;
use crate::pipeline::prepare::prepare;
use crate::router::handle;
use crate::tests::utils::{body_string, get, setup_test_db};

#[test]
fn home_page_lists_locations_and_scrapes() {
    let db = setup_test_db("home_page");
    let rows = prepare(&[RawListing {
        source: "PigiaMe".into(),
        listing_type: "Sale".into(),
        title: "3 bedroom maisonette".into(),
        price: "KSh 18,500,000".into(),
        location: "Syokimau".into(),
        url: "https://www.pigiame.co.ke/listings/1".into(),
        scraped_at: "2025-02-01T12:00:00".into(),
        ..Default::default()
    }]);
    replace_listings(&db, &rows).unwrap();
    db.with_conn(|conn| {
        let id = start_scrape_run(conn, "PigiaMe", 1_700_000_000)?;
        end_scrape_run(conn, id, 1_700_000_100, 2, 1, true, None)
    })
    .unwrap();

    let mut resp = handle(get("/"), &db).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_string(&mut resp);

    assert!(body.contains("Syokimau"));
    assert!(body.contains("KSh 18,500,000"));
    assert!(body.contains("Recent scrapes"));
}

#[test]
fn home_page_without_data() {
    let db = setup_test_db("home_empty");

    let mut resp = handle(get("/"), &db).unwrap();
    let body = body_string(&mut resp);
    assert!(body.contains("No listings stored yet"));
    assert!(!body.contains("Recent scrapes"));
}

#[test]
fn unknown_route_is_not_found() {
    let db = setup_test_db("unknown_route");

    match handle(get("/nope"), &db) {
        Err(err) => {
            assert!(matches!(err, ServerError::NotFound));
            assert_eq!(err.status(), 404);
        }
        Ok(_) => panic!("expected NotFound"),
    }
}
