use crate::router::handle;
use crate::tests::utils::{get, setup_test_db};

#[test]
fn export_downloads_a_workbook() {
    let db = setup_test_db("export_route");

    let resp = handle(get("/export.xlsx"), &db).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(resp.headers()["Content-Disposition"]
        .to_str()
        .unwrap()
        .contains("nairobi_listings.xlsx"));
}
