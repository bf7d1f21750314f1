use crate::db::connection::Database;
use astra::{Body, Response};
use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fresh database under the temp dir with the production schema applied.
pub fn setup_test_db(name: &str) -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("nl_{}_{name}_{nanos}.sqlite", std::process::id()));
    let db = Database::new(path.to_string_lossy().into_owned());

    db.init()
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    db
}

pub fn body_string(resp: &mut Response) -> String {
    let mut bytes = Vec::new();
    resp.body_mut().reader().read_to_end(&mut bytes).unwrap();
    String::from_utf8(bytes).unwrap()
}

pub fn get(path: &str) -> astra::Request {
    http::Request::builder()
        .method(http::Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}
