use crate::db::listings::{count_listings, get_all_listings, get_listing, get_listings, location_summary};
use crate::db::scrapes::get_recent_scrapes;
use crate::db::Database;
use crate::errors::ServerError;
use crate::responses::{html_response, json_error_response, json_response, json_response_status, ResultResp};
use crate::schema;
use crate::spreadsheets::export_listings_xlsx;
use crate::templates::pages::{home_page, HomeVm};
use astra::Request;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 500;
const RECENT_SCRAPES: usize = 10;

pub fn handle(req: Request, db: &Database) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();
    debug!("{method} {path}");

    match (method, path) {
        ("GET", "/") => home(db),
        ("GET", "/properties") => api(list_properties(&req, db)),
        ("GET", "/summary/location") => api(location_summary(db).and_then(|rows| json_response(&rows))),
        ("GET", "/schema") => api(json_response(schema::columns())),
        ("GET", "/export.xlsx") => export_listings_xlsx(&get_all_listings(db)?),
        ("GET", p) if p.starts_with("/properties/") => api(property_detail(&p["/properties/".len()..], db)),
        _ => Err(ServerError::NotFound),
    }
}

/// JSON routes answer errors with a JSON body too.
fn api(result: ResultResp) -> ResultResp {
    Ok(result.unwrap_or_else(json_error_response))
}

fn home(db: &Database) -> ResultResp {
    let vm = HomeVm {
        total_listings: count_listings(db)?,
        locations: location_summary(db)?,
        scrapes: db.with_conn(|conn| get_recent_scrapes(conn, RECENT_SCRAPES))?,
    };
    html_response(home_page(&vm))
}

fn list_properties(req: &Request, db: &Database) -> ResultResp {
    let params = parse_query(req);
    let limit = query_usize(&params, "limit", DEFAULT_LIMIT)?.min(MAX_LIMIT);
    let offset = query_usize(&params, "offset", 0)?;

    json_response(&get_listings(db, limit, offset)?)
}

fn property_detail(id: &str, db: &Database) -> ResultResp {
    let id: i64 = id
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid property id: {id}")))?;

    match get_listing(db, id)? {
        Some(row) => json_response(&row),
        None => json_response_status(404, &serde_json::json!({ "detail": "Property not found" })),
    }
}

fn query_usize(params: &HashMap<String, String>, key: &str, default: usize) -> Result<usize, ServerError> {
    match params.get(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("{key} must be a non-negative integer, got {v:?}"))),
    }
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), v.to_string());
            }
        }
    }

    map
}
