use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use tracing::{error, warn};

pub use crate::errors::ResultResp;

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => 500,
        }
    }

    /// Message safe to show a client. Storage details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::NotFound => "Not Found".into(),
            ServerError::BadRequest(msg) => msg.clone(),
            _ => "Internal Server Error".into(),
        }
    }

    fn log(&self) {
        match self.status() {
            500 => error!("{self}"),
            _ => warn!("{self}"),
        }
    }
}

/// Convert a ServerError into a proper HTML response
pub fn error_to_response(err: ServerError) -> Response {
    err.log();
    html_error_response(err.status(), &err.public_message())
}

/// `{"detail": ...}` body for the JSON routes.
pub fn json_error_response(err: ServerError) -> Response {
    err.log();
    let body = serde_json::json!({ "detail": err.public_message() });
    raw_response(err.status(), "application/json", body.to_string())
}

/// Build an HTML error page
pub fn html_error_response(status: u16, message: &str) -> Response {
    let html = crate::templates::components::error::error_page(status, message).into_string();
    raw_response(status, "text/html; charset=utf-8", html)
}

fn raw_response(status: u16, content_type: &str, body: String) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
