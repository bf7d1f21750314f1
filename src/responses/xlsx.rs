// responses/xlsx.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Workbook download. The export is a snapshot of the table, so it is never cached.
pub fn xlsx_response(buffer: Vec<u8>, filename: &str) -> ResultResp {
    let filename = attachment_name(filename);
    let len = buffer.len();

    ResponseBuilder::new()
        .status(200)
        .header("Content-Type", XLSX_CONTENT_TYPE)
        .header("Content-Disposition", format!("attachment; filename=\"{filename}\""))
        .header("Content-Length", len.to_string())
        .header("Cache-Control", "no-store")
        .body(Body::from(buffer))
        .map_err(|e| ServerError::XlsxError(format!("Failed to build download for {filename}: {e}")))
}

/// Keeps the name safe inside a quoted header value and ensures the extension.
fn attachment_name(name: &str) -> String {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if out.is_empty() {
        out.push_str("listings");
    }
    if !out.to_ascii_lowercase().ends_with(".xlsx") {
        out.push_str(".xlsx");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_names_are_header_safe() {
        assert_eq!(attachment_name("nairobi_listings.xlsx"), "nairobi_listings.xlsx");
        assert_eq!(attachment_name("Karen \"top\" 10"), "Karen__top__10.xlsx");
        assert_eq!(attachment_name("../etc/passwd"), ".._etc_passwd.xlsx");
        assert_eq!(attachment_name("  "), "listings.xlsx");
    }

    #[test]
    fn download_headers() {
        let resp = xlsx_response(vec![b'P', b'K', 3, 4], "export").unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], XLSX_CONTENT_TYPE);
        assert_eq!(resp.headers()["Content-Disposition"], "attachment; filename=\"export.xlsx\"");
        assert_eq!(resp.headers()["Content-Length"], "4");
        assert_eq!(resp.headers()["Cache-Control"], "no-store");
    }
}
