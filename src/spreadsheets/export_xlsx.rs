use crate::db::listings::ListingRow;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

const HEADERS: [&str; 12] = [
    "Location",
    "Property Type",
    "Bedrooms",
    "Bathrooms",
    "Size (sqm)",
    "Amenities",
    "Price (KES)",
    "Listing Date",
    "Listing Type",
    "Source",
    "Title",
    "URL",
];

fn xlsx_err(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

fn write_opt_number(ws: &mut Worksheet, r: u32, c: u16, v: Option<f64>, what: &str) -> Result<(), ServerError> {
    if let Some(v) = v.filter(|v| v.is_finite()) {
        ws.write_number(r, c, v).map_err(xlsx_err(what))?;
    }
    Ok(())
}

/// One sheet, schema columns first, then provenance.
pub fn build_listings_workbook(listings: &[ListingRow]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Listings").map_err(xlsx_err("sheet name"))?;

    let bold = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write header '{header}': {e}")))?;
    }

    for (i, l) in listings.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet.write_string(r, 0, &l.location).map_err(xlsx_err("location"))?;
        worksheet.write_string(r, 1, &l.property_type).map_err(xlsx_err("property type"))?;
        write_opt_number(worksheet, r, 2, l.bedrooms, "bedrooms")?;
        // whole bathrooms, as in the listing schema
        write_opt_number(worksheet, r, 3, l.bathrooms.map(f64::ceil), "bathrooms")?;
        write_opt_number(worksheet, r, 4, l.size, "size")?;
        worksheet
            .write_string(r, 5, l.amenities.join(", "))
            .map_err(xlsx_err("amenities"))?;
        write_opt_number(worksheet, r, 6, l.price_kes, "price")?;
        worksheet
            .write_string(r, 7, l.listing_date.as_deref().unwrap_or(""))
            .map_err(xlsx_err("listing date"))?;
        worksheet.write_string(r, 8, &l.listing_type).map_err(xlsx_err("listing type"))?;
        worksheet.write_string(r, 9, &l.source).map_err(xlsx_err("source"))?;
        worksheet.write_string(r, 10, &l.title).map_err(xlsx_err("title"))?;
        worksheet.write_string(r, 11, &l.url).map_err(xlsx_err("url"))?;
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}

pub fn export_listings_xlsx(listings: &[ListingRow]) -> ResultResp {
    let buffer = build_listings_workbook(listings)?;
    xlsx_response(buffer, "nairobi_listings.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_is_a_zip() {
        let row = ListingRow {
            id: 1,
            source: "Jiji".into(),
            listing_type: "Rent".into(),
            title: "2 bed flat".into(),
            price: "KSh 45,000".into(),
            location: "Kilimani".into(),
            property_type: "apartment".into(),
            bedrooms: Some(2.0),
            bathrooms: Some(1.5),
            size: None,
            amenities: vec!["Gym".into()],
            url: "https://jiji.co.ke/x".into(),
            bedroom_label: "2 Bedrooms".into(),
            price_kes: Some(45_000.0),
            price_per_bedroom: Some(22_500.0),
            listing_date: Some("2025-01-01".into()),
            scraped_at: "2025-01-01T09:00:00".into(),
        };
        let bytes = build_listings_workbook(&[row]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
