// src/pipeline/prepare.rs

use crate::domain::parse::{
    bedroom_label, extract_bedrooms, extract_price, parse_bathrooms, parse_bedrooms,
    parse_scraped_at, parse_size, price_per_bedroom,
};
use crate::domain::{PreparedListing, RawListing};
use chrono::Datelike;

/// Adds the numeric columns to raw rows.
///
/// Bedrooms come from the `bedrooms` cell, then the title, then the URL
/// slug. A price with no digits becomes 0 so that every row carries a
/// number; the summary stage filters those out by its price floor.
pub fn prepare(raw: &[RawListing]) -> Vec<PreparedListing> {
    raw.iter().map(prepare_one).collect()
}

pub fn prepare_one(raw: &RawListing) -> PreparedListing {
    let bedrooms = parse_bedrooms(&raw.bedrooms)
        .or_else(|| extract_bedrooms(&raw.title).map(|b| b as f64))
        .or_else(|| extract_bedrooms(&raw.url).map(|b| b as f64));

    let price_no = extract_price(&raw.price).unwrap_or(0.0);
    let price_normalized = price_no;

    PreparedListing {
        raw: raw.clone(),
        bedrooms_no: bedrooms,
        bathrooms_no: parse_bathrooms(&raw.bathrooms),
        size_no: parse_size(&raw.size_sqm),
        bedroom_label: bedroom_label(bedrooms),
        price_no,
        price_normalized,
        price_per_bedroom: price_per_bedroom(price_normalized, bedrooms),
        month: parse_scraped_at(&raw.scraped_at).map(|dt| dt.month()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, bedrooms: &str, url: &str, price: &str) -> RawListing {
        RawListing {
            source: "Jiji".into(),
            listing_type: "Sale".into(),
            title: title.into(),
            price: price.into(),
            location: "Kilimani".into(),
            bedrooms: bedrooms.into(),
            url: url.into(),
            scraped_at: "2026-02-23T08:00:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn bedrooms_fall_back_to_title_then_url() {
        let rows = vec![
            raw("Nice flat", "3", "", "KSh 9,000,000"),
            raw("2-bedroom apartment", "", "", "KSh 9,000,000"),
            raw("Nice flat", "", "https://x/listings/4-bedroom-apartment-flat-for-sale", "KSh 8,000,000"),
            raw("Nice flat", "", "", "KSh 8,000,000"),
        ];
        let out = prepare(&rows);

        assert_eq!(out[0].bedrooms_no, Some(3.0));
        assert_eq!(out[1].bedrooms_no, Some(2.0));
        assert_eq!(out[2].bedrooms_no, Some(4.0));
        assert_eq!(out[3].bedrooms_no, None);

        assert_eq!(out[0].bedroom_label, "3 Bedrooms");
        assert_eq!(out[3].bedroom_label, "Unknown");

        assert_eq!(out[0].price_per_bedroom, Some(3_000_000.0));
        assert_eq!(out[2].price_per_bedroom, Some(2_000_000.0));
        assert_eq!(out[3].price_per_bedroom, None);
        assert_eq!(out[0].month, Some(2));
    }

    #[test]
    fn missing_price_becomes_zero() {
        let out = prepare_one(&raw("Plot", "", "", "Contact agent"));
        assert_eq!(out.price_no, 0.0);
        assert_eq!(out.price_normalized, 0.0);
        assert_eq!(out.price_per_bedroom, None);
    }

    #[test]
    fn prepared_row_projects_onto_schema() {
        let mut r = raw("3 Bed Villa", "3", "", "KSh 30,000,000");
        r.bathrooms = "2.5".into();
        r.size_sqm = "1,200 m²".into();
        r.amenities = "Pool, Gym".into();
        let listing = prepare_one(&r).to_listing().unwrap();

        assert_eq!(listing.property_type, crate::domain::listing::PropertyType::Villa);
        assert_eq!(listing.bedrooms, Some(3));
        assert_eq!(listing.bathrooms, Some(3));
        assert_eq!(listing.size, Some(1200.0));
        assert_eq!(listing.amenities, vec!["Pool", "Gym"]);
        assert_eq!(listing.price_kes, Some(30_000_000.0));
        assert_eq!(listing.listing_date.to_string(), "2026-02-23");
    }
}
