// src/domain/listing.rs

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "Sale",
            ListingType::Rent => "Rent",
        }
    }

    /// Parses a `--type` filter. `both` means no filter.
    pub fn parse_filter(s: &str) -> Result<Option<Self>, String> {
        if s.trim().eq_ignore_ascii_case("both") {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(ListingType::Sale),
            "rent" => Ok(ListingType::Rent),
            other => Err(format!("unknown listing type '{other}'")),
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Studio,
    Townhouse,
    Land,
    Commercial,
    Other,
}

// "Parklands" is not land and "workshop" is not a shop
static PROPERTY_KEYWORDS: LazyLock<Vec<(PropertyType, Regex)>> = LazyLock::new(|| {
    [
        (PropertyType::Townhouse, r"town ?houses?"),
        (PropertyType::Villa, r"villas?"),
        (PropertyType::Studio, r"studios?|bedsitters?"),
        (PropertyType::Apartment, r"apartments?|flats?"),
        (PropertyType::House, r"houses?|bungalows?|maisonettes?"),
        (PropertyType::Land, r"land|plots?"),
        (PropertyType::Commercial, r"offices?|commercial|shops?"),
    ]
    .into_iter()
    .map(|(kind, words)| (kind, Regex::new(&format!(r"(?i)\b(?:{words})\b")).unwrap()))
    .collect()
});

impl PropertyType {
    /// Whole-word keyword match over free text such as a category name or
    /// a title. More specific kinds are checked before the generic ones.
    pub fn from_text(text: &str) -> Self {
        PROPERTY_KEYWORDS
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map_or(PropertyType::Other, |(kind, _)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Studio => "studio",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
            PropertyType::Other => "other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the listings schema, typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub location: String,
    pub property_type: PropertyType,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    /// Square metres.
    pub size: Option<f64>,
    pub amenities: Vec<String>,
    pub price_kes: Option<f64>,
    pub listing_date: NaiveDate,
}

/// A scraped row before any enrichment. Every field is the cleaned text
/// as it appeared on the page; this is the layout of the raw CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawListing {
    pub source: String,
    pub listing_type: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub size_sqm: String,
    pub property_type: String,
    #[serde(default)]
    pub amenities: String,
    pub url: String,
    pub scraped_at: String,
}

impl RawListing {
    /// Identity used to merge listings seen more than once: the URL when
    /// present, else title and price.
    pub fn dedup_key(&self) -> Option<String> {
        if !self.url.is_empty() {
            return Some(self.url.clone());
        }
        let k = format!("{}{}", self.title, self.price);
        if k.is_empty() {
            None
        } else {
            Some(k)
        }
    }
}

/// A raw listing with the derived numeric columns the pipeline adds.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedListing {
    pub raw: RawListing,
    pub bedrooms_no: Option<f64>,
    pub bathrooms_no: Option<f64>,
    pub size_no: Option<f64>,
    pub bedroom_label: String,
    pub price_no: f64,
    pub price_normalized: f64,
    pub price_per_bedroom: Option<f64>,
    pub month: Option<u32>,
}

impl PreparedListing {
    pub fn listing_date(&self) -> Option<NaiveDate> {
        super::parse::parse_scraped_date(&self.raw.scraped_at)
    }

    /// Projects onto the eight schema columns. Rows without a usable
    /// `scraped_at` have no listing date and are not representable.
    pub fn to_listing(&self) -> Option<Listing> {
        let listing_date = self.listing_date()?;

        Some(Listing {
            location: self.raw.location.clone(),
            property_type: self.property_type(),
            bedrooms: self.bedrooms_no.map(|b| b.round() as i64),
            // "2.5" is stored as 3
            bathrooms: self.bathrooms_no.map(|b| b.ceil() as i64),
            size: self.size_no,
            amenities: super::parse::parse_amenities(&self.raw.amenities),
            price_kes: self.price_kes(),
            listing_date,
        })
    }

    /// The portal's own category when it gave one, else guessed from the title.
    pub fn property_type(&self) -> PropertyType {
        if self.raw.property_type.is_empty() {
            PropertyType::from_text(&self.raw.title)
        } else {
            PropertyType::from_text(&self.raw.property_type)
        }
    }

    pub fn price_kes(&self) -> Option<f64> {
        (self.price_normalized > 0.0).then_some(self.price_normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_type_prefers_specific_keywords() {
        assert_eq!(PropertyType::from_text("Townhouse for sale"), PropertyType::Townhouse);
        assert_eq!(PropertyType::from_text("4 Bed Villa"), PropertyType::Villa);
        assert_eq!(PropertyType::from_text("Houses & Apartments For Sale"), PropertyType::Apartment);
        assert_eq!(PropertyType::from_text("HOUSE"), PropertyType::House);
        assert_eq!(PropertyType::from_text("1/8 acre plot"), PropertyType::Land);
        assert_eq!(PropertyType::from_text("???"), PropertyType::Other);
    }

    #[test]
    fn property_type_matches_whole_words_only() {
        assert_eq!(PropertyType::from_text("4 bed in Parklands"), PropertyType::Other);
        assert_eq!(PropertyType::from_text("Workshop space, Industrial Area"), PropertyType::Other);
        assert_eq!(PropertyType::from_text("Flatbed parking, Westlands"), PropertyType::Other);
        assert_eq!(PropertyType::from_text("Land for sale"), PropertyType::Land);
        assert_eq!(PropertyType::from_text("Shops & Offices"), PropertyType::Commercial);
        assert_eq!(PropertyType::from_text("2 Bedroom Flats, Kileleshwa"), PropertyType::Apartment);
        assert_eq!(PropertyType::from_text("Town House in Lavington"), PropertyType::Townhouse);
    }

    #[test]
    fn listing_type_filter_accepts_both() {
        assert_eq!(ListingType::parse_filter("Both"), Ok(None));
        assert_eq!(ListingType::parse_filter("sale"), Ok(Some(ListingType::Sale)));
        assert_eq!(ListingType::parse_filter(" RENT "), Ok(Some(ListingType::Rent)));
        assert!(ListingType::parse_filter("lease").is_err());
    }

    #[test]
    fn dedup_key_falls_back_to_title_and_price() {
        let mut raw = RawListing {
            title: "2 Bed".into(),
            price: "KSh 100".into(),
            ..Default::default()
        };
        assert_eq!(raw.dedup_key().as_deref(), Some("2 BedKSh 100"));
        raw.url = "https://x/1".into();
        assert_eq!(raw.dedup_key().as_deref(), Some("https://x/1"));
        assert_eq!(RawListing::default().dedup_key(), None);
    }
}
