use crate::db::connection::Database;
use crate::domain::parse::parse_amenities;
use crate::domain::PreparedListing;
use crate::errors::ServerError;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;

const LISTING_COLUMNS: &str = "id, source, listing_type, title, price, location, property_type, \
     bedrooms, bathrooms, size, amenities, url, bedroom_label, price_kes, price_per_bedroom, \
     listing_date, scraped_at";

/// A stored listing as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    pub id: i64,
    pub source: String,
    pub listing_type: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub property_type: String,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub size: Option<f64>,
    pub amenities: Vec<String>,
    pub url: String,
    pub bedroom_label: String,
    pub price_kes: Option<f64>,
    pub price_per_bedroom: Option<f64>,
    pub listing_date: Option<String>,
    pub scraped_at: String,
}

impl ListingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let amenities: String = row.get(10)?;
        Ok(Self {
            id: row.get(0)?,
            source: row.get(1)?,
            listing_type: row.get(2)?,
            title: row.get(3)?,
            price: row.get(4)?,
            location: row.get(5)?,
            property_type: row.get(6)?,
            bedrooms: row.get(7)?,
            bathrooms: row.get(8)?,
            size: row.get(9)?,
            amenities: parse_amenities(&amenities),
            url: row.get(11)?,
            bedroom_label: row.get(12)?,
            price_kes: row.get(13)?,
            price_per_bedroom: row.get(14)?,
            listing_date: row.get(15)?,
            scraped_at: row.get(16)?,
        })
    }
}

/// Per-location aggregate over the stored listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAggregate {
    pub location: String,
    pub avg_price: Option<f64>,
    pub avg_price_per_bedroom: Option<f64>,
    pub listings: i64,
}

fn listing_key(p: &PreparedListing) -> String {
    if p.raw.url.is_empty() {
        format!("{}|{}|{}", p.raw.source, p.raw.title, p.raw.price)
    } else {
        p.raw.url.clone()
    }
}

/// Clears the table and loads `rows` in one transaction. Returns the number
/// of rows stored; repeats of a url (or of source+title+price) are skipped.
pub fn replace_listings(db: &Database, rows: &[PreparedListing]) -> Result<usize, ServerError> {
    let inserted = db.with_conn(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM listings", [])?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO listings (
                    listing_key, source, listing_type, title, price, location, property_type,
                    bedrooms, bathrooms, size, amenities, url, bedroom_label, price_kes,
                    price_per_bedroom, listing_date, scraped_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;

            for p in rows {
                let amenities = parse_amenities(&p.raw.amenities).join(", ");
                inserted += stmt.execute(params![
                    listing_key(p),
                    p.raw.source,
                    p.raw.listing_type,
                    p.raw.title,
                    p.raw.price,
                    p.raw.location,
                    p.property_type().as_str(),
                    p.bedrooms_no,
                    p.bathrooms_no,
                    p.size_no,
                    amenities,
                    p.raw.url,
                    p.bedroom_label,
                    p.price_kes(),
                    p.price_per_bedroom,
                    p.listing_date().map(|d| d.to_string()),
                    p.raw.scraped_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    })?;

    info!("Stored {inserted} of {} listings", rows.len());
    Ok(inserted)
}

/// Newest first.
pub fn get_listings(db: &Database, limit: usize, offset: usize) -> Result<Vec<ListingRow>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings ORDER BY scraped_at DESC, id ASC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], ListingRow::from_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn get_all_listings(db: &Database) -> Result<Vec<ListingRow>, ServerError> {
    get_listings(db, i64::MAX as usize, 0)
}

pub fn get_listing(db: &Database, id: i64) -> Result<Option<ListingRow>, ServerError> {
    db.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
            params![id],
            ListingRow::from_row,
        )
        .optional()
        .map_err(ServerError::from)
    })
}

pub fn count_listings(db: &Database) -> Result<i64, ServerError> {
    db.with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))
            .map_err(ServerError::from)
    })
}

/// Cheapest per bedroom first; locations with no bedroom data go last.
pub fn location_summary(db: &Database) -> Result<Vec<LocationAggregate>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT location, AVG(price_kes), AVG(price_per_bedroom), COUNT(*)
             FROM listings
             GROUP BY location
             ORDER BY AVG(price_per_bedroom) IS NULL, AVG(price_per_bedroom) ASC, location ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LocationAggregate {
                location: row.get(0)?,
                avg_price: row.get(1)?,
                avg_price_per_bedroom: row.get(2)?,
                listings: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}
