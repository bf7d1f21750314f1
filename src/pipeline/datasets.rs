// src/pipeline/datasets.rs

//! CSV files passed between pipeline stages.

use crate::domain::{PreparedListing, RawListing};
use crate::pipeline::PipelineError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Flat CSV layout of a prepared listing: the raw columns, the derived
/// columns, and the eight schema columns, so the file can be checked
/// against the listing schema on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedRow {
    pub source: String,
    pub listing_type: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub size: Option<f64>,
    pub property_type: String,
    pub amenities: String,
    pub url: String,
    pub scraped_at: String,
    pub bedroom_label: String,
    pub price_no: f64,
    pub price_normalized: f64,
    pub price_per_bedroom: Option<f64>,
    pub month: Option<u32>,
    #[serde(default)]
    pub price_kes: Option<f64>,
    #[serde(default)]
    pub listing_date: String,
    // Raw cells for round-tripping; the numeric columns above take their names.
    #[serde(default)]
    pub bedrooms_raw: String,
    #[serde(default)]
    pub bathrooms_raw: String,
    #[serde(default)]
    pub size_sqm: String,
}

impl From<&PreparedListing> for PreparedRow {
    fn from(p: &PreparedListing) -> Self {
        let listing = p.to_listing();
        PreparedRow {
            source: p.raw.source.clone(),
            listing_type: p.raw.listing_type.clone(),
            title: p.raw.title.clone(),
            price: p.raw.price.clone(),
            location: p.raw.location.clone(),
            bedrooms: p.bedrooms_no,
            bathrooms: p.bathrooms_no,
            size: p.size_no,
            property_type: listing
                .as_ref()
                .map(|l| l.property_type.to_string())
                .unwrap_or_else(|| p.raw.property_type.clone()),
            amenities: p.raw.amenities.clone(),
            url: p.raw.url.clone(),
            scraped_at: p.raw.scraped_at.clone(),
            bedroom_label: p.bedroom_label.clone(),
            price_no: p.price_no,
            price_normalized: p.price_normalized,
            price_per_bedroom: p.price_per_bedroom,
            month: p.month,
            price_kes: listing.as_ref().and_then(|l| l.price_kes),
            listing_date: listing
                .map(|l| l.listing_date.to_string())
                .unwrap_or_default(),
            bedrooms_raw: p.raw.bedrooms.clone(),
            bathrooms_raw: p.raw.bathrooms.clone(),
            size_sqm: p.raw.size_sqm.clone(),
        }
    }
}

impl From<PreparedRow> for PreparedListing {
    fn from(r: PreparedRow) -> Self {
        PreparedListing {
            raw: RawListing {
                source: r.source,
                listing_type: r.listing_type,
                title: r.title,
                price: r.price,
                location: r.location,
                bedrooms: r.bedrooms_raw,
                bathrooms: r.bathrooms_raw,
                size_sqm: r.size_sqm,
                property_type: r.property_type,
                amenities: r.amenities,
                url: r.url,
                scraped_at: r.scraped_at,
            },
            bedrooms_no: r.bedrooms,
            bathrooms_no: r.bathrooms,
            size_no: r.size,
            bedroom_label: r.bedroom_label,
            price_no: r.price_no,
            price_normalized: r.price_normalized,
            price_per_bedroom: r.price_per_bedroom,
            month: r.month,
        }
    }
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    let mut out = Vec::new();
    for record in reader.deserialize() {
        out.push(record.map_err(|e| PipelineError::csv(path, e))?);
    }
    info!(path = %path.display(), rows = out.len(), "Loaded dataset");
    Ok(out)
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), rows = rows.len(), "Saved dataset");
    Ok(())
}

pub fn read_raw(path: &Path) -> Result<Vec<RawListing>, PipelineError> {
    read_csv(path)
}

pub fn read_prepared(path: &Path) -> Result<Vec<PreparedListing>, PipelineError> {
    let rows: Vec<PreparedRow> = read_csv(path)?;
    Ok(rows.into_iter().map(PreparedListing::from).collect())
}

pub fn write_prepared(path: &Path, rows: &[PreparedListing]) -> Result<(), PipelineError> {
    let flat: Vec<PreparedRow> = rows.iter().map(PreparedRow::from).collect();
    write_csv(path, &flat)
}

/// Header of a CSV file, for schema checks.
pub fn read_header(path: &Path) -> Result<Vec<String>, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| PipelineError::csv(path, e))?;
    Ok(headers.iter().map(str::to_string).collect())
}
