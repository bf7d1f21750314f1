// src/pipeline/summary.rs

use crate::domain::{ListingType, PreparedListing};
use crate::pipeline::clean::cmp_nulls_last;
use crate::pipeline::stats::{mean, median, Fence};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

pub const MIN_PRICE: f64 = 1_000_000.0;
pub const MAX_PRICE: f64 = 500_000_000.0;
pub const MIN_LISTINGS: usize = 1;
/// Fence width for per-location outlier removal.
pub const SUMMARY_IQR_K: f64 = 2.5;

/// One row of `location_summary_clean.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub location: String,
    pub avg_price: Option<f64>,
    pub median_price: Option<f64>,
    pub median_bedrooms: Option<f64>,
    pub avg_price_per_bedroom: Option<f64>,
    pub median_price_per_bedroom: Option<f64>,
    pub affordability_rank: Option<usize>,
    #[serde(default)]
    pub listing_count: usize,
}

/// Overview of a prepared dataset, printed before a summary is built.
#[derive(Debug, Default, PartialEq)]
pub struct Inspection {
    pub rows: usize,
    pub by_listing_type: BTreeMap<String, usize>,
    pub price_min: Option<f64>,
    pub price_median: Option<f64>,
    pub price_max: Option<f64>,
}

pub fn inspect(rows: &[PreparedListing]) -> Inspection {
    let mut by_listing_type = BTreeMap::new();
    for r in rows {
        *by_listing_type.entry(r.raw.listing_type.clone()).or_insert(0) += 1;
    }
    let prices: Vec<f64> = rows.iter().map(|r| r.price_normalized).collect();
    Inspection {
        rows: rows.len(),
        by_listing_type,
        price_min: prices.iter().copied().reduce(f64::min),
        price_median: median(&prices),
        price_max: prices.iter().copied().reduce(f64::max),
    }
}

/// Keeps one listing type (`None` keeps both) within the plausible price band.
pub fn filter_listings(
    rows: &[PreparedListing],
    listing_type: Option<ListingType>,
) -> Vec<PreparedListing> {
    let out: Vec<PreparedListing> = rows
        .iter()
        .filter(|r| match listing_type {
            Some(t) => r.raw.listing_type.trim().eq_ignore_ascii_case(t.as_str()),
            None => true,
        })
        .filter(|r| r.price_normalized >= MIN_PRICE && r.price_normalized <= MAX_PRICE)
        .cloned()
        .collect();

    let label = listing_type.map(|t| t.as_str()).unwrap_or("Both");
    info!(listing_type = label, rows = out.len(), "Clean listings");
    out
}

pub fn build_summary(rows: &[PreparedListing], min_listings: usize) -> Vec<LocationSummary> {
    let mut groups: BTreeMap<&str, Vec<&PreparedListing>> = BTreeMap::new();
    for r in rows {
        groups.entry(r.raw.location.as_str()).or_default().push(r);
    }

    let mut out: Vec<LocationSummary> = groups
        .into_iter()
        .filter_map(|(location, grp)| {
            let grp = remove_outliers(grp);
            if grp.len() < min_listings {
                return None;
            }

            let prices: Vec<f64> = grp.iter().map(|r| r.price_normalized).collect();
            let beds: Vec<f64> = grp.iter().filter_map(|r| r.bedrooms_no).collect();
            let avg_price = mean(&prices)?;
            let median_price = median(&prices)?;
            let median_bedrooms = median(&beds);

            let divisor = match median_bedrooms {
                Some(b) if b != 0.0 => b,
                _ => 1.0,
            };

            Some(LocationSummary {
                location: location.to_string(),
                avg_price: Some(avg_price.round()),
                median_price: Some(median_price.round()),
                median_bedrooms,
                avg_price_per_bedroom: Some((avg_price / divisor).round()),
                median_price_per_bedroom: Some((median_price / divisor).round()),
                affordability_rank: None,
                listing_count: grp.len(),
            })
        })
        .collect();

    out.sort_by(|a, b| cmp_nulls_last(a.avg_price_per_bedroom, b.avg_price_per_bedroom));
    for (i, s) in out.iter_mut().enumerate() {
        s.affordability_rank = Some(i + 1);
    }
    out
}

/// A location whose prices are all equal keeps every row.
fn remove_outliers(group: Vec<&PreparedListing>) -> Vec<&PreparedListing> {
    let prices: Vec<f64> = group.iter().map(|r| r.price_normalized).collect();
    match Fence::iqr(&prices, SUMMARY_IQR_K) {
        Some(fence) if fence.iqr != 0.0 => group
            .into_iter()
            .filter(|r| fence.contains(r.price_normalized))
            .collect(),
        _ => group,
    }
}

/// Short name used in console tables: the text before the first comma.
pub fn short_location(location: &str) -> &str {
    location.split(',').next().unwrap_or(location).trim()
}
