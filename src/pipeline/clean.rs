// src/pipeline/clean.rs

use crate::domain::parse::price_per_bedroom;
use crate::domain::PreparedListing;
use crate::pipeline::stats::{mean, median, Fence};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Price fence width for whole-dataset outlier removal.
pub const CLEAN_IQR_K: f64 = 1.5;

#[derive(Debug)]
pub struct CleanOutcome {
    pub rows: Vec<PreparedListing>,
    pub duplicates_dropped: usize,
    pub bedrooms_filled: usize,
    pub unpriced_dropped: usize,
    pub outliers_dropped: usize,
}

/// Per-location aggregate written to `location_summary.csv` by `clean`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    pub location: String,
    pub avg_price: f64,
    pub median_price: f64,
    pub median_bedrooms: Option<f64>,
    pub avg_price_per_bedroom: Option<f64>,
    pub median_price_per_bedroom: Option<f64>,
    pub affordability_rank: usize,
}

pub fn clean(rows: Vec<PreparedListing>) -> CleanOutcome {
    info!(rows = rows.len(), "Loaded dataset");

    // Derived columns are functions of the raw row, so raw equality is
    // whole-row equality.
    let before = rows.len();
    let mut seen = HashSet::new();
    let mut rows: Vec<PreparedListing> = rows
        .into_iter()
        .filter(|r| seen.insert(r.raw.clone()))
        .collect();
    let duplicates_dropped = before - rows.len();
    info!(duplicates_dropped, "Removed duplicate rows");

    let known: Vec<f64> = rows.iter().filter_map(|r| r.bedrooms_no).collect();
    let mut bedrooms_filled = 0;
    if let Some(m) = median(&known) {
        for r in rows.iter_mut().filter(|r| r.bedrooms_no.is_none()) {
            r.bedrooms_no = Some(m);
            bedrooms_filled += 1;
        }
        if bedrooms_filled > 0 {
            info!(bedrooms_filled, median = m, "Filled missing bedroom values with median");
        }
    }

    for r in rows.iter_mut() {
        r.raw.location = r.raw.location.trim().to_lowercase();
    }

    // "POA" and "Contact agent" rows carry price 0; they have no price at all
    let before = rows.len();
    rows.retain(|r| r.price_no > 0.0);
    let unpriced_dropped = before - rows.len();
    info!(unpriced_dropped, "Removed rows without a price");

    let prices: Vec<f64> = rows.iter().map(|r| r.price_no).collect();
    let before = rows.len();
    if let Some(fence) = Fence::iqr(&prices, CLEAN_IQR_K) {
        rows.retain(|r| fence.contains(r.price_no));
    }
    let outliers_dropped = before - rows.len();
    info!(outliers_dropped, "Removed outlier rows based on price");

    for r in rows.iter_mut() {
        r.price_per_bedroom = price_per_bedroom(r.price_no, r.bedrooms_no);
    }

    CleanOutcome {
        rows,
        duplicates_dropped,
        bedrooms_filled,
        unpriced_dropped,
        outliers_dropped,
    }
}

/// Groups by location and ranks by ascending mean price per bedroom.
/// Locations with no per-bedroom figure rank last.
pub fn location_stats(rows: &[PreparedListing]) -> Vec<LocationStats> {
    let mut groups: BTreeMap<&str, Vec<&PreparedListing>> = BTreeMap::new();
    for r in rows {
        groups.entry(r.raw.location.as_str()).or_default().push(r);
    }

    let mut out: Vec<LocationStats> = groups
        .into_iter()
        .filter_map(|(location, grp)| {
            let prices: Vec<f64> = grp
                .iter()
                .map(|r| r.price_no)
                .filter(|p| *p > 0.0)
                .collect();
            let beds: Vec<f64> = grp.iter().filter_map(|r| r.bedrooms_no).collect();
            let ppb: Vec<f64> = grp.iter().filter_map(|r| r.price_per_bedroom).collect();

            Some(LocationStats {
                location: location.to_string(),
                avg_price: mean(&prices)?,
                median_price: median(&prices)?,
                median_bedrooms: median(&beds),
                avg_price_per_bedroom: mean(&ppb),
                median_price_per_bedroom: median(&ppb),
                affordability_rank: 0,
            })
        })
        .collect();

    out.sort_by(|a, b| cmp_nulls_last(a.avg_price_per_bedroom, b.avg_price_per_bedroom));
    for (i, s) in out.iter_mut().enumerate() {
        s.affordability_rank = i + 1;
    }
    out
}

pub(crate) fn cmp_nulls_last(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
