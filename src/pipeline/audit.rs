// src/pipeline/audit.rs

//! Data quality audit over a location summary, plus the automatic fixes
//! for the problems it finds.

use crate::pipeline::clean::cmp_nulls_last;
use crate::pipeline::stats::{mean, median, quantile, Fence};
use crate::pipeline::summary::LocationSummary;
use std::collections::HashSet;
use std::fmt;

/// Below this a Nairobi listing price is bad data.
pub const MIN_VALID_PRICE: f64 = 500_000.0;
pub const AUDIT_IQR_K: f64 = 3.0;
pub const BEDROOM_RANGE: (f64, f64) = (1.0, 10.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    Millions,
    Thousands,
    Kes,
}

impl PriceUnit {
    pub fn scale(&self) -> f64 {
        match self {
            PriceUnit::Millions => 1_000_000.0,
            PriceUnit::Thousands => 1_000.0,
            PriceUnit::Kes => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceUnit::Millions => "millions",
            PriceUnit::Thousands => "thousands",
            PriceUnit::Kes => "kes",
        }
    }
}

/// Guesses the unit prices were recorded in. Q75 rather than the median
/// so a handful of bad low rows don't fool the detector.
pub fn detect_unit_scale(values: &[f64]) -> PriceUnit {
    let positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    match quantile(&positive, 0.75) {
        Some(q75) if q75 < 1_000.0 => PriceUnit::Millions,
        Some(q75) if q75 < 1_000_000.0 => PriceUnit::Thousands,
        _ => PriceUnit::Kes,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub column: &'static str,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub zeros: usize,
    pub nulls: usize,
    pub unit: PriceUnit,
}

impl PriceStats {
    fn from_column(column: &'static str, values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        PriceStats {
            column,
            min: present.iter().copied().reduce(f64::min),
            q25: quantile(&present, 0.25),
            median: median(&present),
            q75: quantile(&present, 0.75),
            max: present.iter().copied().reduce(f64::max),
            mean: mean(&present),
            zeros: present.iter().filter(|v| **v == 0.0).count(),
            nulls: values.len() - present.len(),
            unit: detect_unit_scale(&present),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub column: &'static str,
    pub fence: Option<Fence>,
    pub rows: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub rows: usize,
    pub price_stats: Vec<PriceStats>,
    pub bad_rows: Vec<(String, f64)>,
    pub outliers: Vec<OutlierReport>,
    pub bedroom_values: Vec<f64>,
    pub bedrooms_out_of_range: usize,
    pub rank_range: Option<(usize, usize)>,
    pub rank_nulls: usize,
    pub rank_duplicates: usize,
}

pub fn audit(rows: &[LocationSummary]) -> AuditReport {
    let avg: Vec<Option<f64>> = rows.iter().map(|r| r.avg_price).collect();
    let med: Vec<Option<f64>> = rows.iter().map(|r| r.median_price).collect();
    let price_stats = vec![
        PriceStats::from_column("avg_price", &avg),
        PriceStats::from_column("median_price", &med),
    ];

    // a missing price is a null, not a bad row
    let bad_rows: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|r| r.avg_price.filter(|v| *v < MIN_VALID_PRICE).map(|v| (r.location.clone(), v)))
        .collect();

    let valid: Vec<&LocationSummary> = rows.iter().filter(|r| has_valid_price(r)).collect();
    let outliers = vec![
        outliers_in(&valid, "avg_price", |r| r.avg_price),
        outliers_in(&valid, "avg_price_per_bedroom", |r| r.avg_price_per_bedroom),
    ];

    let mut bedroom_values: Vec<f64> = rows.iter().filter_map(|r| r.median_bedrooms).collect();
    bedroom_values.sort_by(|a, b| a.total_cmp(b));
    bedroom_values.dedup();
    let (lo, hi) = BEDROOM_RANGE;
    let bedrooms_out_of_range = rows
        .iter()
        .filter(|r| !matches!(r.median_bedrooms, Some(b) if b >= lo && b <= hi))
        .count();

    let ranks: Vec<usize> = rows.iter().filter_map(|r| r.affordability_rank).collect();
    let rank_range = ranks
        .iter()
        .min()
        .copied()
        .zip(ranks.iter().max().copied());
    let mut seen = HashSet::new();
    let rank_duplicates = ranks.iter().filter(|r| !seen.insert(**r)).count();

    AuditReport {
        rows: rows.len(),
        price_stats,
        bad_rows,
        outliers,
        bedroom_values,
        bedrooms_out_of_range,
        rank_range,
        rank_nulls: rows.len() - ranks.len(),
        rank_duplicates,
    }
}

fn has_valid_price(r: &LocationSummary) -> bool {
    r.avg_price.is_some_and(|v| v >= MIN_VALID_PRICE)
}

fn outliers_in<F>(rows: &[&LocationSummary], column: &'static str, get: F) -> OutlierReport
where
    F: Fn(&LocationSummary) -> Option<f64>,
{
    let values: Vec<f64> = rows.iter().filter_map(|r| get(*r)).collect();
    let fence = Fence::iqr(&values, AUDIT_IQR_K);
    let rows = match fence {
        Some(f) => rows
            .iter()
            .filter_map(|r| get(*r).filter(|v| !f.contains(*v)).map(|v| (r.location.clone(), v)))
            .collect(),
        None => Vec::new(),
    };
    OutlierReport {
        column,
        fence,
        rows,
    }
}

/// Applies the audit's fixes and returns the cleaned rows together with a
/// note for each fix that changed something.
pub fn fix(rows: Vec<LocationSummary>) -> (Vec<LocationSummary>, Vec<String>) {
    let mut notes = Vec::new();

    let missing = rows.iter().filter(|r| r.avg_price.is_none()).count();
    let before = rows.len();
    let mut rows: Vec<LocationSummary> = rows.into_iter().filter(has_valid_price).collect();
    let dropped = before - rows.len() - missing;
    if dropped > 0 {
        notes.push(format!(
            "Dropped {dropped} rows with avg_price < KES {}",
            fmt_thousands(MIN_VALID_PRICE)
        ));
    }
    if missing > 0 {
        notes.push(format!("Dropped {missing} rows without avg_price"));
    }

    let avg: Vec<f64> = rows.iter().filter_map(|r| r.avg_price).collect();
    let unit = detect_unit_scale(&avg);
    let scale = unit.scale();
    if scale > 1.0 {
        for r in rows.iter_mut() {
            r.avg_price = r.avg_price.map(|v| v * scale);
            r.median_price = r.median_price.map(|v| v * scale);
            r.avg_price_per_bedroom = r.avg_price_per_bedroom.map(|v| v * scale);
            r.median_price_per_bedroom = r.median_price_per_bedroom.map(|v| v * scale);
        }
        notes.push(format!(
            "Rescaled price columns x{} (was in {})",
            fmt_thousands(scale),
            unit.as_str()
        ));
    }

    let mut filled = 0;
    for r in rows.iter_mut() {
        let Some(avg) = r.avg_price else {
            continue;
        };
        if r.avg_price_per_bedroom.map_or(true, |v| v == 0.0) {
            let beds = match r.median_bedrooms {
                Some(b) if b != 0.0 => b,
                _ => 1.0,
            };
            r.avg_price_per_bedroom = Some(avg / beds);
            filled += 1;
        }
    }
    if filled > 0 {
        notes.push(format!("Filled {filled} missing avg_price_per_bedroom values"));
    }

    if rows.iter().any(|r| r.affordability_rank.is_some()) {
        rows.sort_by(|a, b| {
            cmp_nulls_last(
                a.affordability_rank.map(|v| v as f64),
                b.affordability_rank.map(|v| v as f64),
            )
        });
        for (i, r) in rows.iter_mut().enumerate() {
            r.affordability_rank = Some(i + 1);
        }
        notes.push("Re-numbered affordability_rank 1 to N".to_string());
    }

    (rows, notes)
}

/// `12500000` -> `12,500,000`. Fractions are rounded away.
pub fn fmt_thousands(v: f64) -> String {
    let n = v.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_thousands).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(58);
        writeln!(f, "{}", "=".repeat(62))?;
        writeln!(f, "  DATA AUDIT REPORT")?;
        writeln!(f, "{}", "=".repeat(62))?;
        writeln!(f, "  Rows     : {}", self.rows)?;

        writeln!(f, "\n  PRICE COLUMN STATS\n  {rule}")?;
        for s in &self.price_stats {
            writeln!(f, "\n  {}:", s.column)?;
            writeln!(f, "    Min    : {:>15}", fmt_opt(s.min))?;
            writeln!(f, "    Q25    : {:>15}", fmt_opt(s.q25))?;
            writeln!(f, "    Median : {:>15}", fmt_opt(s.median))?;
            writeln!(f, "    Q75    : {:>15}", fmt_opt(s.q75))?;
            writeln!(f, "    Max    : {:>15}", fmt_opt(s.max))?;
            writeln!(f, "    Mean   : {:>15}", fmt_opt(s.mean))?;
            writeln!(f, "    Zeros  : {}", s.zeros)?;
            writeln!(f, "    Nulls  : {}", s.nulls)?;
            writeln!(
                f,
                "  -> Unit detected: {}  (scale: x{})",
                s.unit.as_str(),
                fmt_thousands(s.unit.scale())
            )?;
        }

        writeln!(
            f,
            "\n  BAD ROWS  (avg_price < KES {})\n  {rule}",
            fmt_thousands(MIN_VALID_PRICE)
        )?;
        if self.bad_rows.is_empty() {
            writeln!(f, "  None OK")?;
        } else {
            writeln!(f, "  {} bad rows:", self.bad_rows.len())?;
            for (loc, price) in &self.bad_rows {
                let loc: String = loc.chars().take(55).collect();
                writeln!(f, "    * {loc:55}  avg={:>12}", fmt_thousands(*price))?;
            }
        }

        writeln!(f, "\n  OUTLIER DETECTION  (IQR x3, on clean rows only)\n  {rule}")?;
        for o in &self.outliers {
            match o.fence {
                Some(fence) => writeln!(
                    f,
                    "\n  {}  (fence: {} to {})",
                    o.column,
                    fmt_thousands(fence.lo),
                    fmt_thousands(fence.hi)
                )?,
                None => writeln!(f, "\n  {}  (no data)", o.column)?,
            }
            if o.rows.is_empty() {
                writeln!(f, "    No outliers OK")?;
            } else {
                writeln!(f, "    {} outlier(s):", o.rows.len())?;
                for (loc, v) in &o.rows {
                    let loc: String = loc.chars().take(50).collect();
                    writeln!(f, "      * {loc:50}  {:>14}", fmt_thousands(*v))?;
                }
            }
        }

        writeln!(f, "\n  BEDROOM SANITY\n  {rule}")?;
        writeln!(f, "  Unique values : {:?}", self.bedroom_values)?;
        writeln!(
            f,
            "  Out of 1-10   : {} rows {}",
            self.bedrooms_out_of_range,
            if self.bedrooms_out_of_range == 0 { "OK" } else { "WARN" }
        )?;

        writeln!(f, "\n  AFFORDABILITY RANK\n  {rule}")?;
        if let Some((lo, hi)) = self.rank_range {
            writeln!(f, "  Range  : {lo} to {hi}")?;
        }
        writeln!(f, "  Nulls  : {}", self.rank_nulls)?;
        writeln!(
            f,
            "  Dups   : {} {}",
            self.rank_duplicates,
            if self.rank_duplicates == 0 {
                "OK"
            } else {
                "WARN: ranks should be unique"
            }
        )?;
        write!(f, "{}", "=".repeat(62))
    }
}
