// src/schema.rs

//! The listings dataset schema: eight named columns, each with a
//! human-readable meaning and a declared type. Every file the pipeline
//! writes and every row the API serves carries at least these columns.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Declared type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Enumerated,
    Integer,
    Float,
    DelimitedList,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Enumerated => "enumerated/text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "floating-point",
            ColumnType::DelimitedList => "text (possibly delimited list)",
            ColumnType::Date => "calendar date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub description: &'static str,
    pub column_type: ColumnType,
}

pub const LISTING_SCHEMA: [ColumnDef; 8] = [
    ColumnDef {
        name: "location",
        description: "Neighbourhood or area of the property",
        column_type: ColumnType::Text,
    },
    ColumnDef {
        name: "property_type",
        description: "Kind of property (apartment, house, villa, ...)",
        column_type: ColumnType::Enumerated,
    },
    ColumnDef {
        name: "bedrooms",
        description: "Number of bedrooms",
        column_type: ColumnType::Integer,
    },
    ColumnDef {
        name: "bathrooms",
        description: "Number of bathrooms",
        column_type: ColumnType::Integer,
    },
    ColumnDef {
        name: "size",
        description: "Floor area in square metres",
        column_type: ColumnType::Float,
    },
    ColumnDef {
        name: "amenities",
        description: "Features offered with the property",
        column_type: ColumnType::DelimitedList,
    },
    ColumnDef {
        name: "price_kes",
        description: "Asking price in Kenyan Shillings",
        column_type: ColumnType::Float,
    },
    ColumnDef {
        name: "listing_date",
        description: "Date the listing was observed",
        column_type: ColumnType::Date,
    },
];

pub const EXPECTED_COLUMN_COUNT: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected {expected} columns, found {found}")]
    WrongColumnCount { expected: usize, found: usize },
    #[error("column {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("header is missing column '{0}'")]
    MissingColumn(String),
}

pub fn columns() -> &'static [ColumnDef] {
    &LISTING_SCHEMA
}

pub fn column(name: &str) -> Option<&'static ColumnDef> {
    LISTING_SCHEMA.iter().find(|c| c.name == name)
}

/// Checks the table shape: exactly eight rows, no empty cells, unique names.
pub fn validate_schema(cols: &[ColumnDef]) -> Result<(), SchemaError> {
    if cols.len() != EXPECTED_COLUMN_COUNT {
        return Err(SchemaError::WrongColumnCount {
            expected: EXPECTED_COLUMN_COUNT,
            found: cols.len(),
        });
    }

    let mut seen = HashSet::new();
    for (index, col) in cols.iter().enumerate() {
        if col.name.trim().is_empty() {
            return Err(SchemaError::EmptyField { index, field: "name" });
        }
        if col.description.trim().is_empty() {
            return Err(SchemaError::EmptyField {
                index,
                field: "description",
            });
        }
        if col.column_type.as_str().is_empty() {
            return Err(SchemaError::EmptyField { index, field: "type" });
        }
        if !seen.insert(col.name) {
            return Err(SchemaError::DuplicateColumn(col.name.to_string()));
        }
    }

    Ok(())
}

/// Verifies a dataset header carries every schema column. Extra columns
/// and any ordering are accepted.
pub fn check_header<S: AsRef<str>>(header: &[S]) -> Result<(), SchemaError> {
    let present: HashSet<&str> = header.iter().map(|h| h.as_ref().trim()).collect();
    match LISTING_SCHEMA.iter().find(|c| !present.contains(c.name)) {
        Some(missing) => Err(SchemaError::MissingColumn(missing.name.to_string())),
        None => Ok(()),
    }
}

pub fn to_markdown(cols: &[ColumnDef]) -> String {
    let mut out = String::from("| Field | Description | Type |\n|---|---|---|\n");
    for c in cols {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            c.name, c.description, c.column_type
        ));
    }
    out
}
