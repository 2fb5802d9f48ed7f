use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("country list is empty")]
    NoCountries,

    #[error("empty year range: first year {first} is after last year {last}")]
    EmptyYearRange { first: i32, last: i32 },

    #[error("country '{0}' is listed more than once")]
    DuplicateCountry(String),

    #[error("country name '{0}' is reserved for the rollup rows")]
    ReservedCountry(String),

    /// A listed country has no entry in one of the lookup tables.
    #[error("country '{country}' is missing from the {table} table")]
    MissingProfile { country: String, table: &'static str },

    /// A lookup table has an entry for a country that is not listed.
    #[error("the {table} table has an entry for unlisted country '{country}'")]
    UnlistedCountry { country: String, table: &'static str },

    #[error("invalid {field} for '{country}': {value}")]
    InvalidProfile {
        country: String,
        field: &'static str,
        value: f64,
    },

    #[error("column '{0}' not found in input")]
    MissingColumn(String),

    #[error("unexpected value in column '{column}' at row {row}")]
    UnexpectedValue { column: String, row: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
