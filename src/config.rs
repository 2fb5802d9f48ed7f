//! Generator configuration: which countries and years to produce, and the
//! per-country base-sales and growth tables that drive the series.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the pseudo-country carrying the summed sales rows.
pub const WORLD: &str = "World";

pub const DEFAULT_FIRST_YEAR: i32 = 2015;
pub const DEFAULT_LAST_YEAR: i32 = 2024;

// (country, 2015 sales in thousands, annual growth multiplier)
const DEFAULT_PROFILES: &[(&str, f64, f64)] = &[
    ("China", 188.7, 1.45),
    ("United States", 115.2, 1.35),
    ("Germany", 23.5, 1.40),
    ("France", 17.3, 1.38),
    ("United Kingdom", 14.1, 1.42),
    ("Norway", 25.8, 1.25),
    ("Netherlands", 9.4, 1.35),
    ("Sweden", 7.9, 1.38),
    ("Canada", 5.2, 1.30),
    ("Japan", 10.5, 1.20),
    ("South Korea", 2.9, 1.50),
    ("India", 0.5, 1.60),
    ("Italy", 2.3, 1.35),
    ("Spain", 1.5, 1.40),
    ("Australia", 0.7, 1.35),
    ("Brazil", 0.3, 1.45),
    ("Mexico", 0.2, 1.50),
    ("Denmark", 4.5, 1.33),
    ("Belgium", 3.2, 1.36),
    ("Switzerland", 3.8, 1.34),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub countries: Vec<String>,
    pub first_year: i32,
    pub last_year: i32,
    /// First-year sales in thousands of units.
    pub base_sales: BTreeMap<String, f64>,
    pub growth_rates: BTreeMap<String, f64>,
    /// Mixed into every jitter key; 0 reproduces the stock dataset.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let mut base_sales = BTreeMap::new();
        let mut growth_rates = BTreeMap::new();
        for &(country, base, growth) in DEFAULT_PROFILES {
            base_sales.insert(country.to_string(), base);
            growth_rates.insert(country.to_string(), growth);
        }

        Self {
            countries: DEFAULT_PROFILES
                .iter()
                .map(|(country, _, _)| country.to_string())
                .collect(),
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            base_sales,
            growth_rates,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Reads a JSON config. Fields left out keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    /// Checks the tables against the country list and returns one profile per
    /// country, in list order.
    pub fn profiles(&self) -> Result<Vec<CountryProfile>> {
        if self.countries.is_empty() {
            return Err(Error::NoCountries);
        }
        if self.first_year > self.last_year {
            return Err(Error::EmptyYearRange {
                first: self.first_year,
                last: self.last_year,
            });
        }

        let mut seen = HashSet::new();
        for country in &self.countries {
            if country == WORLD {
                return Err(Error::ReservedCountry(country.clone()));
            }
            if !seen.insert(country.as_str()) {
                return Err(Error::DuplicateCountry(country.clone()));
            }
        }

        for (table, entries) in [("base sales", &self.base_sales), ("growth rate", &self.growth_rates)] {
            if let Some(country) = entries.keys().find(|c| !seen.contains(c.as_str())) {
                return Err(Error::UnlistedCountry {
                    country: country.clone(),
                    table,
                });
            }
        }

        self.countries
            .iter()
            .map(|country| {
                let base_sales = lookup(&self.base_sales, country, "base sales")?;
                let growth_rate = lookup(&self.growth_rates, country, "growth rate")?;
                CountryProfile::new(country, base_sales, growth_rate)
            })
            .collect()
    }
}

fn lookup(table: &BTreeMap<String, f64>, country: &str, name: &'static str) -> Result<f64> {
    table.get(country).copied().ok_or_else(|| Error::MissingProfile {
        country: country.to_string(),
        table: name,
    })
}

/// Static inputs for one country's series.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryProfile {
    pub country: String,
    pub base_sales: f64,
    pub growth_rate: f64,
}

impl CountryProfile {
    pub fn new(country: &str, base_sales: f64, growth_rate: f64) -> Result<Self> {
        for (field, value) in [("base sales", base_sales), ("growth rate", growth_rate)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidProfile {
                    country: country.to_string(),
                    field,
                    value,
                });
            }
        }
        Ok(Self {
            country: country.to_string(),
            base_sales,
            growth_rate,
        })
    }

    /// Un-jittered sales, in thousands, `years_elapsed` years after the first.
    pub fn raw_sales(&self, years_elapsed: i32) -> f64 {
        self.base_sales * self.growth_rate.powi(years_elapsed)
    }
}
