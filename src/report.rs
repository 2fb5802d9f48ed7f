//! Text report over a generated store.

use std::io::Write;

use log::warn;

use crate::error::Result;
use crate::frame::{f64_at, group_thousands, i64_at, str_at, write_table};
use crate::records::{COUNTRY, EV_SALES, YEAR};
use crate::store::{Store, PERCENTAGE, TOTAL_SALES};

const RECENT_YEARS: usize = 3;
const HIGHLIGHTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Year ranked by the top-countries view; the store's last year if unset.
    pub year: Option<i32>,
    pub top: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { year: None, top: 10 }
    }
}

/// Summary counts, the latest yearly totals and the leading countries.
pub fn write_highlights(store: &Store, options: &ReportOptions, out: &mut impl Write) -> Result<()> {
    let summary = store.summary()?;
    writeln!(out, "=== Database Summary ===")?;
    writeln!(out, "Countries: {}, Years: {}", summary.countries, summary.years)?;

    let by_year = store.sales_by_year()?;
    writeln!(out, "\nRecent global sales:")?;
    for row in (0..by_year.height()).rev().take(RECENT_YEARS) {
        writeln!(
            out,
            "  {}: {} vehicles",
            i64_at(&by_year, YEAR, row)?,
            group_thousands(i64_at(&by_year, TOTAL_SALES, row)?)
        )?;
    }

    let year = options.year.unwrap_or_else(|| store.last_year());
    let top = store.top_countries(year, options.top)?;
    if top.height() == 0 {
        warn!("no sales recorded for {year}");
    }
    writeln!(out, "\nTop {} countries in {year}:", HIGHLIGHTS.min(top.height()))?;
    for row in 0..top.height().min(HIGHLIGHTS) {
        writeln!(
            out,
            "  {}: {} vehicles ({}%)",
            str_at(&top, COUNTRY, row)?,
            group_thousands(i64_at(&top, EV_SALES, row)?),
            f64_at(&top, PERCENTAGE, row)?
        )?;
    }

    Ok(())
}

/// Highlights followed by every view as a table.
pub fn write_store_report(store: &Store, options: &ReportOptions, out: &mut impl Write) -> Result<()> {
    write_highlights(store, options, out)?;

    writeln!(out, "\n## Sales by Year")?;
    write_table(out, &store.sales_by_year()?)?;

    let year = options.year.unwrap_or_else(|| store.last_year());
    writeln!(out, "\n## Top {} Countries ({year})", options.top)?;
    write_table(out, &store.top_countries(year, options.top)?)?;

    writeln!(out, "\n## Growth {}-{}", store.first_year(), store.last_year())?;
    write_table(out, &store.country_growth(store.first_year(), store.last_year())?)?;

    writeln!(out, "\n## Public Charging Infrastructure")?;
    write_table(out, &store.charging_by_year()?)?;

    Ok(())
}
