//! Reports over an externally supplied IEA-style dataset.
//!
//! The input is a long-format CSV with one measurement per row:
//! `region_country, parameter, category, year, mode, powertrain, value`.
//! Only `Historical` rows are considered.

use std::io::Write;
use std::path::Path;

use log::info;
use polars::prelude::*;

use crate::error::{Error, Result};
use crate::export::read_csv;
use crate::frame::write_table;

pub const REGION: &str = "region_country";
pub const PARAMETER: &str = "parameter";
pub const CATEGORY: &str = "category";
pub const IEA_YEAR: &str = "year";
pub const MODE: &str = "mode";
pub const POWERTRAIN: &str = "powertrain";
pub const VALUE: &str = "value";

const COLUMNS: [&str; 7] = [REGION, PARAMETER, CATEGORY, IEA_YEAR, MODE, POWERTRAIN, VALUE];

/// Regions that are sums of other rows.
pub const AGGREGATE_REGIONS: [&str; 6] = [
    "World",
    "Europe",
    "EU27",
    "North America",
    "Asia Pacific",
    "Rest of world",
];

const EV_SALES: &str = "EV sales";
const EV_STOCK: &str = "EV stock";
const EV_SALES_SHARE: &str = "EV sales share";
const CARS: &str = "Cars";

fn descending() -> SortMultipleOptions {
    SortMultipleOptions::default()
        .with_order_descending(true)
        .with_maintain_order(true)
}

fn countries_only() -> Expr {
    AGGREGATE_REGIONS
        .iter()
        .fold(lit(true), |keep, region| keep.and(col(REGION).neq(lit(*region))))
}

fn bev_or_phev() -> Expr {
    col(POWERTRAIN)
        .eq(lit("BEV"))
        .or(col(POWERTRAIN).eq(lit("PHEV")))
}

#[derive(Debug, Clone)]
pub struct IeaDataset {
    df: DataFrame,
}

impl IeaDataset {
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dataset = Self::from_frame(read_csv(path)?)?;
        info!("loaded {} rows from {}", dataset.df.height(), path.display());
        Ok(dataset)
    }

    /// Checks the schema and normalises the year and value column types.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        for column in COLUMNS {
            if df.get_column_index(column).is_none() {
                return Err(Error::MissingColumn(column.to_string()));
            }
        }

        let df = df
            .lazy()
            .with_columns([
                col(IEA_YEAR).cast(DataType::Int32),
                col(VALUE).cast(DataType::Float64),
            ])
            .collect()?;
        Ok(Self { df })
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    fn historical(&self, parameter: &str) -> LazyFrame {
        self.df.clone().lazy().filter(
            col(CATEGORY)
                .eq(lit("Historical"))
                .and(col(PARAMETER).eq(lit(parameter))),
        )
    }

    /// Country, Vehicle_Type, Powertrain, Sales for one year, largest first.
    pub fn sales_by_country_type(&self, year: i32, limit: usize) -> Result<DataFrame> {
        Ok(self
            .historical(EV_SALES)
            .filter(
                col(IEA_YEAR)
                    .eq(lit(year))
                    .and(countries_only())
                    .and(col(VALUE).gt(lit(0.0))),
            )
            .group_by_stable([col(REGION), col(MODE), col(POWERTRAIN)])
            .agg([col(VALUE).sum().alias("Sales")])
            .select([
                col(REGION).alias("Country"),
                col(MODE).alias("Vehicle_Type"),
                col(POWERTRAIN).alias("Powertrain"),
                col("Sales"),
            ])
            .sort(["Sales"], descending())
            .limit(limit as IdxSize)
            .collect()?)
    }

    /// Car stock in `year` against the year before; the difference is
    /// reported as New_Production.
    pub fn stock_change(&self, year: i32, limit: usize) -> Result<DataFrame> {
        let current = format!("Stock_{year}");
        let previous = format!("Stock_{}", year - 1);
        let stock_in = |y: i32, name: &str| {
            when(col(IEA_YEAR).eq(lit(y)))
                .then(col(VALUE))
                .otherwise(lit(0.0))
                .sum()
                .alias(name)
        };

        Ok(self
            .historical(EV_STOCK)
            .filter(
                col(IEA_YEAR)
                    .eq(lit(year))
                    .or(col(IEA_YEAR).eq(lit(year - 1)))
                    .and(col(MODE).eq(lit(CARS)))
                    .and(countries_only())
                    .and(bev_or_phev()),
            )
            .group_by_stable([col(REGION)])
            .agg([
                stock_in(year, current.as_str()),
                stock_in(year - 1, previous.as_str()),
            ])
            .filter(col(current.as_str()).gt(lit(0.0)))
            .select([
                col(REGION).alias("Country"),
                col(current.as_str()),
                col(previous.as_str()),
                (col(current.as_str()) - col(previous.as_str())).alias("New_Production"),
            ])
            .sort(["New_Production"], descending())
            .limit(limit as IdxSize)
            .collect()?)
    }

    /// Mean car sales share per country since `since`, for countries with at
    /// least `min_years` distinct years of data.
    pub fn average_market_share(&self, since: i32, min_years: u32, limit: usize) -> Result<DataFrame> {
        Ok(self
            .historical(EV_SALES_SHARE)
            .filter(
                col(MODE)
                    .eq(lit(CARS))
                    .and(countries_only())
                    .and(col(IEA_YEAR).gt_eq(lit(since))),
            )
            .group_by_stable([col(REGION)])
            .agg([
                col(VALUE).mean().round(2).alias("Avg_Market_Share_Pct"),
                col(IEA_YEAR).n_unique().cast(DataType::Int64).alias("Years_Data"),
            ])
            .filter(col("Years_Data").gt_eq(lit(i64::from(min_years))))
            .select([
                col(REGION).alias("Country"),
                col("Avg_Market_Share_Pct"),
                col("Years_Data"),
            ])
            .sort(["Avg_Market_Share_Pct"], descending())
            .limit(limit as IdxSize)
            .collect()?)
    }

    /// World car sales split by powertrain, per year since `since`.
    pub fn global_trends(&self, since: i32) -> Result<DataFrame> {
        let sum_of = |powertrain: &str, name: &str| {
            when(col(POWERTRAIN).eq(lit(powertrain)))
                .then(col(VALUE))
                .otherwise(lit(0.0))
                .sum()
                .alias(name)
        };

        Ok(self
            .historical(EV_SALES)
            .filter(
                col(MODE)
                    .eq(lit(CARS))
                    .and(col(REGION).eq(lit("World")))
                    .and(bev_or_phev())
                    .and(col(IEA_YEAR).gt_eq(lit(since))),
            )
            .group_by([col(IEA_YEAR)])
            .agg([
                sum_of("BEV", "BEV_Sales"),
                sum_of("PHEV", "PHEV_Sales"),
                col(VALUE).sum().alias("Total_Sales"),
            ])
            .sort([IEA_YEAR], SortMultipleOptions::default())
            .select([
                col(IEA_YEAR).alias("Year"),
                col("BEV_Sales"),
                col("PHEV_Sales"),
                col("Total_Sales"),
            ])
            .collect()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IeaReportOptions {
    pub year: i32,
    /// First year of the trend and average-share sections.
    pub since: i32,
}

impl Default for IeaReportOptions {
    fn default() -> Self {
        Self { year: 2024, since: 2020 }
    }
}

pub fn write_iea_report(dataset: &IeaDataset, options: &IeaReportOptions, out: &mut impl Write) -> Result<()> {
    let year = options.year;
    writeln!(out, "EV Data Report")?;
    writeln!(out, "{}", "=".repeat(60))?;

    writeln!(out, "\n## Sales by Country and Type ({year})")?;
    writeln!(out, "{}", "-".repeat(40))?;
    write_table(out, &dataset.sales_by_country_type(year, 20)?)?;

    writeln!(out, "\n\n## Production Estimate by Country ({year} vs {})", year - 1)?;
    writeln!(out, "{}", "-".repeat(40))?;
    write_table(out, &dataset.stock_change(year, 10)?)?;

    writeln!(out, "\n\n## Average Market Share by Country ({}-{year})", options.since)?;
    writeln!(out, "{}", "-".repeat(40))?;
    write_table(out, &dataset.average_market_share(options.since, 3, 15)?)?;

    writeln!(out, "\n\n## Global Trends ({}-{year})", options.since)?;
    writeln!(out, "{}", "-".repeat(40))?;
    write_table(out, &dataset.global_trends(options.since)?)?;

    writeln!(out, "\n\nProduction is estimated from year-over-year stock changes.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{f64_at, i64_at, str_at};

    const FIXTURE: &str = "\
region_country,parameter,category,year,mode,powertrain,value
World,EV sales,Historical,2023,Cars,BEV,9500000
World,EV sales,Historical,2023,Cars,PHEV,4300000
World,EV sales,Historical,2024,Cars,BEV,10800000
World,EV sales,Historical,2024,Cars,PHEV,6400000
World,EV sales,Projection-STEPS,2025,Cars,BEV,12000000
China,EV sales,Historical,2024,Cars,BEV,6400000
China,EV sales,Historical,2024,Cars,PHEV,4900000
China,EV sales,Historical,2024,Buses,BEV,50000
Norway,EV sales,Historical,2024,Cars,BEV,114000
Norway,EV sales,Historical,2024,Cars,PHEV,0
Europe,EV sales,Historical,2024,Cars,BEV,2000000
China,EV stock,Historical,2023,Cars,BEV,16000000
China,EV stock,Historical,2023,Cars,PHEV,5000000
China,EV stock,Historical,2024,Cars,BEV,22000000
China,EV stock,Historical,2024,Cars,PHEV,9000000
Norway,EV stock,Historical,2023,Cars,BEV,700000
Norway,EV stock,Historical,2024,Cars,BEV,800000
Norway,EV sales share,Historical,2020,Cars,EV,75
Norway,EV sales share,Historical,2021,Cars,EV,86
Norway,EV sales share,Historical,2022,Cars,EV,88
China,EV sales share,Historical,2023,Cars,EV,38
China,EV sales share,Historical,2024,Cars,EV,48
Norway,EV sales share,Historical,2019,Cars,EV,56
";

    fn fixture() -> IeaDataset {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev_data.csv");
        std::fs::write(&path, FIXTURE).unwrap();
        IeaDataset::from_csv(&path).unwrap()
    }

    #[test]
    fn rejects_missing_columns() {
        let df = df!("region_country" => ["China"], "year" => [2024i64]).unwrap();
        assert!(matches!(IeaDataset::from_frame(df), Err(Error::MissingColumn(c)) if c == "parameter"));
    }

    #[test]
    fn sales_by_country_excludes_regions_and_zeroes() {
        let sales = fixture().sales_by_country_type(2024, 20).unwrap();
        assert_eq!(sales.height(), 4);
        assert_eq!(str_at(&sales, "Country", 0).unwrap(), "China");
        assert_eq!(str_at(&sales, "Powertrain", 0).unwrap(), "BEV");
        assert_eq!(f64_at(&sales, "Sales", 0).unwrap(), 6_400_000.0);
        assert_eq!(str_at(&sales, "Vehicle_Type", 3).unwrap(), "Buses");

        assert_eq!(fixture().sales_by_country_type(2024, 2).unwrap().height(), 2);
    }

    #[test]
    fn stock_change_between_years() {
        let change = fixture().stock_change(2024, 10).unwrap();
        assert_eq!(change.height(), 2);
        assert_eq!(str_at(&change, "Country", 0).unwrap(), "China");
        assert_eq!(f64_at(&change, "Stock_2024", 0).unwrap(), 31_000_000.0);
        assert_eq!(f64_at(&change, "Stock_2023", 0).unwrap(), 21_000_000.0);
        assert_eq!(f64_at(&change, "New_Production", 0).unwrap(), 10_000_000.0);
        assert_eq!(f64_at(&change, "New_Production", 1).unwrap(), 100_000.0);
    }

    #[test]
    fn average_share_needs_enough_years() {
        let share = fixture().average_market_share(2020, 3, 15).unwrap();
        assert_eq!(share.height(), 1);
        assert_eq!(str_at(&share, "Country", 0).unwrap(), "Norway");
        assert_eq!(f64_at(&share, "Avg_Market_Share_Pct", 0).unwrap(), 83.0);
        assert_eq!(i64_at(&share, "Years_Data", 0).unwrap(), 3);

        assert_eq!(fixture().average_market_share(2020, 2, 15).unwrap().height(), 2);
    }

    #[test]
    fn global_trends_use_world_rows() {
        let trends = fixture().global_trends(2020).unwrap();
        assert_eq!(trends.height(), 2);
        assert_eq!(i64_at(&trends, "Year", 0).unwrap(), 2023);
        assert_eq!(f64_at(&trends, "Total_Sales", 0).unwrap(), 13_800_000.0);
        assert_eq!(f64_at(&trends, "BEV_Sales", 1).unwrap(), 10_800_000.0);
        assert_eq!(f64_at(&trends, "PHEV_Sales", 1).unwrap(), 6_400_000.0);
    }

    #[test]
    fn report_renders() {
        let mut out = Vec::new();
        write_iea_report(&fixture(), &IeaReportOptions::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("EV Data Report\n"));
        assert!(text.contains("## Global Trends (2020-2024)"));
        assert!(text.contains("Norway"));
    }
}
