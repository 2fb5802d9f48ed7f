//! Columnar store for a generated dataset.
//!
//! A store is a directory with one Parquet file per table and a
//! `manifest.json` recording the generator config and row counts. Views are
//! lazy queries over the tables; all of them leave out the `World` rollup rows.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{GeneratorConfig, WORLD};
use crate::error::Result;
use crate::frame::i64_at;
use crate::records::{
    Dataset, Table, VehicleType, COUNTRY, EV_SALES, FAST_CHARGERS, PUBLIC_CHARGING_POINTS,
    SLOW_CHARGERS, VEHICLE_TYPE, YEAR,
};

pub const MANIFEST_FILE: &str = "manifest.json";

pub const TOTAL_SALES: &str = "Total_Sales";
pub const BEV_SALES: &str = "BEV_Sales";
pub const PHEV_SALES: &str = "PHEV_Sales";
pub const PERCENTAGE: &str = "Percentage";
pub const GROWTH_PERCENTAGE: &str = "Growth_Percentage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub config: GeneratorConfig,
    /// Row count per table file stem.
    pub tables: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub countries: i64,
    pub years: i64,
}

#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
    manifest: Manifest,
}

impl Store {
    /// Writes `dataset` into `dir`, replacing any tables already there.
    pub fn create(dir: impl AsRef<Path>, config: &GeneratorConfig, dataset: &Dataset) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut tables = BTreeMap::new();
        for table in Table::ALL {
            let mut df = dataset.frame(table)?;
            let path = table_path(&dir, table);
            let mut file = File::create(&path)?;
            ParquetWriter::new(&mut file).finish(&mut df)?;
            debug!("stored {} rows in {}", df.height(), path.display());
            tables.insert(table.stem().to_string(), df.height());
        }

        let manifest = Manifest {
            config: config.clone(),
            tables,
        };
        let mut writer = BufWriter::new(File::create(dir.join(MANIFEST_FILE))?);
        serde_json::to_writer_pretty(&mut writer, &manifest)?;
        writer.flush()?;

        info!("created store at {}", dir.display());
        Ok(Self { dir, manifest })
    }

    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let reader = BufReader::new(File::open(dir.join(MANIFEST_FILE))?);
        let manifest: Manifest = serde_json::from_reader(reader)?;
        info!("opened store at {}", dir.display());
        Ok(Self { dir, manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn first_year(&self) -> i32 {
        self.manifest.config.first_year
    }

    pub fn last_year(&self) -> i32 {
        self.manifest.config.last_year
    }

    pub fn table(&self, table: Table) -> Result<DataFrame> {
        let file = File::open(table_path(&self.dir, table))?;
        Ok(ParquetReader::new(file).finish()?)
    }

    fn countries_only(&self, table: Table) -> Result<LazyFrame> {
        Ok(self.table(table)?.lazy().filter(col(COUNTRY).neq(lit(WORLD))))
    }

    /// Distinct countries and years in the sales table.
    pub fn summary(&self) -> Result<Summary> {
        let df = self
            .countries_only(Table::Sales)?
            .select([
                col(COUNTRY).n_unique().alias("countries"),
                col(YEAR).n_unique().alias("years"),
            ])
            .collect()?;
        Ok(Summary {
            countries: i64_at(&df, "countries", 0)?,
            years: i64_at(&df, "years", 0)?,
        })
    }

    /// Year, Total_Sales, BEV_Sales, PHEV_Sales ordered by year.
    pub fn sales_by_year(&self) -> Result<DataFrame> {
        let sum_of = |vehicle_type: VehicleType, name: &str| {
            when(col(VEHICLE_TYPE).eq(lit(vehicle_type.as_str())))
                .then(col(EV_SALES))
                .otherwise(lit(0i64))
                .sum()
                .alias(name)
        };

        Ok(self
            .countries_only(Table::Sales)?
            .group_by([col(YEAR)])
            .agg([
                sum_of(VehicleType::Total, TOTAL_SALES),
                sum_of(VehicleType::Bev, BEV_SALES),
                sum_of(VehicleType::Phev, PHEV_SALES),
            ])
            .sort([YEAR], SortMultipleOptions::default())
            .collect()?)
    }

    /// The `limit` countries with the highest total sales in `year`, with
    /// their percentage of that year's total across all countries.
    pub fn top_countries(&self, year: i32, limit: usize) -> Result<DataFrame> {
        let sales = col(EV_SALES).cast(DataType::Float64);
        Ok(self
            .countries_only(Table::Sales)?
            .filter(
                col(YEAR)
                    .eq(lit(year))
                    .and(col(VEHICLE_TYPE).eq(lit(VehicleType::Total.as_str()))),
            )
            .select([
                col(COUNTRY),
                col(EV_SALES),
                (sales.clone() * lit(100.0) / sales.sum())
                    .round(2)
                    .alias(PERCENTAGE),
            ])
            .sort(
                [EV_SALES],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(limit as IdxSize)
            .collect()?)
    }

    /// Growth in total sales between two years per country. Countries
    /// without sales in either year are left out.
    pub fn country_growth(&self, first: i32, last: i32) -> Result<DataFrame> {
        let first_col = format!("Sales_{first}");
        let last_col = format!("Sales_{last}");
        let sales_in = |year: i32, name: &str| {
            col(EV_SALES)
                .filter(col(YEAR).eq(lit(year)))
                .first()
                .alias(name)
        };

        let growth = (col(last_col.as_str()).cast(DataType::Float64)
            / col(first_col.as_str()).cast(DataType::Float64)
            - lit(1.0))
        .round(2)
            * lit(100.0);

        Ok(self
            .countries_only(Table::Sales)?
            .filter(col(VEHICLE_TYPE).eq(lit(VehicleType::Total.as_str())))
            .group_by_stable([col(COUNTRY)])
            .agg([
                sales_in(first, first_col.as_str()),
                sales_in(last, last_col.as_str()),
            ])
            .filter(
                col(first_col.as_str())
                    .gt(lit(0i64))
                    .and(col(last_col.as_str()).is_not_null()),
            )
            .with_column(growth.alias(GROWTH_PERCENTAGE))
            .sort(
                [GROWTH_PERCENTAGE],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?)
    }

    /// Charging infrastructure summed across countries, per year.
    pub fn charging_by_year(&self) -> Result<DataFrame> {
        Ok(self
            .countries_only(Table::Charging)?
            .group_by([col(YEAR)])
            .agg([
                col(PUBLIC_CHARGING_POINTS).sum(),
                col(FAST_CHARGERS).sum(),
                col(SLOW_CHARGERS).sum(),
            ])
            .sort([YEAR], SortMultipleOptions::default())
            .collect()?)
    }
}

fn table_path(dir: &Path, table: Table) -> PathBuf {
    dir.join(format!("{}.parquet", table.stem()))
}
