//! Row types for the four output tables and their dataframe form.

use std::fmt;

use polars::prelude::*;

pub const COUNTRY: &str = "Country";
pub const YEAR: &str = "Year";
pub const EV_SALES: &str = "EV_Sales";
pub const VEHICLE_TYPE: &str = "Vehicle_Type";
pub const EV_STOCK: &str = "EV_Stock";
pub const MARKET_SHARE: &str = "Market_Share";
pub const TOTAL_VEHICLE_SALES: &str = "Total_Vehicle_Sales";
pub const PUBLIC_CHARGING_POINTS: &str = "Public_Charging_Points";
pub const FAST_CHARGERS: &str = "Fast_Chargers";
pub const SLOW_CHARGERS: &str = "Slow_Chargers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VehicleType {
    Bev,
    Phev,
    Total,
}

impl VehicleType {
    /// Ordered the way the rollup rows are emitted.
    pub const ALL: [VehicleType; 3] = [VehicleType::Bev, VehicleType::Phev, VehicleType::Total];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Bev => "BEV",
            VehicleType::Phev => "PHEV",
            VehicleType::Total => "Total",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub country: String,
    pub year: i32,
    pub ev_sales: i64,
    pub vehicle_type: VehicleType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub country: String,
    pub year: i32,
    pub ev_stock: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketShareRecord {
    pub country: String,
    pub year: i32,
    /// Percent, two decimals.
    pub market_share: f64,
    pub total_vehicle_sales: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargingRecord {
    pub country: String,
    pub year: i32,
    pub public_charging_points: i64,
    pub fast_chargers: i64,
    pub slow_chargers: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Sales,
    Stock,
    MarketShare,
    Charging,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Sales, Table::Stock, Table::MarketShare, Table::Charging];

    /// File name without extension, shared by the CSV and store files.
    pub fn stem(self) -> &'static str {
        match self {
            Table::Sales => "ev_sales",
            Table::Stock => "ev_stock",
            Table::MarketShare => "ev_market_share",
            Table::Charging => "ev_charging_stations",
        }
    }
}

/// Everything one generation run produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub sales: Vec<SalesRecord>,
    pub stock: Vec<StockRecord>,
    pub market_share: Vec<MarketShareRecord>,
    pub charging: Vec<ChargingRecord>,
}

impl Dataset {
    pub fn rows(&self, table: Table) -> usize {
        match table {
            Table::Sales => self.sales.len(),
            Table::Stock => self.stock.len(),
            Table::MarketShare => self.market_share.len(),
            Table::Charging => self.charging.len(),
        }
    }

    pub fn sales_of(&self, country: &str, year: i32, vehicle_type: VehicleType) -> Option<i64> {
        self.sales
            .iter()
            .find(|r| r.country == country && r.year == year && r.vehicle_type == vehicle_type)
            .map(|r| r.ev_sales)
    }

    pub fn frame(&self, table: Table) -> PolarsResult<DataFrame> {
        match table {
            Table::Sales => df!(
                COUNTRY => self.sales.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
                YEAR => self.sales.iter().map(|r| r.year).collect::<Vec<_>>(),
                EV_SALES => self.sales.iter().map(|r| r.ev_sales).collect::<Vec<_>>(),
                VEHICLE_TYPE => self.sales.iter().map(|r| r.vehicle_type.as_str()).collect::<Vec<_>>()
            ),
            Table::Stock => df!(
                COUNTRY => self.stock.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
                YEAR => self.stock.iter().map(|r| r.year).collect::<Vec<_>>(),
                EV_STOCK => self.stock.iter().map(|r| r.ev_stock).collect::<Vec<_>>()
            ),
            Table::MarketShare => df!(
                COUNTRY => self.market_share.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
                YEAR => self.market_share.iter().map(|r| r.year).collect::<Vec<_>>(),
                MARKET_SHARE => self.market_share.iter().map(|r| r.market_share).collect::<Vec<_>>(),
                TOTAL_VEHICLE_SALES => self.market_share.iter().map(|r| r.total_vehicle_sales).collect::<Vec<_>>()
            ),
            Table::Charging => df!(
                COUNTRY => self.charging.iter().map(|r| r.country.as_str()).collect::<Vec<_>>(),
                YEAR => self.charging.iter().map(|r| r.year).collect::<Vec<_>>(),
                PUBLIC_CHARGING_POINTS => self.charging.iter().map(|r| r.public_charging_points).collect::<Vec<_>>(),
                FAST_CHARGERS => self.charging.iter().map(|r| r.fast_chargers).collect::<Vec<_>>(),
                SLOW_CHARGERS => self.charging.iter().map(|r| r.slow_chargers).collect::<Vec<_>>()
            ),
        }
    }
}
