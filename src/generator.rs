//! Synthetic series generation.
//!
//! Each country is an independent fold over the year range: the only carried
//! state is the fleet stock and the public charging point count, both of which
//! are recurrences on the previous year. Rows are emitted year-major, countries
//! in configured order, followed by the `World` sales rollup.

use std::collections::BTreeMap;

use log::debug;

use crate::config::{CountryProfile, GeneratorConfig, WORLD};
use crate::error::Result;
use crate::jitter::Jitter;
use crate::records::{
    ChargingRecord, Dataset, MarketShareRecord, SalesRecord, StockRecord, VehicleType,
};

/// Share of last year's fleet still on the road.
pub const RETENTION_FACTOR: f64 = 0.95;
pub const CHARGING_GROWTH: f64 = 1.25;
/// New public charging points per thousand EVs sold.
pub const CHARGING_POINTS_PER_KILO_SALE: f64 = 10.0;
pub const INITIAL_CHARGING_POINTS: f64 = 100.0;
pub const FAST_CHARGER_SHARE: f64 = 0.25;

/// Year the BEV share of EV sales starts its ramp from, whatever the
/// configured range.
pub const BEV_RATIO_BASE_YEAR: i32 = 2015;
const BEV_RATIO_START: f64 = 0.6;
const BEV_RATIO_SLOPE: f64 = 0.03;

/// Market-share ramp family a country belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTier {
    Norway,
    China,
    HighAdoption,
    Default,
}

impl ShareTier {
    pub fn for_country(country: &str) -> Self {
        match country {
            "Norway" => ShareTier::Norway,
            "China" => ShareTier::China,
            "Netherlands" | "Sweden" | "Denmark" => ShareTier::HighAdoption,
            _ => ShareTier::Default,
        }
    }

    // (start, slope per year, cap), all in percent
    fn ramp(self) -> (f64, f64, f64) {
        match self {
            ShareTier::Norway => (10.0, 8.0, 92.0),
            ShareTier::China => (1.5, 5.0, 50.0),
            ShareTier::HighAdoption => (2.0, 4.0, 45.0),
            ShareTier::Default => (0.5, 2.5, 35.0),
        }
    }

    pub fn cap(self) -> f64 {
        self.ramp().2
    }

    pub fn share(self, years_elapsed: i32) -> f64 {
        let (start, slope, cap) = self.ramp();
        (start + slope * f64::from(years_elapsed)).min(cap)
    }
}

/// BEV share of `year`'s EV sales, clamped to [0, 1].
pub fn bev_ratio(year: i32) -> f64 {
    let elapsed = f64::from(year) - f64::from(BEV_RATIO_BASE_YEAR);
    (BEV_RATIO_START + BEV_RATIO_SLOPE * elapsed).clamp(0.0, 1.0)
}

/// Size of the whole new-vehicle market implied by EV unit sales and their
/// share in percent. A zero share yields 0.
pub fn total_vehicle_sales(ev_units: f64, market_share: f64) -> i64 {
    if market_share > 0.0 {
        (ev_units * 100.0 / market_share).round() as i64
    } else {
        0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-country accumulators carried from one year to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryState {
    /// Fleet stock in thousands of vehicles.
    pub stock: f64,
    pub charging_points: f64,
}

impl Default for CountryState {
    fn default() -> Self {
        Self {
            stock: 0.0,
            charging_points: INITIAL_CHARGING_POINTS,
        }
    }
}

impl CountryState {
    /// State after a year with `sales` thousand EVs sold.
    pub fn advance(self, sales: f64) -> Self {
        Self {
            stock: self.stock * RETENTION_FACTOR + sales,
            charging_points: self.charging_points * CHARGING_GROWTH
                + sales * CHARGING_POINTS_PER_KILO_SALE,
        }
    }
}

/// One country-year of the series, before unit conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearPoint {
    pub year: i32,
    /// Jittered sales in thousands.
    pub sales: f64,
    /// Percent, unrounded.
    pub market_share: f64,
    /// Accumulators after this year's sales.
    pub state: CountryState,
}

#[derive(Debug, Clone)]
pub struct Generator {
    profiles: Vec<CountryProfile>,
    first_year: i32,
    last_year: i32,
    jitter: Jitter,
}

impl Generator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            profiles: config.profiles()?,
            first_year: config.first_year,
            last_year: config.last_year,
            jitter: Jitter::new(config.seed),
        })
    }

    pub fn profiles(&self) -> &[CountryProfile] {
        &self.profiles
    }

    /// Computes one year from the previous year's state.
    pub fn step(&self, profile: &CountryProfile, year: i32, previous: CountryState) -> YearPoint {
        let elapsed = year - self.first_year;
        let sales = profile.raw_sales(elapsed) * self.jitter.factor(&profile.country, year);
        YearPoint {
            year,
            sales,
            market_share: ShareTier::for_country(&profile.country).share(elapsed),
            state: previous.advance(sales),
        }
    }

    /// The full year series for one country, folding the state forward.
    pub fn trajectory(&self, profile: &CountryProfile) -> Vec<YearPoint> {
        (self.first_year..=self.last_year)
            .scan(CountryState::default(), |state, year| {
                let point = self.step(profile, year, *state);
                *state = point.state;
                Some(point)
            })
            .collect()
    }

    pub fn run(&self) -> Dataset {
        let trajectories: Vec<Vec<YearPoint>> = self
            .profiles
            .iter()
            .map(|profile| {
                let points = self.trajectory(profile);
                debug!("generated {} years for {}", points.len(), profile.country);
                points
            })
            .collect();

        let mut dataset = Dataset::default();
        let years = trajectories.first().map_or(0, Vec::len);
        for index in 0..years {
            for (profile, points) in self.profiles.iter().zip(&trajectories) {
                self.emit(&profile.country, &points[index], &mut dataset);
            }
        }

        append_world_rollup(&mut dataset.sales);
        dataset
    }

    fn emit(&self, country: &str, point: &YearPoint, dataset: &mut Dataset) {
        let year = point.year;
        let units = point.sales * 1000.0;
        let total = units.round() as i64;
        let bev = (units * bev_ratio(year)).round() as i64;

        for (vehicle_type, ev_sales) in [
            (VehicleType::Total, total),
            (VehicleType::Bev, bev),
            (VehicleType::Phev, total - bev),
        ] {
            dataset.sales.push(SalesRecord {
                country: country.to_string(),
                year,
                ev_sales,
                vehicle_type,
            });
        }

        dataset.stock.push(StockRecord {
            country: country.to_string(),
            year,
            ev_stock: (point.state.stock * 1000.0).round() as i64,
        });

        let market_share = round2(point.market_share);
        dataset.market_share.push(MarketShareRecord {
            country: country.to_string(),
            year,
            market_share,
            total_vehicle_sales: total_vehicle_sales(units, market_share),
        });

        let points = point.state.charging_points;
        let public_charging_points = points.round() as i64;
        let fast_chargers = (points * FAST_CHARGER_SHARE).round() as i64;
        dataset.charging.push(ChargingRecord {
            country: country.to_string(),
            year,
            public_charging_points,
            fast_chargers,
            slow_chargers: public_charging_points - fast_chargers,
        });
    }
}

/// Appends one `World` row per (year, vehicle type) summing every country.
fn append_world_rollup(sales: &mut Vec<SalesRecord>) {
    let mut totals: BTreeMap<(i32, VehicleType), i64> = BTreeMap::new();
    for record in sales.iter() {
        *totals.entry((record.year, record.vehicle_type)).or_default() += record.ev_sales;
    }

    sales.extend(totals.into_iter().map(|((year, vehicle_type), ev_sales)| SalesRecord {
        country: WORLD.to_string(),
        year,
        ev_sales,
        vehicle_type,
    }));
}

/// Generates the dataset for `config`.
pub fn generate(config: &GeneratorConfig) -> Result<Dataset> {
    Ok(Generator::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;

    fn norway_only() -> GeneratorConfig {
        GeneratorConfig {
            countries: vec!["Norway".into()],
            first_year: 2015,
            last_year: 2024,
            base_sales: BTreeMap::from([("Norway".into(), 25.8)]),
            growth_rates: BTreeMap::from([("Norway".into(), 1.25)]),
            seed: 0,
        }
    }

    #[test]
    fn norway_second_year() {
        let generator = Generator::new(&norway_only()).unwrap();
        let norway = &generator.profiles()[0];
        assert_relative_eq!(norway.raw_sales(1), 32.25, max_relative = 1e-12);

        let point = generator.step(norway, 2016, CountryState::default());
        assert_relative_eq!(point.market_share, 18.0);
        let jitter = Jitter::new(0).factor("Norway", 2016);
        assert_relative_eq!(point.sales, 32.25 * jitter, max_relative = 1e-12);
    }

    #[test]
    fn share_ramps_then_caps() {
        assert_relative_eq!(ShareTier::Norway.share(0), 10.0);
        assert_relative_eq!(ShareTier::Norway.share(11), 92.0);
        assert_relative_eq!(ShareTier::China.share(9), 46.5);
        assert_relative_eq!(ShareTier::HighAdoption.share(20), 45.0);
        assert_relative_eq!(ShareTier::Default.share(9), 23.0);
        assert_eq!(ShareTier::for_country("Denmark"), ShareTier::HighAdoption);
        assert_eq!(ShareTier::for_country("Chile"), ShareTier::Default);
    }

    #[test]
    fn bev_ratio_is_clamped() {
        assert_relative_eq!(bev_ratio(2015), 0.6);
        assert_relative_eq!(bev_ratio(2024), 0.87);
        assert_relative_eq!(bev_ratio(2035), 1.0);
        assert_relative_eq!(bev_ratio(1990), 0.0);
        assert_relative_eq!(bev_ratio(i32::MIN), 0.0);
        assert_relative_eq!(bev_ratio(i32::MAX), 1.0);
    }

    #[test]
    fn bev_ratio_ignores_configured_first_year() {
        let mut config = norway_only();
        config.first_year = 2020;
        let dataset = generate(&config).unwrap();
        let total = dataset.sales_of("Norway", 2020, VehicleType::Total).unwrap();
        let bev = dataset.sales_of("Norway", 2020, VehicleType::Bev).unwrap();
        // 0.6 + 0.03 * 5
        assert!((bev as f64 - total as f64 * 0.75).abs() <= 1.0, "{bev} of {total}");
    }

    #[test]
    fn pinned_default_rows() {
        let dataset = generate(&GeneratorConfig::default()).unwrap();
        let row = |country: &str, year: i32| {
            let stock = dataset.stock.iter().find(|r| r.country == country && r.year == year);
            let charging = dataset.charging.iter().find(|r| r.country == country && r.year == year);
            (
                dataset.sales_of(country, year, VehicleType::Total).unwrap(),
                dataset.sales_of(country, year, VehicleType::Bev).unwrap(),
                stock.unwrap().ev_stock,
                charging.unwrap().public_charging_points,
                charging.unwrap().fast_chargers,
            )
        };

        assert_eq!(row("China", 2015), (170_834, 102_501, 170_834, 1_833, 458));
        assert_eq!(row("Norway", 2024), (180_813, 157_308, 756_789, 20_214, 5_053));
        assert_eq!(dataset.sales_of(WORLD, 2024, VehicleType::Total), Some(9_502_470));
    }

    #[test]
    fn year_range_at_integer_limits() {
        for (first_year, last_year) in [(i32::MIN, i32::MIN + 1), (i32::MAX - 1, i32::MAX)] {
            let mut config = norway_only();
            config.first_year = first_year;
            config.last_year = last_year;
            let dataset = generate(&config).unwrap();
            assert_eq!(dataset.stock.len(), 2);
            assert_eq!(dataset.stock[1].year, last_year);
            assert_eq!(dataset.sales.len(), 2 * 3 * 2);
        }
    }

    #[test]
    fn single_year_range() {
        let mut config = norway_only();
        config.last_year = config.first_year;
        let dataset = generate(&config).unwrap();
        assert_eq!(dataset.stock.len(), 1);
        assert_eq!(dataset.sales.len(), 6);
    }

    #[test]
    fn zero_share_does_not_divide() {
        assert_eq!(total_vehicle_sales(1000.0, 0.0), 0);
        assert_eq!(total_vehicle_sales(1000.0, 10.0), 10_000);
    }

    #[test]
    fn state_recurrences() {
        let generator = Generator::new(&norway_only()).unwrap();
        let points = generator.trajectory(&generator.profiles()[0]);
        assert_eq!(points.len(), 10);
        assert_relative_eq!(points[0].state.stock, points[0].sales);
        assert_relative_eq!(points[0].state.charging_points, 125.0 + points[0].sales * 10.0);

        for pair in points.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            assert_relative_eq!(cur.state.stock, prev.state.stock * 0.95 + cur.sales);
            assert_relative_eq!(
                cur.state.charging_points,
                prev.state.charging_points * 1.25 + cur.sales * 10.0
            );
            assert!(cur.state.stock >= prev.state.stock);
        }
    }

    #[test]
    fn powertrains_sum_to_total() {
        let dataset = generate(&GeneratorConfig::default()).unwrap();
        for record in dataset.sales.iter().filter(|r| r.vehicle_type == VehicleType::Total) {
            let bev = dataset.sales_of(&record.country, record.year, VehicleType::Bev).unwrap();
            let phev = dataset.sales_of(&record.country, record.year, VehicleType::Phev).unwrap();
            assert_eq!(bev + phev, record.ev_sales, "{} {}", record.country, record.year);
        }
    }

    #[test]
    fn chargers_split_the_total() {
        let dataset = generate(&norway_only()).unwrap();
        for record in &dataset.charging {
            assert_eq!(record.fast_chargers + record.slow_chargers, record.public_charging_points);
            let fast = record.fast_chargers as f64 / record.public_charging_points as f64;
            assert!((fast - 0.25).abs() < 0.01);
        }
    }

    #[test]
    fn row_layout() {
        let dataset = generate(&GeneratorConfig::default()).unwrap();
        assert_eq!(dataset.sales.len(), 20 * 10 * 3 + 10 * 3);
        assert_eq!(dataset.stock.len(), 200);
        assert_eq!(dataset.market_share.len(), 200);
        assert_eq!(dataset.charging.len(), 200);

        assert_eq!(dataset.stock[0].country, "China");
        assert_eq!(dataset.stock[0].year, 2015);
        assert_eq!(dataset.stock[20].year, 2016);

        let world = &dataset.sales[600..];
        assert!(world.iter().all(|r| r.country == WORLD));
        assert_eq!(world[0].vehicle_type, VehicleType::Bev);
        assert_eq!(world[2].vehicle_type, VehicleType::Total);
        assert_eq!(world[3].year, 2016);
    }

    #[test]
    fn world_is_sum_of_countries() {
        let dataset = generate(&GeneratorConfig::default()).unwrap();
        for year in 2015..=2024 {
            for vehicle_type in VehicleType::ALL {
                let sum: i64 = dataset
                    .sales
                    .iter()
                    .filter(|r| r.country != WORLD && r.year == year && r.vehicle_type == vehicle_type)
                    .map(|r| r.ev_sales)
                    .sum();
                assert_eq!(dataset.sales_of(WORLD, year, vehicle_type), Some(sum));
            }
        }
    }

    #[test]
    fn share_within_cap_and_non_decreasing() {
        let dataset = generate(&GeneratorConfig::default()).unwrap();
        let mut last: BTreeMap<&str, f64> = BTreeMap::new();
        for record in &dataset.market_share {
            let cap = ShareTier::for_country(&record.country).cap();
            assert!((0.0..=cap).contains(&record.market_share));
            if let Some(previous) = last.insert(&record.country, record.market_share) {
                assert!(record.market_share >= previous);
            }
        }
    }

    #[test]
    fn runs_are_reproducible() {
        let config = GeneratorConfig::default();
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }

    #[test]
    fn mismatched_config_fails_before_generating() {
        let mut config = norway_only();
        config.countries.push("Chile".into());
        assert!(generate(&config).is_err());
    }
}
