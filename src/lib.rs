pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod generator;
pub mod iea;
pub mod jitter;
pub mod records;
pub mod report;
pub mod store;

use std::path::Path;

use log::info;

pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use generator::generate;
pub use records::Dataset;
pub use store::Store;

/// Generates the series for `config`, writes the CSV tables into `data_dir`
/// and loads them into a store at `store_dir`.
pub fn generate_and_store(
    config: &GeneratorConfig,
    data_dir: impl AsRef<Path>,
    store_dir: impl AsRef<Path>,
) -> Result<(Dataset, Store)> {
    let dataset = generate(config)?;
    info!(
        "generated {} sales rows for {} countries, {}-{}",
        dataset.sales.len(),
        config.countries.len(),
        config.first_year,
        config.last_year
    );

    export::write_csv_tables(&dataset, data_dir)?;
    let store = Store::create(store_dir, config, &dataset)?;
    Ok((dataset, store))
}
