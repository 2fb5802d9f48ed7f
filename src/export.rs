use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use polars::prelude::*;

use crate::error::Result;
use crate::records::{Dataset, Table};

/// Writes one `<stem>.csv` per table into `dir`, creating it if needed.
pub fn write_csv_tables(dataset: &Dataset, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let path = dir.join(format!("{}.csv", table.stem()));
        let mut df = dataset.frame(table)?;
        write_csv(&mut df, &path)?;
        debug!("wrote {} rows to {}", df.height(), path.display());
        written.push(path);
    }

    info!("wrote {} CSV tables to {}", written.len(), dir.display());
    Ok(written)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    CsvWriter::new(&mut writer).include_header(true).finish(df)?;
    writer.flush()?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}
