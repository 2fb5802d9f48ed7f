//! Typed cell access and plain-text rendering for query results.

use std::io::Write;

use polars::prelude::*;

use crate::error::{Error, Result};

fn cell<'a>(df: &'a DataFrame, column: &str, row: usize) -> Result<AnyValue<'a>> {
    let index = df
        .get_column_index(column)
        .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
    df.get(row)
        .and_then(|mut values| (index < values.len()).then(|| values.swap_remove(index)))
        .ok_or_else(|| unexpected(column, row))
}

fn unexpected(column: &str, row: usize) -> Error {
    Error::UnexpectedValue {
        column: column.to_string(),
        row,
    }
}

pub fn str_at(df: &DataFrame, column: &str, row: usize) -> Result<String> {
    match cell(df, column, row)? {
        AnyValue::String(value) => Ok(value.to_string()),
        AnyValue::StringOwned(value) => Ok(value.to_string()),
        _ => Err(unexpected(column, row)),
    }
}

/// Integer cell; nulls are an error.
pub fn i64_at(df: &DataFrame, column: &str, row: usize) -> Result<i64> {
    cell(df, column, row)?
        .extract::<i64>()
        .ok_or_else(|| unexpected(column, row))
}

pub fn f64_at(df: &DataFrame, column: &str, row: usize) -> Result<f64> {
    cell(df, column, row)?
        .extract::<f64>()
        .ok_or_else(|| unexpected(column, row))
}

/// Formats an integer with comma thousands separators.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn render_cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(v) => format!("{v:.2}"),
        AnyValue::Float64(v) => format!("{v:.2}"),
        other => match other.extract::<i64>() {
            Some(v) => group_thousands(v),
            None => other.to_string(),
        },
    }
}

/// Writes `df` as a left-aligned text table, all rows included.
pub fn write_table(out: &mut impl Write, df: &DataFrame) -> Result<()> {
    let header: Vec<String> = df.get_column_names().iter().map(|name| name.to_string()).collect();
    let mut rows = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let values = df.get(row).unwrap_or_default();
        rows.push(values.iter().map(render_cell).collect::<Vec<_>>());
    }

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header.as_slice()))?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(out, "{}", line(rule.as_slice()))?;
    for row in &rows {
        writeln!(out, "{}", line(row.as_slice()))?;
    }
    if rows.is_empty() {
        writeln!(out, "(no rows)")?;
    }
    Ok(())
}
