use polars::prelude::*;

use super::error::Result;
use super::model::{LoadedTable, Table};

/// Number of rows shown in the preview when nothing else is configured.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Descriptive statistics for one numeric column.
///
/// Fields other than `count` are NaN when they are undefined (no values, or
/// a single value for `std`).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Everything the file-info panel shows about a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub row_count: usize,
    pub column_count: usize,
    pub byte_size: usize,
    /// One entry per numeric column, in table order.
    pub stats: Vec<ColumnStats>,
}

impl Summary {
    /// Upload size in KiB, as displayed.
    pub fn size_kib(&self) -> f64 {
        self.byte_size as f64 / 1024.0
    }
}

pub fn summarize(loaded: &LoadedTable) -> Result<Summary> {
    let table = &loaded.table;
    Ok(Summary {
        row_count: table.row_count(),
        column_count: table.column_count(),
        byte_size: loaded.source.size,
        stats: describe(table)?,
    })
}

/// Statistics for every numeric column.
pub fn describe(table: &Table) -> Result<Vec<ColumnStats>> {
    table
        .frame()
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(column_stats)
        .collect()
}

fn column_stats(column: &Column) -> Result<ColumnStats> {
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = series.f64()?;
    let quantile = |q: f64| -> Result<f64> {
        Ok(values
            .quantile(q, QuantileMethod::Linear)?
            .unwrap_or(f64::NAN))
    };

    let count = series.len() - series.null_count();

    Ok(ColumnStats {
        column: column.name().to_string(),
        count,
        mean: series.mean().unwrap_or(f64::NAN),
        std: if count > 1 {
            series.std(1).unwrap_or(f64::NAN)
        } else {
            f64::NAN
        },
        min: series.min::<f64>()?.unwrap_or(f64::NAN),
        q25: quantile(0.25)?,
        median: quantile(0.5)?,
        q75: quantile(0.75)?,
        max: series.max::<f64>()?.unwrap_or(f64::NAN),
    })
}

/// The first `n` rows, for the preview grid.
pub fn preview(table: &Table, n: usize) -> Table {
    table.head(n)
}

/// Missing cells per column, in table order.
pub fn missing_counts(table: &Table) -> Vec<(String, usize)> {
    table
        .frame()
        .get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}
