use std::fmt;

use polars::prelude::{col, len, DataType, IntoLazy, SortMultipleOptions};

use super::error::{Result, SweepError};
use super::model::Table;

/// Chart kinds offered by the visualisation panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Histogram,
    ];
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
        };
        f.write_str(label)
    }
}

/// What to plot, with the columns each kind needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartRequest {
    Bar { columns: Vec<String> },
    Line { columns: Vec<String> },
    Scatter { x: String, y: String },
    Histogram { column: String },
}

impl ChartRequest {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::Bar { .. } => ChartKind::Bar,
            ChartRequest::Line { .. } => ChartKind::Line,
            ChartRequest::Scatter { .. } => ChartKind::Scatter,
            ChartRequest::Histogram { .. } => ChartKind::Histogram,
        }
    }
}

/// One named set of `[x, y]` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

/// Ready-to-draw chart data. Building it never touches the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// Grouped bars: one series per column, x is the row position.
    Bars(Vec<Series>),
    Lines(Vec<Series>),
    Scatter(Series),
    /// Value → frequency, most frequent first.
    Histogram {
        column: String,
        counts: Vec<(String, usize)>,
    },
}

pub fn build_chart(table: &Table, request: &ChartRequest) -> Result<Chart> {
    match request {
        ChartRequest::Bar { columns } => Ok(Chart::Bars(row_series(table, columns)?)),
        ChartRequest::Line { columns } => Ok(Chart::Lines(row_series(table, columns)?)),
        ChartRequest::Scatter { x, y } => {
            let xs = numeric_values(table, x)?;
            let ys = numeric_values(table, y)?;
            let points = xs
                .into_iter()
                .zip(ys)
                .filter_map(|(a, b)| Some([a?, b?]))
                .collect();
            Ok(Chart::Scatter(Series {
                name: format!("{y} vs {x}"),
                points,
            }))
        }
        ChartRequest::Histogram { column } => Ok(Chart::Histogram {
            column: column.clone(),
            counts: value_counts(table, column)?,
        }),
    }
}

/// Frequency of each non-missing value of `column`, by descending count;
/// ties keep first-appearance order.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    table.column(column)?;

    let counts = table
        .frame()
        .clone()
        .lazy()
        .select([col(column).cast(DataType::String).alias("value")])
        .filter(col("value").is_not_null())
        .group_by_stable([col("value")])
        .agg([len().alias("count")])
        .sort_by_exprs(
            vec![col("count")],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let values = counts.column("value")?.str()?;
    let tallies = counts.column("count")?.cast(&DataType::UInt64)?;
    Ok(values
        .into_iter()
        .zip(tallies.u64()?)
        .filter_map(|(value, n)| Some((value?.to_string(), n? as usize)))
        .collect())
}

fn row_series(table: &Table, columns: &[String]) -> Result<Vec<Series>> {
    columns
        .iter()
        .map(|name| {
            let points = numeric_values(table, name)?
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| Some([i as f64, v?]))
                .collect();
            Ok(Series {
                name: name.clone(),
                points,
            })
        })
        .collect()
}

/// Values of a numeric column as floats, nulls kept in place.
fn numeric_values(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let column = table.column(name)?;
    if !column.dtype().is_primitive_numeric() {
        return Err(SweepError::NotNumeric {
            column: name.to_string(),
        });
    }
    let floats = column.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{build_column, CellValue, ColumnType};

    fn table() -> Table {
        Table::new(vec![
            build_column(
                "x",
                ColumnType::Float,
                &[CellValue::Float(1.0), CellValue::Missing, CellValue::Float(3.0)],
            ),
            build_column(
                "y",
                ColumnType::Integer,
                &[CellValue::Integer(4), CellValue::Integer(5), CellValue::Integer(6)],
            ),
            build_column(
                "tag",
                ColumnType::Text,
                &[
                    CellValue::Text("a".into()),
                    CellValue::Text("b".into()),
                    CellValue::Text("b".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn line_series_skip_missing_cells() {
        let chart = build_chart(
            &table(),
            &ChartRequest::Line {
                columns: vec!["x".into(), "y".into()],
            },
        )
        .unwrap();
        let Chart::Lines(series) = chart else {
            panic!("expected lines");
        };
        assert_eq!(series[0].points, vec![[0.0, 1.0], [2.0, 3.0]]);
        assert_eq!(series[1].points.len(), 3);
    }

    #[test]
    fn scatter_pairs_present_rows() {
        let chart = build_chart(
            &table(),
            &ChartRequest::Scatter {
                x: "x".into(),
                y: "y".into(),
            },
        )
        .unwrap();
        assert_eq!(
            chart,
            Chart::Scatter(Series {
                name: "y vs x".into(),
                points: vec![[1.0, 4.0], [3.0, 6.0]],
            })
        );
    }

    #[test]
    fn histogram_counts_by_frequency() {
        let chart = build_chart(&table(), &ChartRequest::Histogram { column: "tag".into() }).unwrap();
        assert_eq!(
            chart,
            Chart::Histogram {
                column: "tag".into(),
                counts: vec![("b".into(), 2), ("a".into(), 1)],
            }
        );
    }

    #[test]
    fn histogram_labels_keep_small_floats_apart() {
        let table = Table::new(vec![build_column(
            "tiny",
            ColumnType::Float,
            &[CellValue::Float(0.00001), CellValue::Float(0.00002)],
        )])
        .unwrap();
        let counts = value_counts(&table, "tiny").unwrap();
        assert_eq!(counts.len(), 2);
        assert_ne!(counts[0].0, counts[1].0);
    }

    #[test]
    fn bar_needs_numeric_columns() {
        let err = build_chart(
            &table(),
            &ChartRequest::Bar {
                columns: vec!["tag".into()],
            },
        )
        .unwrap_err();
        assert!(matches!(err, SweepError::NotNumeric { column } if column == "tag"));
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = build_chart(&table(), &ChartRequest::Histogram { column: "nope".into() }).unwrap_err();
        assert!(matches!(err, SweepError::UnknownColumn { .. }));
    }

    #[test]
    fn building_a_chart_leaves_the_table_alone() {
        let t = table();
        let before = t.clone();
        let _ = build_chart(&t, &ChartRequest::Histogram { column: "x".into() });
        assert_eq!(t, before);
    }
}
