use polars::prelude::*;

use super::error::Result;
use super::model::Table;

/// Drop every row equal, cell by cell, to an earlier row.
///
/// The first occurrence survives and survivors keep their relative order.
/// Missing cells compare equal to each other. Returns the number of rows
/// removed.
pub fn remove_duplicates(table: &mut Table) -> Result<usize> {
    if table.column_count() == 0 {
        return Ok(0);
    }

    let before = table.row_count();
    let frame = table
        .frame()
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let removed = before - frame.height();

    *table = Table::from_frame(frame);
    log::info!("Removed {removed} duplicate rows, {} remain", table.row_count());
    Ok(removed)
}

/// Replace missing cells of every numeric column with that column's mean.
///
/// The mean is taken over the column's non-missing values as they are at
/// call time. Columns with no values at all are left alone, as are
/// non-numeric columns. Filled columns become float. Returns the number of
/// cells filled.
pub fn fill_missing_numeric(table: &mut Table) -> Result<usize> {
    let targets: Vec<(String, usize)> = table
        .frame()
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(|c| (c.name().to_string(), c.null_count(), c.len()))
        .filter(|(_, nulls, len)| *nulls > 0 && nulls < len)
        .map(|(name, nulls, _)| (name, nulls))
        .collect();

    if targets.is_empty() {
        log::info!("No missing numeric values to fill");
        return Ok(0);
    }

    let fills: Vec<Expr> = targets
        .iter()
        .map(|(name, _)| {
            let values = col(name.as_str()).cast(DataType::Float64);
            values.clone().fill_null(values.mean())
        })
        .collect();
    let frame = table.frame().clone().lazy().with_columns(fills).collect()?;
    *table = Table::from_frame(frame);

    let filled: usize = targets.iter().map(|(_, n)| n).sum();
    log::info!("Filled {filled} missing numeric values in {} columns", targets.len());
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{build_column, CellValue, ColumnType};

    fn text(v: &str) -> CellValue {
        CellValue::Text(v.to_string())
    }

    fn text_table(rows: &[[&str; 2]]) -> Table {
        let a: Vec<CellValue> = rows.iter().map(|r| text(r[0])).collect();
        let b: Vec<CellValue> = rows.iter().map(|r| text(r[1])).collect();
        Table::new(vec![
            build_column("a", ColumnType::Text, &a),
            build_column("b", ColumnType::Text, &b),
        ])
        .unwrap()
    }

    fn float_column(name: &str, cells: &[CellValue]) -> Column {
        build_column(name, ColumnType::Float, cells)
    }

    #[test]
    fn removes_later_duplicates_in_order() {
        let mut table = text_table(&[["x", "y"], ["x", "y"], ["x", "z"]]);
        assert_eq!(remove_duplicates(&mut table).unwrap(), 1);
        assert_eq!(table, text_table(&[["x", "y"], ["x", "z"]]));
    }

    #[test]
    fn keeps_first_occurrence_position() {
        let mut table = text_table(&[["b", "1"], ["a", "1"], ["b", "1"], ["a", "2"], ["a", "1"]]);
        remove_duplicates(&mut table).unwrap();
        assert_eq!(table, text_table(&[["b", "1"], ["a", "1"], ["a", "2"]]));
    }

    #[test]
    fn missing_cells_compare_equal() {
        let mut table = Table::new(vec![float_column(
            "x",
            &[CellValue::Missing, CellValue::Float(1.0), CellValue::Missing],
        )])
        .unwrap();
        assert_eq!(remove_duplicates(&mut table).unwrap(), 1);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn remove_duplicates_is_idempotent() {
        let mut table = text_table(&[["x", "y"], ["x", "y"], ["q", "r"]]);
        remove_duplicates(&mut table).unwrap();
        let once = table.clone();
        assert_eq!(remove_duplicates(&mut table).unwrap(), 0);
        assert_eq!(table, once);
    }

    #[test]
    fn no_columns_means_nothing_to_remove() {
        let mut table = Table::default();
        assert_eq!(remove_duplicates(&mut table).unwrap(), 0);
    }

    #[test]
    fn fills_with_column_mean() {
        let mut table = Table::new(vec![float_column(
            "x",
            &[CellValue::Float(1.0), CellValue::Missing, CellValue::Float(2.0)],
        )])
        .unwrap();
        assert_eq!(fill_missing_numeric(&mut table).unwrap(), 1);
        assert_eq!(table.values("x").unwrap()[1], CellValue::Float(1.5));
        assert_eq!(fill_missing_numeric(&mut table).unwrap(), 0);
    }

    #[test]
    fn integer_gaps_fill_as_float() {
        let mut table = Table::new(vec![build_column(
            "n",
            ColumnType::Integer,
            &[CellValue::Integer(1), CellValue::Missing, CellValue::Integer(4)],
        )])
        .unwrap();
        assert_eq!(fill_missing_numeric(&mut table).unwrap(), 1);
        assert_eq!(table.column_type("n").unwrap(), ColumnType::Float);
        assert_eq!(table.values("n").unwrap()[1], CellValue::Float(2.5));
    }

    #[test]
    fn leaves_all_missing_and_text_columns_alone() {
        let mut table = Table::new(vec![
            float_column("empty", &[CellValue::Missing, CellValue::Missing]),
            build_column("label", ColumnType::Text, &[text("a"), CellValue::Missing]),
        ])
        .unwrap();
        let before = table.clone();
        assert_eq!(fill_missing_numeric(&mut table).unwrap(), 0);
        assert_eq!(table, before);
    }

    // The mean reflects whatever rows are present when the fill runs, so
    // removing duplicates first changes the value that gets imputed.
    #[test]
    fn fill_after_dedup_uses_surviving_rows() {
        let build = || {
            Table::new(vec![
                build_column(
                    "k",
                    ColumnType::Text,
                    &[text("a"), text("a"), text("b"), text("c")],
                ),
                float_column(
                    "v",
                    &[
                        CellValue::Float(10.0),
                        CellValue::Float(10.0),
                        CellValue::Float(1.0),
                        CellValue::Missing,
                    ],
                ),
            ])
            .unwrap()
        };

        let mut direct = build();
        fill_missing_numeric(&mut direct).unwrap();
        assert_eq!(direct.values("v").unwrap()[3], CellValue::Float(7.0));

        let mut deduped = build();
        remove_duplicates(&mut deduped).unwrap();
        fill_missing_numeric(&mut deduped).unwrap();
        assert_eq!(deduped.values("v").unwrap()[2], CellValue::Float(5.5));
    }
}
