use std::collections::HashSet;

use super::error::{Result, SweepError};
use super::model::Table;

/// Project `table` onto `names`, in the order given.
///
/// Row count and row alignment are unchanged. Every name must exist and
/// appear at most once. Selecting nothing gives a table with no columns and
/// therefore no rows.
pub fn select_columns<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table> {
    let mut requested = HashSet::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !requested.insert(name) {
            return Err(SweepError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        table.column(name)?;
    }

    if names.is_empty() {
        return Ok(Table::default());
    }

    let frame = table.frame().select(names.iter().map(|n| n.as_ref()))?;
    Ok(Table::from_frame(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{build_column, CellValue, ColumnType};

    fn abc() -> Table {
        let col = |name: &str, base: i64| {
            let cells: Vec<CellValue> = (0..3).map(|i| CellValue::Integer(base + i)).collect();
            build_column(name, ColumnType::Integer, &cells)
        };
        Table::new(vec![col("A", 0), col("B", 10), col("C", 20)]).unwrap()
    }

    #[test]
    fn reorders_and_drops() {
        let table = abc();
        let picked = select_columns(&table, &["C", "A"]).unwrap();
        assert_eq!(picked.column_names(), vec!["C", "A"]);
        assert_eq!(picked.row_count(), 3);
        assert_eq!(
            picked.row(2).unwrap(),
            vec![CellValue::Integer(22), CellValue::Integer(2)]
        );
    }

    #[test]
    fn default_selection_is_identity() {
        let table = abc();
        assert_eq!(select_columns(&table, &table.column_names()).unwrap(), table);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = select_columns(&abc(), &["A", "Z"]).unwrap_err();
        assert!(matches!(err, SweepError::UnknownColumn { name } if name == "Z"));
    }

    #[test]
    fn repeated_column_is_rejected() {
        let err = select_columns(&abc(), &["A", "A"]).unwrap_err();
        assert!(matches!(err, SweepError::DuplicateColumn { name } if name == "A"));
    }

    #[test]
    fn empty_selection_has_no_columns() {
        let picked = select_columns::<&str>(&abc(), &[]).unwrap();
        assert_eq!(picked.column_count(), 0);
        assert_eq!(picked.row_count(), 0);
    }
}
