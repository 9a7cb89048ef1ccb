use std::collections::HashSet;
use std::fmt;

use polars::prelude::*;

use super::error::{Result, SweepError};

// ---------------------------------------------------------------------------
// CellValue – a single cell, as shown to the user or written to a sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed view of one cell of a [`Table`].
///
/// The table itself lives in a polars `DataFrame`; cells are materialised
/// only for display, spreadsheet export and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// The missing marker: absence of data in this cell.
    Missing,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => f.write_str(&format_float(*v)),
            CellValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Missing => write!(f, "<NA>"),
        }
    }
}

/// Shortest text that reads back as the same float, with a trailing `.0`
/// on whole numbers.
pub fn format_float(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains(['.', 'e', 'E']) {
        format!("{s}.0")
    } else {
        s
    }
}

impl CellValue {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<AnyValue<'_>> for CellValue {
    fn from(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => CellValue::Missing,
            AnyValue::Boolean(b) => CellValue::Bool(b),
            AnyValue::Int32(i) => CellValue::Integer(i64::from(i)),
            AnyValue::Int64(i) => CellValue::Integer(i),
            AnyValue::UInt32(i) => CellValue::Integer(i64::from(i)),
            AnyValue::UInt64(i) => match i64::try_from(i) {
                Ok(i) => CellValue::Integer(i),
                Err(_) => CellValue::Float(i as f64),
            },
            AnyValue::Float32(v) => CellValue::Float(f64::from(v)),
            AnyValue::Float64(v) => CellValue::Float(v),
            AnyValue::String(s) => CellValue::Text(s.to_string()),
            AnyValue::StringOwned(s) => CellValue::Text(s.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – the four dtypes a loaded column can have
// ---------------------------------------------------------------------------

/// Column dtype. Loaded frames are normalised so every column has one of
/// these four polars dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnType {
    /// Integer and float columns take part in statistics and imputation.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn dtype(self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Text => DataType::String,
        }
    }

    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Boolean => ColumnType::Boolean,
            dt if dt.is_integer() => ColumnType::Integer,
            dt if dt.is_float() => ColumnType::Float,
            _ => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::Text => "object",
        };
        f.write_str(name)
    }
}

/// Build a polars column of type `ty` from cells. Cells that do not fit the
/// type become null.
pub fn build_column(name: &str, ty: ColumnType, cells: &[CellValue]) -> Column {
    let name = PlSmallStr::from(name);
    match ty {
        ColumnType::Integer => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        ColumnType::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(CellValue::as_f64).collect();
            Column::new(name, values)
        }
        ColumnType::Boolean => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        ColumnType::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| (!c.is_missing()).then(|| c.to_string()))
                .collect();
            Column::new(name, values)
        }
    }
}

/// Materialise every cell of one column, in row order.
pub fn column_cells(column: &Column) -> Result<Vec<CellValue>> {
    let cells = match column.dtype() {
        DataType::Int64 => column
            .i64()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Missing, CellValue::Integer))
            .collect(),
        DataType::Float64 => column
            .f64()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Missing, CellValue::Float))
            .collect(),
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Missing, CellValue::Bool))
            .collect(),
        DataType::String => text_cells(column.str()?),
        _ => {
            let text = column.cast(&DataType::String)?;
            text_cells(text.str()?)
        }
    };
    Ok(cells)
}

fn text_cells(values: &StringChunked) -> Vec<CellValue> {
    values
        .into_iter()
        .map(|v| v.map_or(CellValue::Missing, |s| CellValue::Text(s.to_string())))
        .collect()
}

// ---------------------------------------------------------------------------
// Table – a DataFrame with unique column names
// ---------------------------------------------------------------------------

/// An in-memory table backed by a polars `DataFrame`.
///
/// Column names are unique and every column has the same length; rows are
/// aligned by position.
#[derive(Debug, Clone, Default)]
pub struct Table {
    frame: DataFrame,
}

impl Table {
    /// Assemble a table, reporting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name().as_str()) {
                return Err(SweepError::DuplicateColumn {
                    name: col.name().to_string(),
                });
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(SweepError::LengthMismatch {
                    column: bad.name().to_string(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    pub(crate) fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.frame
            .column(name)
            .map_err(|_| SweepError::UnknownColumn {
                name: name.to_string(),
            })
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        Ok(ColumnType::of(self.column(name)?.dtype()))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        if self.frame.width() == 0 {
            0
        } else {
            self.frame.height()
        }
    }

    pub fn column_count(&self) -> usize {
        self.frame.width()
    }

    /// Every cell of the named column.
    pub fn values(&self, name: &str) -> Result<Vec<CellValue>> {
        column_cells(self.column(name)?)
    }

    /// Every cell, column by column.
    pub fn cells(&self) -> Result<Vec<Vec<CellValue>>> {
        self.frame.get_columns().iter().map(column_cells).collect()
    }

    /// One row, in column order.
    pub fn row(&self, index: usize) -> Result<Vec<CellValue>> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| Ok(CellValue::from(c.get(index)?)))
            .collect()
    }

    /// The first `n` rows. Only those rows are copied.
    pub fn head(&self, n: usize) -> Table {
        Table::from_frame(self.frame.head(Some(n)))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names() && self.frame.equals_missing(&other.frame)
    }
}

// ---------------------------------------------------------------------------
// FileFormat – resolved once from the upload's extension
// ---------------------------------------------------------------------------

/// The two tabular formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub const ALL: [FileFormat; 2] = [FileFormat::Csv, FileFormat::Xlsx];

    /// Resolve a format from a bare extension (no dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Human label used by the conversion controls.
    pub fn label(self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Xlsx => "Excel",
        }
    }

    /// The other supported format.
    pub fn alternate(self) -> Self {
        match self {
            FileFormat::Csv => FileFormat::Xlsx,
            FileFormat::Xlsx => FileFormat::Csv,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Uploads and loaded tables
// ---------------------------------------------------------------------------

/// A named byte blob handed over by the front end.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Where a table came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub name: String,
    pub size: usize,
    pub format: FileFormat,
}

/// A parsed upload: the table plus the format resolved at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub source: SourceInfo,
    pub table: Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, values: &[i64]) -> Column {
        let cells: Vec<CellValue> = values.iter().map(|v| CellValue::Integer(*v)).collect();
        build_column(name, ColumnType::Integer, &cells)
    }

    #[test]
    fn table_rejects_duplicate_names() {
        let err = Table::new(vec![ints("a", &[]), ints("a", &[])]).unwrap_err();
        assert!(matches!(err, SweepError::DuplicateColumn { name } if name == "a"));
    }

    #[test]
    fn table_rejects_ragged_columns() {
        let err = Table::new(vec![ints("a", &[1]), ints("b", &[])]).unwrap_err();
        assert!(matches!(
            err,
            SweepError::LengthMismatch { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn cells_round_trip_through_columns() {
        let cells = vec![
            CellValue::Text("x".into()),
            CellValue::Missing,
            CellValue::Text("z".into()),
        ];
        let table = Table::new(vec![
            ints("a", &[1, 2, 3]),
            build_column("b", ColumnType::Text, &cells),
        ])
        .unwrap();
        assert_eq!(table.column_type("a").unwrap(), ColumnType::Integer);
        assert_eq!(table.values("b").unwrap(), cells);
        assert_eq!(
            table.row(2).unwrap(),
            vec![CellValue::Integer(3), CellValue::Text("z".into())]
        );
        assert!(matches!(
            table.values("nope"),
            Err(SweepError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn head_keeps_the_first_rows() {
        let table = Table::new(vec![ints("a", &[1, 2, 3])]).unwrap();
        let head = table.head(2);
        assert_eq!(head.row_count(), 2);
        assert_eq!(
            head.values("a").unwrap(),
            vec![CellValue::Integer(1), CellValue::Integer(2)]
        );
        assert_eq!(table.head(10).row_count(), 3);
    }

    #[test]
    fn floats_display_in_shortest_form() {
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Float(2.0).to_string(), "2.0");
        assert_ne!(
            CellValue::Float(0.00001).to_string(),
            CellValue::Float(0.00002).to_string()
        );
        assert_eq!(CellValue::Bool(true).to_string(), "True");
        assert_eq!(CellValue::Missing.to_string(), "<NA>");
    }

    #[test]
    fn format_extensions_and_content_types() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("xlsx"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_extension("xls"), None);
        assert_eq!(FileFormat::Csv.content_type(), "text/csv");
        assert_eq!(
            FileFormat::Xlsx.content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(FileFormat::Csv.alternate(), FileFormat::Xlsx);
    }
}
