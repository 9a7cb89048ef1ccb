use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use polars::prelude::*;

use super::error::{Result, SweepError};
use super::model::{FileFormat, LoadedTable, SourceInfo, Table, UploadedFile};

/// Upload cap applied when no configuration overrides it (200 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Tokens read as null, in addition to the empty string.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

/// Knobs for [`load`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub max_upload_bytes: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Resolve the format of an upload from its file name.
///
/// The extension is matched case-insensitively; the error carries it with
/// its leading dot (`.txt`).
pub fn detect_format(file_name: &str) -> Result<FileFormat> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    FileFormat::from_extension(&ext).ok_or_else(|| SweepError::UnsupportedFormat {
        extension: if ext.is_empty() {
            String::new()
        } else {
            format!(".{ext}")
        },
    })
}

/// Parse one upload into a table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row plus comma-separated records
/// * `.xlsx` – first worksheet, first row as header
pub fn load(file: &UploadedFile, options: &LoaderOptions) -> Result<LoadedTable> {
    let format = detect_format(&file.name)?;

    if file.size() > options.max_upload_bytes {
        return Err(SweepError::FileTooLarge {
            file: file.name.clone(),
            size: file.size(),
            limit: options.max_upload_bytes,
        });
    }

    let frame = match format {
        FileFormat::Csv => load_csv(file)?,
        FileFormat::Xlsx => load_xlsx(file)?,
    };
    let table = normalize_dtypes(frame)?;

    log::info!(
        "Loaded `{}` ({} bytes): {} rows x {} columns",
        file.name,
        file.size(),
        table.row_count(),
        table.column_count()
    );

    Ok(LoadedTable {
        source: SourceInfo {
            name: file.name.clone(),
            size: file.size(),
            format,
        },
        table,
    })
}

/// Load every upload in order.  A failure is reported in that file's slot
/// and never stops the files after it.
pub fn load_batch(files: &[UploadedFile], options: &LoaderOptions) -> Vec<Result<LoadedTable>> {
    files
        .iter()
        .map(|file| {
            let outcome = load(file, options);
            if let Err(e) = &outcome {
                log::warn!("Skipping `{}`: {e}", file.name);
            }
            outcome
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: first record is the header, the rest are data rows.
/// Short records are padded with nulls; long records are rejected.
fn load_csv(file: &UploadedFile) -> Result<DataFrame> {
    let bytes = file
        .bytes
        .strip_prefix(b"\xEF\xBB\xBF")
        .unwrap_or(&file.bytes[..]);
    std::str::from_utf8(bytes).map_err(|e| SweepError::parse(&file.name, e))?;

    // Raw header names, before polars renames blanks and repeats its own way.
    let headers: Vec<String> = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes)
        .headers()
        .map_err(|e| SweepError::parse(&file.name, e))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) && bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(SweepError::parse(&file.name, "No columns to parse from file"));
    }

    let null_values = NullValues::AllColumns(
        std::iter::once("")
            .chain(MISSING_MARKERS.iter().copied())
            .map(Into::into)
            .collect(),
    );

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_null_values(Some(null_values))
                .with_missing_is_null(true)
                .with_truncate_ragged_lines(false),
        )
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| SweepError::parse(&file.name, e))?;

    if frame.width() != headers.len() {
        return Err(SweepError::parse(
            &file.name,
            format!("expected {} columns, parsed {}", headers.len(), frame.width()),
        ));
    }

    rename_columns(frame, normalize_headers(headers))
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

/// Read the first worksheet.  The first row of the used range is the header.
fn load_xlsx(file: &UploadedFile) -> Result<DataFrame> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(file.bytes.as_slice()))
        .map_err(|e: XlsxError| SweepError::parse(&file.name, e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SweepError::parse(&file.name, "workbook has no worksheets"))?
        .map_err(|e| SweepError::parse(&file.name, e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(DataFrame::default());
    };

    let names = normalize_headers(header_row.iter().map(header_text).collect());
    let mut cells: Vec<Vec<AnyValue<'static>>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(col_idx).map_or(AnyValue::Null, any_value));
        }
    }

    // polars picks each column's dtype as the supertype of its cells.
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| {
            Series::from_any_values(name.into(), &values, false).map(Column::from)
        })
        .collect::<PolarsResult<Vec<_>>>()
        .map_err(|e| SweepError::parse(&file.name, e))?;

    DataFrame::new(columns).map_err(|e| SweepError::parse(&file.name, e))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Spreadsheet numbers are all stored as floats; whole ones read as integers.
fn any_value(cell: &Data) -> AnyValue<'static> {
    match cell {
        Data::Int(i) => AnyValue::Int64(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => AnyValue::Int64(*f as i64),
        Data::Float(f) => AnyValue::Float64(*f),
        Data::Bool(b) => AnyValue::Boolean(*b),
        Data::String(s) if is_missing_marker(s) => AnyValue::Null,
        Data::String(s) => AnyValue::StringOwned(s.as_str().into()),
        Data::Empty | Data::Error(_) => AnyValue::Null,
        other => AnyValue::StringOwned(other.to_string().into()),
    }
}

// ---------------------------------------------------------------------------
// Shared: header normalisation and dtype normalisation
// ---------------------------------------------------------------------------

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || MISSING_MARKERS.contains(&s)
}

/// Blank names become `Unnamed: {index}`; repeats get `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 0;
        while used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}.{suffix}");
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

fn rename_columns(frame: DataFrame, names: Vec<String>) -> Result<DataFrame> {
    let columns = frame
        .get_columns()
        .iter()
        .zip(names)
        .map(|(column, name)| {
            let mut column = column.clone();
            column.rename(name.into());
            column
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Settle every column on int64, float64, bool or string.
///
/// Integer columns with gaps become float, since the integer dtype cannot
/// hold the missing marker once exported. Columns with no values at all are
/// float.
fn normalize_dtypes(frame: DataFrame) -> Result<Table> {
    let columns = frame
        .get_columns()
        .iter()
        .map(|column| {
            let nulls = column.null_count();
            let target = match column.dtype() {
                _ if column.len() > 0 && nulls == column.len() => DataType::Float64,
                DataType::Boolean => DataType::Boolean,
                dt if dt.is_integer() && nulls > 0 => DataType::Float64,
                dt if dt.is_integer() => DataType::Int64,
                dt if dt.is_float() => DataType::Float64,
                _ => DataType::String,
            };
            log::debug!("column `{}` loaded as {target}", column.name());
            if column.dtype() == &target {
                Ok(column.clone())
            } else {
                column.cast(&target)
            }
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    Table::new(columns)
}
