use std::io::Cursor;

use polars::prelude::{CsvWriter, SerWriter};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::error::{Result, SweepError};
use super::model::{column_cells, CellValue, FileFormat, Table};

/// Largest number of data rows a worksheet holds below its header row.
const XLSX_MAX_DATA_ROWS: usize = 1_048_575;
const XLSX_MAX_COLUMNS: usize = 16_384;

/// A serialized table ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportBuffer {
    /// Encoded file, positioned at its start.
    pub data: Cursor<Vec<u8>>,
    pub file_name: String,
    pub content_type: &'static str,
}

impl ExportBuffer {
    pub fn bytes(&self) -> &[u8] {
        self.data.get_ref()
    }

    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

/// Convert `table` into `target`, naming the result after `source_name`.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub table: &'a Table,
    pub target: FileFormat,
    pub source_name: &'a str,
}

impl ConversionRequest<'_> {
    pub fn execute(&self) -> Result<ExportBuffer> {
        export(self.table, self.target, self.source_name)
    }
}

/// Serialize `table` (header plus rows, no index column) into `format`.
pub fn export(table: &Table, format: FileFormat, source_name: &str) -> Result<ExportBuffer> {
    let bytes = match format {
        FileFormat::Csv => write_csv(table)?,
        FileFormat::Xlsx => write_xlsx(table)?,
    };
    let file_name = output_file_name(source_name, format);

    log::info!(
        "Exported {} rows x {} columns to `{file_name}` ({} bytes)",
        table.row_count(),
        table.column_count(),
        bytes.len()
    );

    Ok(ExportBuffer {
        data: Cursor::new(bytes),
        file_name,
        content_type: format.content_type(),
    })
}

/// Swap the extension of `source_name` for the one of `format`; a name
/// without an extension gets one appended.
pub fn output_file_name(source_name: &str, format: FileFormat) -> String {
    let stem = match source_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(['/', '\\']) => stem,
        _ => source_name,
    };
    format!("{stem}.{}", format.extension())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

fn write_csv(table: &Table) -> Result<Vec<u8>> {
    if table.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut frame = table.frame().clone();
    let mut bytes = Vec::new();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// XLSX writer
// ---------------------------------------------------------------------------

fn write_xlsx(table: &Table) -> Result<Vec<u8>> {
    if table.row_count() > XLSX_MAX_DATA_ROWS || table.column_count() > XLSX_MAX_COLUMNS {
        return Err(SweepError::Export {
            message: format!(
                "{} rows x {} columns exceeds the worksheet limit of {XLSX_MAX_DATA_ROWS} x {XLSX_MAX_COLUMNS}",
                table.row_count(),
                table.column_count()
            ),
        });
    }

    let columns = table
        .frame()
        .get_columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), column_cells(c)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut workbook = Workbook::new();
    fill_worksheet(workbook.add_worksheet(), &columns)?;
    Ok(workbook.save_to_buffer()?)
}

fn fill_worksheet(
    sheet: &mut Worksheet,
    columns: &[(String, Vec<CellValue>)],
) -> std::result::Result<(), XlsxError> {
    sheet.set_name("Sheet1")?;
    let header = Format::new().set_bold();

    // Limits were checked by the caller, so the casts cannot truncate.
    for (col_idx, (name, cells)) in columns.iter().enumerate() {
        let col = col_idx as u16;
        sheet.write_string_with_format(0, col, name.as_str(), &header)?;

        for (row_idx, cell) in cells.iter().enumerate() {
            let row = row_idx as u32 + 1;
            match cell {
                CellValue::Missing => {}
                CellValue::Integer(i) => {
                    sheet.write_number(row, col, *i as f64)?;
                }
                CellValue::Float(v) if v.is_finite() => {
                    sheet.write_number(row, col, *v)?;
                }
                CellValue::Float(v) => {
                    sheet.write_string(row, col, v.to_string())?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                CellValue::Text(s) => {
                    sheet.write_string(row, col, s.as_str())?;
                }
            }
        }
    }
    Ok(())
}

impl From<XlsxError> for SweepError {
    fn from(e: XlsxError) -> Self {
        SweepError::Export {
            message: e.to_string(),
        }
    }
}
