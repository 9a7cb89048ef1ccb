//! Data layer: table model, loading, inspection, cleaning, projection,
//! charting and export.
//!
//! Architecture:
//! ```text
//!   .csv / .xlsx bytes
//!         │
//!         ▼
//!   ┌──────────┐
//!   │  loader  │  dispatch on extension → LoadedTable (DataFrame + FileFormat)
//!   └──────────┘
//!         │
//!         ├──────────────► inspect   row/column counts, describe(), head
//!         ▼
//!   ┌──────────┐
//!   │  clean   │  remove_duplicates / fill_missing_numeric (in place)
//!   └──────────┘
//!         │
//!         ▼
//!   ┌──────────┐
//!   │  select  │  ordered column projection
//!   └──────────┘
//!         │
//!         ├──────────────► chart     bar / line / scatter / histogram data
//!         ▼
//!   ┌──────────┐
//!   │  export  │  Table → CSV or XLSX buffer + file name + content type
//!   └──────────┘
//! ```

pub mod chart;
pub mod clean;
pub mod error;
pub mod export;
pub mod inspect;
pub mod loader;
pub mod model;
pub mod select;

pub use error::{Result, SweepError};
pub use model::{
    build_column, CellValue, ColumnType, FileFormat, LoadedTable, SourceInfo, Table, UploadedFile,
};
pub use polars::prelude::Column;
