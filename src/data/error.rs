use thiserror::Error;

/// Errors raised by the load → clean → select → export pipeline.
///
/// Every variant is recoverable at the granularity of one file or one user
/// action; nothing here aborts a batch.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("could not parse `{file}`: {source}")]
    Parse {
        file: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("`{file}` is {size} bytes, above the {limit} byte upload limit")]
    FileTooLarge { file: String, size: usize, limit: usize },

    #[error("unknown column `{name}`")]
    UnknownColumn { name: String },

    #[error("column `{name}` appears more than once")]
    DuplicateColumn { name: String },

    #[error("column `{column}` has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column `{column}` is not numeric")]
    NotNumeric { column: String },

    #[error("export failed: {message}")]
    Export { message: String },

    #[error("data frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

impl SweepError {
    pub(crate) fn parse(
        file: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        SweepError::Parse {
            file: file.to_string(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
