use thiserror::Error;

/// errors raised while loading, transforming or writing tables.
#[derive(Debug, Error)]
pub enum TsqlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, TsqlError>;
