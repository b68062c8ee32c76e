use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Range references are not supported here: {0}")]
    RangeNotSupported(String),

    #[error("Could not open {file}: {source}")]
    WorkbookOpen {
        file: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("Could not read sheet {sheet}: {source}")]
    SheetRead {
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("Could not determine active sheet of {file}: {message}")]
    ActiveSheet { file: String, message: String },

    #[error("Failed to write output file: {0}")]
    OutputWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
