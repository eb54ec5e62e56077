use thiserror::Error;

/// Everything that can abort a record pass.
///
/// Unknown tags are deliberately absent: they are logged and dropped by the
/// parser without failing the record.
#[derive(Debug, Error)]
pub enum HolterError {
    /// The source has no lines at all.
    #[error("record source is empty")]
    EmptyInput,

    /// The file extension matches no known record format.
    #[error("unsupported record format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("line {line}: unknown wave type {label:?}")]
    UnknownWaveType { line: u64, label: String },

    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidTiming {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: expected at least 3 fields, got {count}")]
    TruncatedRecord { line: u64, count: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
