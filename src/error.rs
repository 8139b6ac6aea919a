use thiserror::Error;

pub type HerdbookResult<T> = Result<T, HerdbookError>;

#[derive(Error, Debug)]
pub enum HerdbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Failed to read worksheet: {0}")]
    Read(String),

    #[error("Failed to write worksheet: {0}")]
    Write(String),

    /// The overwrite stopped part way. The worksheet now holds `written` of
    /// the `total` rows (header included) and is not rolled back.
    #[error(
        "Write failed after {written} of {total} rows, worksheet is partially overwritten: {reason}"
    )]
    PartialWrite {
        written: usize,
        total: usize,
        reason: String,
    },

    #[error("No record at index {index} (register has {len} records)")]
    NoSuchRecord { index: usize, len: usize },

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
