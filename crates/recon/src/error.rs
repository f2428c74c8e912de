use std::fmt;

use crate::model::Side;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, bad delimiter, duplicate field, etc.).
    ConfigValidation(String),
    /// Threshold is NaN or outside [0, 100].
    InvalidThreshold(f64),
    /// A key or fuzzy field is not a column of one of the datasets.
    MissingColumn { side: Side, column: String },
    /// An input column collides with a column the engine generates.
    ReservedColumn { side: Side, column: String },
    /// A CSV header names the same column twice.
    DuplicateColumn(String),
    /// Suffixing shared columns in the key pass produced a name another input column already has.
    ColumnCollision(String),
    /// A candidate search pointed past the end of the right dataset.
    InvalidCandidate { index: usize, rows: usize },
    /// CSV read/write error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidThreshold(value) => {
                write!(f, "threshold must be between 0 and 100, got {value}")
            }
            Self::MissingColumn { side, column } => {
                write!(f, "{side} dataset: missing column '{column}'")
            }
            Self::ReservedColumn { side, column } => {
                write!(f, "{side} dataset: column '{column}' is reserved for quilt output")
            }
            Self::DuplicateColumn(column) => write!(f, "duplicate column '{column}' in header"),
            Self::ColumnCollision(column) => {
                write!(f, "key pass would produce column '{column}' twice")
            }
            Self::InvalidCandidate { index, rows } => write!(
                f,
                "candidate search chose right row {index}, but the right dataset has {rows} rows"
            ),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl ReconError {
    /// True for errors caused by the configuration rather than the data or the environment.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_)
                | Self::ConfigValidation(_)
                | Self::InvalidThreshold(_)
                | Self::MissingColumn { .. }
                | Self::ReservedColumn { .. }
                | Self::ColumnCollision(_)
        )
    }
}
