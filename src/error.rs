//! Error type shared by every stage of the allocation pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration ---
    #[error("only one default sector is allowed; got {0:?}")]
    MultipleDefaultSectors(Vec<String>),

    #[error("variable {variable} is assigned to both {first} and {second}")]
    OverlappingSector {
        variable: String,
        first: String,
        second: String,
    },

    #[error("sector {0} is listed more than once")]
    DuplicateSector(String),

    #[error("sector assignment is empty")]
    EmptyAssignment,

    #[error("column {0} not found in allocation table")]
    MissingColumn(String),

    #[error("sector {0} not found in vertical profile")]
    UnknownSector(String),

    #[error("variable {0} not found in field")]
    UnknownVariable(String),

    #[error("invalid vertical grid: {0}")]
    InvalidGrid(String),

    #[error("column {column} is not monotonic in normalized pressure")]
    NonMonotonic { column: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // --- Shape ---
    #[error("fraction vector has {got} layers, expected {expected}")]
    FractionLength { expected: usize, got: usize },

    #[error("variable {0} has no LAY dimension")]
    MissingLayerDim(String),

    #[error("variable {variable} has {got} layers; expansion needs exactly 1")]
    LayerExtent { variable: String, got: usize },

    #[error("layer index {index} out of range for {nlays} layers")]
    LayerIndex { index: usize, nlays: usize },

    #[error("variable {variable}: {reason}")]
    BadVariable { variable: String, reason: String },

    #[error("cannot stack fields: {0}")]
    StackMismatch(String),

    // --- I/O ---
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{line}: column {column}: cannot parse {value:?} as a number", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    #[error("json error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the fatal configuration class (bad sectors, columns, grids).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MultipleDefaultSectors(_)
                | Self::OverlappingSector { .. }
                | Self::DuplicateSector(_)
                | Self::EmptyAssignment
                | Self::MissingColumn(_)
                | Self::UnknownSector(_)
                | Self::UnknownVariable(_)
                | Self::InvalidGrid(_)
                | Self::NonMonotonic { .. }
                | Self::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
