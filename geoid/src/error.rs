use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoidError {
    #[error("query cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: isize, col: isize },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid coordinate lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid DMS angle {0:?}")]
    InvalidDms(String),

    #[error("invalid hemisphere {0:?}")]
    InvalidHemisphere(String),

    #[error("{0}")]
    DataSource(#[from] DataSourceError),
}

/// Failures while fetching or parsing raw grid data.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid sample {token:?}")]
    Parse { line: usize, token: String },

    #[error("line {line}: expected {expected} samples, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("no samples")]
    Empty,

    #[error("invalid grid file len {len} for {path:?}")]
    Len { len: u64, path: PathBuf },
}

impl From<std::io::Error> for GeoidError {
    fn from(e: std::io::Error) -> Self {
        Self::DataSource(DataSourceError::Io(e))
    }
}
