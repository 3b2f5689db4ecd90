use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to read table {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table {} has no `{column}` column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("table {} contains no rows", path.display())]
    EmptyTable { path: PathBuf },

    #[error("time for method `{method}` at size {size} in {} is not a finite number", path.display())]
    NonFiniteTime {
        path: PathBuf,
        method: String,
        size: u64,
    },

    #[error("no measurement for method `{method}` at size {size}")]
    MissingMeasurement { method: String, size: u64 },

    #[error("{count} measurements for method `{method}` at size {size}, expected one")]
    DuplicateMeasurement {
        method: String,
        size: u64,
        count: usize,
    },

    #[error("bundled chart font could not be loaded")]
    Font,

    #[error("failed to draw chart: {0}")]
    Draw(String),

    #[error("failed to write chart {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
