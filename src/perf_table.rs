use std::path::{Path, PathBuf};

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use log::debug;

use crate::error::PlotError;
use crate::perf::Measurement;

const REQUIRED_COLUMNS: [&str; 3] = ["Size", "Method", "Time"];

/// Timing rows in file order. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    rows: Vec<Measurement>,
}

impl Table {
    pub fn new(path: impl Into<PathBuf>, rows: Vec<Measurement>) -> Self {
        Self {
            path: path.into(),
            rows,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[Measurement] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct sizes in the order they first appear in the file.
    pub fn sizes(&self) -> Vec<u64> {
        let mut seen = HashSet::with_hasher(RandomState::new());
        self.rows
            .iter()
            .map(|row| row.size)
            .filter(|size| seen.insert(*size))
            .collect()
    }

    /// Distinct sizes, ascending. This is the x-axis domain of the chart.
    pub fn sorted_sizes(&self) -> Vec<u64> {
        let mut sizes = self.sizes();
        sizes.sort_unstable();
        sizes
    }

    /// The first row for `method` at `size`. Later duplicates are never seen.
    pub fn find(&self, method: &str, size: u64) -> Option<&Measurement> {
        self.rows
            .iter()
            .find(|row| row.size == size && row.method == method)
    }

    /// Checks that every (method, size) pair has exactly one row.
    ///
    /// Pairs are visited in `methods` order, then ascending size, so the
    /// reported violation is always the same one for a given table.
    pub fn validate(&self, methods: &[&str]) -> Result<(), PlotError> {
        if self.is_empty() {
            return Err(PlotError::EmptyTable {
                path: self.path.clone(),
            });
        }

        let mut counts: HashMap<(&str, u64), usize, RandomState> =
            HashMap::with_capacity_and_hasher(self.rows.len(), RandomState::new());
        for row in self.rows.iter() {
            *counts.entry((row.method.as_str(), row.size)).or_insert(0) += 1;
        }

        let sizes = self.sorted_sizes();
        for method in methods {
            for &size in sizes.iter() {
                match counts.get(&(*method, size)).copied().unwrap_or(0) {
                    0 => {
                        return Err(PlotError::MissingMeasurement {
                            method: method.to_string(),
                            size,
                        })
                    }
                    1 => {}
                    count => {
                        return Err(PlotError::DuplicateMeasurement {
                            method: method.to_string(),
                            size,
                            count,
                        })
                    }
                }
            }
        }

        Ok(())
    }
}

/// Reads a comma separated table with a `Size,Method,Time` header.
///
/// Times must be finite; `inf` and `NaN` parse as floats but have no place
/// on the chart.
pub fn load_table(path: &Path) -> Result<Table, PlotError> {
    let load_err = |source| PlotError::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(load_err)?;

    let headers = reader.headers().map_err(load_err)?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(PlotError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<Measurement>, _>>()
        .map_err(load_err)?;

    if let Some(row) = rows.iter().find(|row| !row.time.is_finite()) {
        return Err(PlotError::NonFiniteTime {
            path: path.to_path_buf(),
            method: row.method.clone(),
            size: row.size,
        });
    }

    debug!("read {} rows from {}", rows.len(), path.display());

    Ok(Table::new(path, rows))
}
