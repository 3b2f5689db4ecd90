use crate::error::PlotError;
use crate::perf_table::Table;

/// Times for one method, aligned with [`SeriesMap::sizes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub method: String,
    pub times: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMap {
    sizes: Vec<u64>,
    series: Vec<Series>,
}

impl SeriesMap {
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// One entry per method, in the order the methods were requested.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get(&self, method: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.method == method)
            .map(|s| s.times.as_slice())
    }

    /// Smallest and largest finite time over every series.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.times.iter().copied())
            .filter(|t| t.is_finite())
            .fold(None, |bounds, t| match bounds {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })
    }
}

/// Looks up one time per (method, size) pair.
///
/// When several rows share a pair the first one in the table is used. A
/// pair with no row at all fails the whole build.
pub fn build_series(
    table: &Table,
    methods: &[&str],
    sizes: &[u64],
) -> Result<SeriesMap, PlotError> {
    let mut series = Vec::with_capacity(methods.len());

    for &method in methods {
        let times = sizes
            .iter()
            .map(|&size| {
                table
                    .find(method, size)
                    .map(|row| row.time)
                    .ok_or_else(|| PlotError::MissingMeasurement {
                        method: method.to_string(),
                        size,
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        series.push(Series {
            method: method.to_string(),
            times,
        });
    }

    Ok(SeriesMap {
        sizes: sizes.to_vec(),
        series,
    })
}
