use serde::Deserialize;

/// The algorithm variants compared on the chart, in legend order.
pub const METHODS: [&str; 4] = ["Serial", "P.Rows", "P.Columns", "P.Blocks"];

/// One row of the timing table. Columns other than these three are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    /// Matrix dimension.
    pub size: u64,
    pub method: String,
    /// Execution time in seconds.
    pub time: f64,
}

#[cfg(test)]
impl Measurement {
    pub fn new(size: u64, method: &str, time: f64) -> Self {
        Self {
            size,
            method: method.to_string(),
            time,
        }
    }
}
