use std::path::PathBuf;
use std::process;
use std::time::Instant;

use env_logger::Env;
use log::{debug, error, info};
use structopt::StructOpt;

mod error;
mod perf;
mod perf_plot;
mod perf_series;
mod perf_table;

use crate::error::PlotError;
use crate::perf::METHODS;
use crate::perf_plot::write_plot;
use crate::perf_series::{build_series, SeriesMap};
use crate::perf_table::load_table;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "method-times-plot",
    about = "Charts matrix multiplication time per size for each method"
)]
struct Opt {
    /// Timing table with Size, Method and Time columns
    #[structopt(short, long, parse(from_os_str), default_value = "times.txt")]
    input: PathBuf,

    /// PNG chart to write, replaced if it exists
    #[structopt(short, long, parse(from_os_str), default_value = "task5_plot.png")]
    output: PathBuf,
}

/// A successful run prints nothing unless `RUST_LOG` asks for more.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();

    let opt = Opt::from_args();

    // The elapsed time is measured by the lifetime of `run_scope`.
    let run_scope = scopeguard::guard(Instant::now(), |start| {
        debug!("finished in {:?}", start.elapsed());
    });

    let code = exit_code(run(&opt));

    drop(run_scope);
    process::exit(code);
}

/// Reports a failed run once, through the logger, and maps it to an exit code.
fn exit_code(result: Result<(), PlotError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

fn run(opt: &Opt) -> Result<(), PlotError> {
    let table = load_table(&opt.input)?;
    info!("Loaded {} rows from {}", table.len(), table.path().display());

    let unknown = table
        .rows()
        .iter()
        .filter(|row| !METHODS.contains(&row.method.as_str()))
        .count();
    if unknown > 0 {
        debug!("ignoring {unknown} rows for methods outside {:?}", METHODS);
    }

    table.validate(&METHODS)?;

    let sizes = table.sorted_sizes();
    debug!("sizes: {:?}", sizes);

    let series = build_series(&table, &METHODS, &sizes)?;
    log_speedups(&series);

    write_plot(&series, &opt.output)?;
    info!(
        "Plotted {} methods over {} sizes to {}",
        series.series().len(),
        sizes.len(),
        opt.output.display()
    );

    Ok(())
}

/// Logs each method's speedup over the serial baseline at the largest size.
fn log_speedups(series: &SeriesMap) {
    let (Some(&size), Some(&baseline)) = (
        series.sizes().last(),
        series.get(METHODS[0]).and_then(|times| times.last()),
    ) else {
        return;
    };

    for s in series.series().iter().filter(|s| s.method != METHODS[0]) {
        if let Some(&time) = s.times.last() {
            info!(
                "{:>10} at size {}: {:.3} s, {:.2}x vs {}",
                s.method,
                size,
                time,
                baseline / time,
                METHODS[0]
            );
        }
    }
}
