use std::collections::HashMap;
use std::fs::{self, Permissions};
use std::ops::Range;
use std::path::Path;

use log::debug;
use plotters::prelude::*;
use plotters::style::register_font;
use thousands::Separable;

use crate::error::PlotError;
use crate::perf_series::SeriesMap;

const FONT: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const PLOT_WIDTH: u32 = 1000;
const PLOT_HEIGHT: u32 = 600;

const CAPTION: &str = "Сравнение времени выполнения алгоритмов";
const X_DESC: &str = "Размер матрицы";
const Y_DESC: &str = "Время выполнения (сек)";

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Draw(err.to_string())
}

/// Renders `series` as a PNG line chart at `path`, replacing any existing file.
///
/// The image is drawn into a temporary file next to `path` and renamed over it
/// once encoding has finished, so a failed render leaves `path` untouched.
pub fn write_plot(series: &SeriesMap, path: &Path) -> Result<(), PlotError> {
    register_font(FONT, FontStyle::Normal, FONT_DATA).map_err(|_| PlotError::Font)?;

    let output_err = |source| PlotError::Output {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".method-times-plot").suffix(".png");
    if let Some(permissions) = output_permissions(path) {
        builder.permissions(permissions);
    }
    let staging = builder.tempfile_in(dir).map_err(output_err)?;

    draw_chart(series, staging.path())?;

    staging.persist(path).map_err(|err| output_err(err.error))?;
    debug!("chart written to {}", path.display());

    Ok(())
}

/// Mode for the staged image: the one of the file being replaced, or 0644
/// (subject to umask) for a new file.
#[cfg(unix)]
fn output_permissions(path: &Path) -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(
        fs::metadata(path)
            .map(|meta| meta.permissions())
            .unwrap_or_else(|_| Permissions::from_mode(0o644)),
    )
}

#[cfg(not(unix))]
fn output_permissions(path: &Path) -> Option<Permissions> {
    fs::metadata(path).ok().map(|meta| meta.permissions())
}

fn draw_chart(series: &SeriesMap, path: &Path) -> Result<(), PlotError> {
    let mut color_map = HashMap::new();
    color_map.insert("Serial", RED.to_rgba());
    color_map.insert("P.Rows", GREEN.to_rgba());
    color_map.insert("P.Columns", BLUE.to_rgba());
    color_map.insert("P.Blocks", MAGENTA.to_rgba());

    let root = BitMapBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (x_range, y_range) = axis_ranges(series);

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .caption(CAPTION, (FONT, 24))
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_label_formatter(&|v| (v.round() as u64).separate_with_commas())
        .y_label_formatter(&|v| format!("{:.3}", v))
        .x_labels(12)
        .y_labels(12)
        .label_style((FONT, 14))
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .draw()
        .map_err(draw_err)?;

    for (idx, s) in series.series().iter().enumerate() {
        let color = color_map
            .get(s.method.as_str())
            .copied()
            .unwrap_or_else(|| Palette99::pick(idx).to_rgba());
        let style = color.filled().stroke_width(2);

        chart
            .draw_series(
                LineSeries::new(
                    series
                        .sizes()
                        .iter()
                        .zip(s.times.iter())
                        .filter(|(_, time)| time.is_finite())
                        .map(|(size, time)| (*size as f64, *time)),
                    style,
                )
                .point_size(4),
            )
            .map_err(draw_err)?
            .label(s.method.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, 14))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;

    Ok(())
}

/// Data bounds with 10% padding, never extending below zero. A zero-width
/// domain is widened so the chart always has a drawable range.
fn axis_ranges(series: &SeriesMap) -> (Range<f64>, Range<f64>) {
    let x_min = series.sizes().iter().copied().min().unwrap_or(0) as f64;
    let x_max = series.sizes().iter().copied().max().unwrap_or(1) as f64;
    let x_padding = match x_max - x_min {
        diff if diff > 0.0 => diff / 10.0,
        _ => (x_max / 10.0).max(1.0),
    };
    let x_start = (x_min - x_padding).max(0.0);

    let (t_min, t_max) = series.time_bounds().unwrap_or((0.0, 1.0));
    let y_min = t_min.min(0.0);
    let y_max = if t_max > y_min { t_max } else { y_min + 1.0 };
    let y_padding = (y_max - y_min) / 10.0;

    (
        x_start..(x_max + x_padding),
        y_min..(y_max + y_padding),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::perf::{Measurement, METHODS};
    use crate::perf_series::build_series;
    use crate::perf_table::Table;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn sample_series() -> SeriesMap {
        let mut rows = Vec::new();
        for (i, size) in [100u64, 500, 1000, 2000].iter().enumerate() {
            for (j, method) in METHODS.iter().enumerate() {
                let time = (i + 1) as f64 * (i + 1) as f64 / (j + 1) as f64;
                rows.push(Measurement::new(*size, method, time));
            }
        }
        let table = Table::new("times.txt", rows);
        build_series(&table, &METHODS, &table.sorted_sizes()).unwrap()
    }

    #[test]
    fn test_write_plot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");

        write_plot(&sample_series(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.len() > PNG_MAGIC.len());
        assert_eq!(&bytes[..PNG_MAGIC.len()], PNG_MAGIC);

        // only the chart itself is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_plot_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");

        write_plot(&sample_series(), &first).unwrap();
        write_plot(&sample_series(), &second).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_write_plot_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        fs::write(&path, b"stale").unwrap();

        write_plot(&sample_series(), &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..PNG_MAGIC.len()], PNG_MAGIC);
    }

    #[test]
    fn test_write_plot_skips_non_finite_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        let table = Table::new(
            "times.txt",
            vec![
                Measurement::new(10, "Serial", f64::INFINITY),
                Measurement::new(20, "Serial", 1.0),
            ],
        );
        let series = build_series(&table, &["Serial"], &table.sorted_sizes()).unwrap();

        let (_, y) = axis_ranges(&series);
        assert!(y.start.is_finite() && y.end.is_finite());

        write_plot(&series, &path).unwrap();
        assert_eq!(&fs::read(&path).unwrap()[..PNG_MAGIC.len()], PNG_MAGIC);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_plot_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");

        write_plot(&sample_series(), &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();
        write_plot(&sample_series(), &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_labels_use_bundled_font() {
        assert!(register_font(FONT, FontStyle::Normal, FONT_DATA).is_ok());

        for text in [CAPTION, X_DESC, Y_DESC] {
            let (width, height) = FontDesc::from((FONT, 14)).box_size(text).unwrap();
            assert!(width > 0 && height > 0, "{text}");
        }
        assert_eq!(X_DESC, "Размер матрицы");
    }

    #[test]
    fn test_write_plot_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plot.png");

        let err = write_plot(&sample_series(), &path).unwrap_err();
        assert!(matches!(err, PlotError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_axis_ranges() {
        let (x, y) = axis_ranges(&sample_series());
        assert!(x.start < 100.0 && x.end > 2000.0);
        assert_eq!(y.start, 0.0);
        assert!(y.end > 16.0);
    }

    #[test]
    fn test_axis_ranges_single_point() {
        let table = Table::new("times.txt", vec![Measurement::new(64, "Serial", 0.0)]);
        let series = build_series(&table, &["Serial"], &table.sorted_sizes()).unwrap();

        let (x, y) = axis_ranges(&series);
        assert!(x.start < 64.0 && x.end > 64.0);
        assert!(y.start < y.end);
    }
}
