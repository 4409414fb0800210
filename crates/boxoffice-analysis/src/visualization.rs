//! Chart output for raw and finished tables
//!
//! Visualization is a side effect the pipeline depends on but never blocks
//! on: sinks return a [`VisualizationError`] and the caller logs it and moves
//! on.
//!
//! Exploratory charts are described by a format-independent [`Chart`] and
//! handed to [`VisualizationSink::chart`]. The correlation heatmap has its own
//! entry point because it is computed from the table by the sink.

use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

use boxoffice_stats::{
    correlation::{CorrelationMethod, correlation_matrix},
    histogram::Histogram,
};
use polars::prelude::DataFrame;

use crate::frame;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum VisualizationError {
    #[display("table has no numeric columns to correlate")]
    NoNumericColumns,
    #[display("failed to create output directory {}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[display("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Data of a chart, independent of the output format
#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    /// One histogram panel per column
    Histograms(Vec<(String, Histogram)>),
    /// One bar per label
    Bars { bars: Vec<(String, usize)>, color: String },
    Scatter {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// File stem of the rendered artifact, e.g. `02_event_type`
    pub name: String,
    pub title: String,
    pub body: ChartBody,
}

/// Capability that renders charts for a table into a named output folder
pub trait VisualizationSink {
    /// Renders the Spearman correlation heatmap of the numeric columns of `table`
    ///
    /// Returns the paths of the produced artifacts.
    fn correlation_heatmap(
        &self,
        table: &DataFrame,
        folder: &str,
    ) -> Result<Vec<PathBuf>, VisualizationError>;

    /// Renders a single exploratory chart; sinks without chart support skip it
    fn chart(&self, chart: &Chart, folder: &str) -> Result<Vec<PathBuf>, VisualizationError> {
        let _ = (chart, folder);
        Ok(vec![])
    }
}

/// Sink that produces nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl VisualizationSink for NoopSink {
    fn correlation_heatmap(
        &self,
        _table: &DataFrame,
        _folder: &str,
    ) -> Result<Vec<PathBuf>, VisualizationError> {
        Ok(vec![])
    }
}

/// Writes SVG charts under `<root>/<folder>/`
///
/// The heatmap produces `correlation.csv` and `correlation_heatmap.svg`, every
/// other chart `<name>.svg`.
#[derive(Debug, Clone)]
pub struct SvgChartSink {
    root: PathBuf,
}

impl SvgChartSink {
    #[must_use]
    pub fn new<P>(root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { root: root.into() }
    }

    fn folder(&self, folder: &str) -> Result<PathBuf, VisualizationError> {
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).map_err(|source| VisualizationError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

impl VisualizationSink for SvgChartSink {
    fn correlation_heatmap(
        &self,
        table: &DataFrame,
        folder: &str,
    ) -> Result<Vec<PathBuf>, VisualizationError> {
        let (names, series): (Vec<String>, Vec<Vec<f64>>) = frame::column_names(table)
            .into_iter()
            .filter_map(|name| {
                let values = frame::numbers(table, &name).ok()?;
                Some((name, values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
            })
            .unzip();
        if names.is_empty() {
            return Err(VisualizationError::NoNumericColumns);
        }
        let names = names.iter().map(String::as_str).collect::<Vec<_>>();
        let series = series.iter().map(Vec::as_slice).collect::<Vec<_>>();
        let matrix = correlation_matrix(&series, CorrelationMethod::Spearman);

        let dir = self.folder(folder)?;
        let csv_path = dir.join("correlation.csv");
        write_file(&csv_path, &render_matrix_csv(&names, &matrix))?;
        let svg_path = dir.join("correlation_heatmap.svg");
        write_file(&svg_path, &render_heatmap_svg(&names, &matrix))?;
        Ok(vec![csv_path, svg_path])
    }

    fn chart(&self, chart: &Chart, folder: &str) -> Result<Vec<PathBuf>, VisualizationError> {
        let path = self.folder(folder)?.join(format!("{}.svg", chart.name));
        write_file(&path, &render_chart_svg(chart))?;
        Ok(vec![path])
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), VisualizationError> {
    fs::write(path, content).map_err(|source| VisualizationError::Write {
        path: path.to_owned(),
        source,
    })
}

fn render_matrix_csv(names: &[&str], matrix: &[Vec<f64>]) -> String {
    let mut out = String::from("column");
    for name in names {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');
    for (name, row) in names.iter().zip(matrix) {
        out.push_str(name);
        for r in row {
            if r.is_nan() {
                out.push(',');
            } else {
                let _ = write!(out, ",{r:.4}");
            }
        }
        out.push('\n');
    }
    out
}

const CELL: usize = 36;
const CHAR_WIDTH: usize = 7;
const MAX_ANNOTATED: usize = 30;

/// Renders a correlation matrix as an SVG heatmap (blue = -1, red = +1)
#[must_use]
pub fn render_heatmap_svg(names: &[&str], matrix: &[Vec<f64>]) -> String {
    let n = names.len();
    let label_space = names.iter().map(|s| s.len()).max().unwrap_or(0) * CHAR_WIDTH + 10;
    let size = label_space + n * CELL + 10;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(svg, r#"<rect width="{size}" height="{size}" fill="white"/>"#);

    for (i, name) in names.iter().enumerate() {
        let offset = label_space + i * CELL + CELL / 2;
        let name = escape_xml(name);
        let _ = writeln!(
            svg,
            r#"<text x="{x}" y="{offset}" text-anchor="end" dominant-baseline="middle">{name}</text>"#,
            x = label_space - 5,
        );
        let _ = writeln!(
            svg,
            r#"<text transform="translate({offset},{y}) rotate(-90)" dominant-baseline="middle">{name}</text>"#,
            y = label_space - 5,
        );
    }

    for (i, row) in matrix.iter().enumerate() {
        for (j, r) in row.iter().enumerate() {
            let x = label_space + j * CELL;
            let y = label_space + i * CELL;
            let _ = writeln!(
                svg,
                r#"<rect x="{x}" y="{y}" width="{CELL}" height="{CELL}" fill="{}"/>"#,
                cell_color(*r)
            );
            if n <= MAX_ANNOTATED && !r.is_nan() {
                let _ = writeln!(
                    svg,
                    r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-size="9">{r:.2}</text>"#,
                    x + CELL / 2,
                    y + CELL / 2,
                );
            }
        }
    }
    svg.push_str("</svg>\n");
    svg
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_color(r: f64) -> String {
    const NEGATIVE: [f64; 3] = [59.0, 76.0, 192.0];
    const NEUTRAL: [f64; 3] = [221.0, 221.0, 221.0];
    const POSITIVE: [f64; 3] = [180.0, 4.0, 38.0];
    if r.is_nan() {
        return "#bbbbbb".to_owned();
    }
    let (to, t) = if r < 0.0 {
        (NEGATIVE, -r)
    } else {
        (POSITIVE, r)
    };
    let t = t.clamp(0.0, 1.0);
    let channel = |k: usize| (NEUTRAL[k] + (to[k] - NEUTRAL[k]) * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", channel(0), channel(1), channel(2))
}

const TITLE_SPACE: f64 = 36.0;
const PANEL_WIDTH: f64 = 280.0;
const PANEL_HEIGHT: f64 = 200.0;
const BAR_SLOT: f64 = 56.0;

/// Renders an exploratory chart as SVG
#[must_use]
pub fn render_chart_svg(chart: &Chart) -> String {
    match &chart.body {
        ChartBody::Histograms(panels) => render_histograms(&chart.title, panels),
        ChartBody::Bars { bars, color } => render_bars(&chart.title, bars, color),
        ChartBody::Scatter {
            x_label,
            y_label,
            points,
        } => render_scatter(&chart.title, x_label, y_label, points),
    }
}

/// Rectangle of a plot in SVG coordinates, `y` growing downwards
#[derive(Debug, Clone, Copy)]
struct Area {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Area {
    fn bottom(self) -> f64 {
        self.y + self.height
    }

    fn draw_axes(self, svg: &mut String) {
        let _ = writeln!(
            svg,
            r#"<path d="M{:.1},{:.1}V{:.1}H{:.1}" fill="none" stroke="black"/>"#,
            self.x,
            self.y,
            self.bottom(),
            self.x + self.width,
        );
    }

    fn label(self, svg: &mut String, x: f64, y: f64, anchor: &str, text: &str) {
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}">{}</text>"#,
            escape_xml(text)
        );
    }
}

fn open_svg(width: f64, height: f64, title: &str) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(svg, r#"<rect width="{width:.0}" height="{height:.0}" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="22" text-anchor="middle" font-size="15">{}</text>"#,
        width / 2.0,
        escape_xml(title)
    );
    svg
}

#[expect(clippy::cast_precision_loss)]
fn render_histograms(title: &str, panels: &[(String, Histogram)]) -> String {
    let mut columns = panels.len().isqrt();
    if columns * columns < panels.len() {
        columns += 1;
    }
    let columns = columns.max(1);
    let rows = panels.len().div_ceil(columns).max(1);
    let mut svg = open_svg(
        PANEL_WIDTH * columns as f64,
        TITLE_SPACE + PANEL_HEIGHT * rows as f64,
        title,
    );

    for (i, (name, histogram)) in panels.iter().enumerate() {
        let area = Area {
            x: PANEL_WIDTH * (i % columns) as f64 + 40.0,
            y: TITLE_SPACE + PANEL_HEIGHT * (i / columns) as f64 + 24.0,
            width: PANEL_WIDTH - 60.0,
            height: PANEL_HEIGHT - 60.0,
        };
        area.label(&mut svg, area.x + area.width / 2.0, area.y - 8.0, "middle", name);
        let counts = histogram.counts();
        let max_count = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let bin_width = area.width / counts.len() as f64;
        for (bin, &count) in counts.iter().enumerate() {
            let height = area.height * count as f64 / max_count;
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{bin_width:.1}" height="{height:.1}" fill="steelblue"/>"#,
                area.x + bin_width * bin as f64,
                area.bottom() - height,
            );
        }
        area.draw_axes(&mut svg);
        let edges = histogram.edges();
        if let (Some(first), Some(last)) = (edges.first(), edges.last()) {
            let y = area.bottom() + 14.0;
            area.label(&mut svg, area.x, y, "middle", &frame::format_number(*first));
            let x = area.x + area.width;
            area.label(&mut svg, x, y, "middle", &frame::format_number(*last));
        }
        let top = frame::format_number(max_count);
        area.label(&mut svg, area.x - 4.0, area.y + 4.0, "end", &top);
    }
    svg.push_str("</svg>\n");
    svg
}

#[expect(clippy::cast_precision_loss)]
fn render_bars(title: &str, bars: &[(String, usize)], color: &str) -> String {
    let area = Area {
        x: 60.0,
        y: TITLE_SPACE + 16.0,
        width: (BAR_SLOT * bars.len() as f64).max(240.0),
        height: 240.0,
    };
    let label_space = bars
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0) as f64
        * 5.0;
    let mut svg = open_svg(
        area.x + area.width + 20.0,
        area.bottom() + label_space + 30.0,
        title,
    );
    let max_count = bars.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1) as f64;
    for (i, (label, count)) in bars.iter().enumerate() {
        let height = area.height * *count as f64 / max_count;
        let x = area.x + BAR_SLOT * i as f64 + BAR_SLOT * 0.15;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{:.1}" width="{:.1}" height="{height:.1}" fill="{color}"/>"#,
            area.bottom() - height,
            BAR_SLOT * 0.7,
        );
        let center = x + BAR_SLOT * 0.35;
        let y = area.bottom() - height - 4.0;
        area.label(&mut svg, center, y, "middle", &count.to_string());
        let _ = writeln!(
            svg,
            r#"<text transform="translate({center:.1},{:.1}) rotate(-45)" text-anchor="end">{}</text>"#,
            area.bottom() + 12.0,
            escape_xml(label)
        );
    }
    area.draw_axes(&mut svg);
    svg.push_str("</svg>\n");
    svg
}

fn render_scatter(title: &str, x_label: &str, y_label: &str, points: &[(f64, f64)]) -> String {
    let area = Area {
        x: 70.0,
        y: TITLE_SPACE + 10.0,
        width: 440.0,
        height: 300.0,
    };
    let mut svg = open_svg(area.x + area.width + 30.0, area.bottom() + 50.0, title);
    let (x_min, x_max) = value_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = value_range(points.iter().map(|p| p.1));
    for &(x, y) in points {
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="steelblue" fill-opacity="0.5"/>"#,
            area.x + area.width * (x - x_min) / (x_max - x_min),
            area.bottom() - area.height * (y - y_min) / (y_max - y_min),
        );
    }
    area.draw_axes(&mut svg);

    let below = area.bottom() + 14.0;
    area.label(&mut svg, area.x, below, "middle", &frame::format_number(x_min));
    let right = area.x + area.width;
    area.label(&mut svg, right, below, "middle", &frame::format_number(x_max));
    let center = area.x + area.width / 2.0;
    area.label(&mut svg, center, below + 20.0, "middle", x_label);
    area.label(&mut svg, area.x - 4.0, area.bottom(), "end", &frame::format_number(y_min));
    area.label(&mut svg, area.x - 4.0, area.y + 4.0, "end", &frame::format_number(y_max));
    let _ = writeln!(
        svg,
        r#"<text transform="translate(16,{:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
        area.y + area.height / 2.0,
        escape_xml(y_label)
    );
    svg.push_str("</svg>\n");
    svg
}

/// Finite range of `values`, widened when it is a single point
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo < hi {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 0.5, lo + 0.5)
    } else {
        (0.0, 1.0)
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_extremes() {
        assert_eq!(cell_color(1.0), "#b40426");
        assert_eq!(cell_color(-1.0), "#3b4cc0");
        assert_eq!(cell_color(0.0), "#dddddd");
        assert_eq!(cell_color(f64::NAN), "#bbbbbb");
    }

    #[test]
    fn test_svg_has_one_cell_per_pair() {
        let names = ["a", "b<c"];
        let matrix = vec![vec![1.0, -0.5], vec![-0.5, 1.0]];
        let svg = render_heatmap_svg(&names, &matrix);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect x=").count(), 4);
        assert!(svg.contains("b&lt;c"));
        assert!(svg.contains(">-0.50<"));
    }

    fn bar_chart(bars: Vec<(String, usize)>) -> Chart {
        Chart {
            name: "02_event_type".to_owned(),
            title: "Sessions by event type".to_owned(),
            body: ChartBody::Bars {
                bars,
                color: "steelblue".to_owned(),
            },
        }
    }

    #[test]
    fn test_bar_chart_has_one_bar_per_label() {
        let svg = render_chart_svg(&bar_chart(vec![
            ("Filme".to_owned(), 12),
            ("Show & Teatro".to_owned(), 3),
        ]));
        assert_eq!(svg.matches("<rect x=").count(), 2);
        assert!(svg.contains("Show &amp; Teatro"));
        assert!(svg.contains(">12<"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_histogram_panels() {
        let panels = ["a", "b", "c"]
            .iter()
            .map(|name| {
                let histogram = Histogram::new(&[1.0, 2.0, 2.0, 5.0], 4).unwrap();
                ((*name).to_owned(), histogram)
            })
            .collect();
        let svg = render_chart_svg(&Chart {
            name: "01_histograms".to_owned(),
            title: "Histograms".to_owned(),
            body: ChartBody::Histograms(panels),
        });
        // 2 x 2 grid
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="560""#));
        assert_eq!(svg.matches("<rect x=").count(), 12);
        assert_eq!(svg.matches("<path ").count(), 3);
    }

    #[test]
    fn test_scatter_of_single_point() {
        let svg = render_chart_svg(&Chart {
            name: "06_price_vs_quantity".to_owned(),
            title: "Price vs quantity".to_owned(),
            body: ChartBody::Scatter {
                x_label: "price".to_owned(),
                y_label: "sold".to_owned(),
                points: vec![(10.0, 3.0)],
            },
        });
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains("NaN"));
        assert_eq!(value_range([4.0].into_iter()), (3.5, 4.5));
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn test_svg_sink_writes_named_chart() {
        let root = std::env::temp_dir().join(format!("boxoffice-charts-{}", std::process::id()));
        let sink = SvgChartSink::new(&root);
        let paths = sink
            .chart(&bar_chart(vec![("Filme".to_owned(), 1)]), "exploration")
            .unwrap();
        assert_eq!(paths, [root.join("exploration/02_event_type.svg")]);
        assert!(paths[0].exists());
        assert!(NoopSink.chart(&bar_chart(vec![]), "x").unwrap().is_empty());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_heatmap_uses_rank_correlation() {
        let root = std::env::temp_dir().join(format!("boxoffice-heatmap-{}", std::process::id()));
        let table = polars::df!(
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "cube" => [1.0, 8.0, 27.0, 64.0, 125.0],
            "label" => ["a", "b", "c", "d", "e"]
        )
        .unwrap();
        SvgChartSink::new(&root)
            .correlation_heatmap(&table, "preprocessing")
            .unwrap();
        let csv = fs::read_to_string(root.join("preprocessing/correlation.csv")).unwrap();
        assert_eq!(
            csv,
            "column,x,cube\nx,1.0000,1.0000\ncube,1.0000,1.0000\n"
        );
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_matrix_csv() {
        let csv = render_matrix_csv(&["x", "y"], &[vec![1.0, f64::NAN], vec![f64::NAN, 1.0]]);
        assert_eq!(csv, "column,x,y\nx,1.0000,\ny,,1.0000\n");
    }
}
