//! Summaries and charts of a raw table for first-look data exploration

use std::{collections::HashMap, path::PathBuf};

use boxoffice_stats::{
    descriptive::DescriptiveStats, histogram::Histogram, percentiles::Percentiles,
};
use polars::prelude::{DataFrame, DataType};

use crate::{
    config::RawColumns,
    frame::{self, FrameError},
    visualization::{Chart, ChartBody, VisualizationSink},
};

/// Quartile points reported for numeric columns
pub const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Bins per histogram panel
pub const HISTOGRAM_BINS: usize = 50;

#[derive(Debug, Clone)]
pub struct NumericSummary {
    pub stats: DescriptiveStats,
    pub quartiles: Percentiles,
}

#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: DataType,
    pub non_null: usize,
    pub nulls: usize,
    /// Present for numeric columns with at least one value
    pub numeric: Option<NumericSummary>,
}

#[derive(Debug, Clone)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl TableSummary {
    #[must_use]
    pub fn new(table: &DataFrame) -> Self {
        let columns = table
            .get_columns()
            .iter()
            .map(|column| {
                let name = column.name().as_str();
                let nulls = column.null_count();
                let numeric = frame::is_numeric(column.dtype())
                    .then(|| finite_numbers(table, name))
                    .and_then(|values| {
                        let stats = DescriptiveStats::new(values.iter().copied())?;
                        Some(NumericSummary {
                            stats,
                            quartiles: Percentiles::new(&values, &QUARTILES),
                        })
                    });
                ColumnSummary {
                    name: name.to_owned(),
                    dtype: column.dtype().clone(),
                    non_null: column.len() - nulls,
                    nulls,
                    numeric,
                }
            })
            .collect();
        Self {
            rows: table.height(),
            columns,
        }
    }

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }
}

fn finite_numbers(table: &DataFrame, name: &str) -> Vec<f64> {
    frame::numbers(table, name)
        .map(|values| values.into_iter().flatten().filter(|v| v.is_finite()).collect())
        .unwrap_or_default()
}

/// Sorted distinct non-null values of a column, `None` if the column is absent
#[must_use]
pub fn distinct_values(table: &DataFrame, name: &str) -> Option<Vec<String>> {
    let column = table.column(name).ok()?;
    frame::sorted_categories(column).ok()
}

/// Non-null values of a column with their number of occurrences
///
/// Most frequent first; ties keep label order.
pub fn value_counts(table: &DataFrame, name: &str) -> Result<Vec<(String, usize)>, FrameError> {
    let mut counts = HashMap::<String, usize>::new();
    for value in frame::texts(table, name)?.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts = counts.into_iter().collect::<Vec<_>>();
    counts.sort_by(|(a_label, a), (b_label, b)| b.cmp(a).then_with(|| a_label.cmp(b_label)));
    Ok(counts)
}

/// Number of null cells per column, in column order
#[must_use]
pub fn null_counts(table: &DataFrame) -> Vec<(String, usize)> {
    table
        .get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.null_count()))
        .collect()
}

/// Builds the exploratory charts of a raw export
///
/// Histograms of every numeric column, value counts of the event type, age
/// rating and session type, null counts per column and ticket price against
/// tickets sold. Charts whose columns are missing are left out.
#[must_use]
pub fn exploration_charts(table: &DataFrame, columns: &RawColumns) -> Vec<Chart> {
    let mut charts = Vec::new();

    let panels = table
        .get_columns()
        .iter()
        .filter(|column| frame::is_numeric(column.dtype()))
        .filter_map(|column| {
            let name = column.name().as_str();
            let histogram = Histogram::new(&finite_numbers(table, name), HISTOGRAM_BINS)?;
            Some((name.to_owned(), histogram))
        })
        .collect::<Vec<_>>();
    if !panels.is_empty() {
        charts.push(Chart {
            name: "01_histograms".to_owned(),
            title: "Histograms of numeric columns".to_owned(),
            body: ChartBody::Histograms(panels),
        });
    }

    let distributions = [
        ("02_event_type", &columns.event_type, "steelblue"),
        ("03_age_rating", &columns.age_rating, "coral"),
        ("04_session_type", &columns.session_type, "mediumseagreen"),
    ];
    for (chart_name, column, color) in distributions {
        match value_counts(table, column) {
            Ok(bars) => charts.push(Chart {
                name: chart_name.to_owned(),
                title: format!("Rows by {column}"),
                body: ChartBody::Bars {
                    bars,
                    color: color.to_owned(),
                },
            }),
            Err(err) => tracing::warn!(chart = chart_name, error = %err, "chart skipped"),
        }
    }

    charts.push(Chart {
        name: "05_null_counts".to_owned(),
        title: "Null values per column".to_owned(),
        body: ChartBody::Bars {
            bars: null_counts(table),
            color: "red".to_owned(),
        },
    });

    match price_quantity_points(table, columns) {
        Ok(points) => charts.push(Chart {
            name: "06_price_vs_quantity".to_owned(),
            title: format!("{} vs {}", columns.ticket_price, columns.tickets_sold),
            body: ChartBody::Scatter {
                x_label: columns.ticket_price.clone(),
                y_label: columns.tickets_sold.clone(),
                points,
            },
        }),
        Err(err) => tracing::warn!(chart = "06_price_vs_quantity", error = %err, "chart skipped"),
    }
    charts
}

/// Rows where both ticket price and tickets sold are present
fn price_quantity_points(
    table: &DataFrame,
    columns: &RawColumns,
) -> Result<Vec<(f64, f64)>, FrameError> {
    let prices = frame::numbers(table, &columns.ticket_price)?;
    let sold = frame::numbers(table, &columns.tickets_sold)?;
    Ok(prices
        .into_iter()
        .zip(sold)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect())
}

/// Renders every chart through `sink`, logging failures instead of returning them
pub fn render_exploration_charts<V>(
    table: &DataFrame,
    columns: &RawColumns,
    sink: &V,
    folder: &str,
) -> Vec<PathBuf>
where
    V: VisualizationSink + ?Sized,
{
    let mut written = Vec::new();
    for chart in exploration_charts(table, columns) {
        match sink.chart(&chart, folder) {
            Ok(paths) => written.extend(paths),
            Err(err) => tracing::warn!(chart = %chart.name, error = %err, "chart skipped"),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;
    use crate::visualization::NoopSink;

    fn table() -> DataFrame {
        df!(
            "Espaço" => [Some("B"), Some("A"), None, Some("B")],
            "Valor" => [Some(10.0), Some(20.0), None, Some(30.0)],
            "Vazio" => [None::<&str>, None, None, None]
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let summary = TableSummary::new(&table());
        assert_eq!(summary.shape(), (4, 3));

        let space = &summary.columns[0];
        assert_eq!(space.dtype, DataType::String);
        assert_eq!((space.non_null, space.nulls), (3, 1));
        assert!(space.numeric.is_none());

        let price = summary.columns[1].numeric.as_ref().unwrap();
        assert_eq!(price.stats.count, 3);
        assert!((price.stats.mean - 20.0).abs() < 1e-12);
        assert!((price.stats.sample_std_dev - 10.0).abs() < 1e-12);
        assert_eq!(price.quartiles.get(50.0), Some(20.0));

        // all-null columns have no statistics
        assert!(summary.columns[2].numeric.is_none());
    }

    #[test]
    fn test_distinct_values() {
        assert_eq!(
            distinct_values(&table(), "Espaço").unwrap(),
            vec!["A".to_owned(), "B".to_owned()]
        );
        assert_eq!(
            distinct_values(&table(), "Valor").unwrap(),
            vec!["10", "20", "30"]
        );
        assert!(distinct_values(&table(), "Missing").is_none());
    }

    #[test]
    fn test_value_counts_most_frequent_first() {
        let table = df!("Tipo" => ["Show", "Filme", "Filme", "Teatro", "Show", "Filme"]).unwrap();
        assert_eq!(
            value_counts(&table, "Tipo").unwrap(),
            vec![
                ("Filme".to_owned(), 3),
                ("Show".to_owned(), 2),
                ("Teatro".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn test_null_counts() {
        assert_eq!(
            null_counts(&table()),
            vec![
                ("Espaço".to_owned(), 1),
                ("Valor".to_owned(), 1),
                ("Vazio".to_owned(), 4),
            ]
        );
    }

    fn raw_table() -> DataFrame {
        df!(
            "Tipo de Evento" => ["Filme", "Filme", "Show"],
            "Classificação Etária" => ["14", "Livre", "14"],
            "Valor do Ingresso" => [Some(20_i64), None, Some(50)],
            "Quantidade de ingressos vendidos" => [Some(35_i64), Some(12), None]
        )
        .unwrap()
    }

    #[test]
    fn test_charts_of_raw_export() {
        let charts = exploration_charts(&raw_table(), &RawColumns::default());
        let names = charts.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        // no session type column
        assert_eq!(
            names,
            [
                "01_histograms",
                "02_event_type",
                "03_age_rating",
                "05_null_counts",
                "06_price_vs_quantity",
            ]
        );

        let ChartBody::Histograms(panels) = &charts[0].body else {
            panic!("expected histograms");
        };
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].1.counts().len(), HISTOGRAM_BINS);

        let ChartBody::Scatter { points, .. } = &charts[4].body else {
            panic!("expected a scatter plot");
        };
        assert_eq!(points, &vec![(20.0, 35.0)]);
    }

    #[test]
    fn test_noop_sink_writes_nothing() {
        let written =
            render_exploration_charts(&raw_table(), &RawColumns::default(), &NoopSink, "x");
        assert!(written.is_empty());
    }
}
