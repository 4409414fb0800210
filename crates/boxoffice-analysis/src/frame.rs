//! Column access over polars data frames
//!
//! Raw exports and processed tables are both held as a polars [`DataFrame`].
//! The helpers here read a column as `f64` or as text and attach the column
//! label to any polars error.
//!
//! # Numeric Columns
//!
//! A column is numeric when it casts to `f64` without turning any value into
//! null. Integer and float columns always qualify, and so does a text column
//! without a single value.
//!
//! # Example
//!
//! ```
//! use boxoffice_analysis::frame;
//! use polars::df;
//!
//! let table = df!(
//!     "price" => [Some(10.0), None],
//!     "venue" => [Some("Sala 1"), None]
//! )?;
//!
//! assert_eq!(frame::numbers(&table, "price")?, vec![Some(10.0), None]);
//! assert!(frame::numbers(&table, "venue").is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;

use polars::prelude::*;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum FrameError {
    #[display("required column '{name}' is missing")]
    MissingColumn { name: String },
    #[display("column '{name}' is not numeric")]
    NotNumeric { name: String, source: PolarsError },
    #[display("cannot read column '{name}'")]
    Column { name: String, source: PolarsError },
    #[display("invalid table layout")]
    Layout { source: PolarsError },
}

pub(crate) fn column_error(name: &str) -> impl FnOnce(PolarsError) -> FrameError + '_ {
    move |source| FrameError::Column {
        name: name.to_owned(),
        source,
    }
}

pub(crate) fn layout_error(source: PolarsError) -> FrameError {
    FrameError::Layout { source }
}

/// Looks up a column by label
pub fn require<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column, FrameError> {
    frame.column(name).map_err(|_| FrameError::MissingColumn {
        name: name.to_owned(),
    })
}

/// Column labels in order
#[must_use]
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}

#[must_use]
pub fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

/// Returns `true` when every cell is null (vacuously true for zero rows)
#[must_use]
pub fn is_all_null(column: &Column) -> bool {
    column.null_count() == column.len()
}

/// The column cast to `f64`, failing if any value does not convert
pub fn float_column(frame: &DataFrame, name: &str) -> Result<Series, FrameError> {
    require(frame, name)?
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|source| FrameError::NotNumeric {
            name: name.to_owned(),
            source,
        })
}

/// Numeric values of a column
pub fn numbers(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, FrameError> {
    let floats = float_column(frame, name)?;
    let values = floats.f64().map_err(column_error(name))?;
    Ok(values.into_iter().collect())
}

/// Cells of a column rendered as text, `None` for null
///
/// Numbers are rendered with [`format_number`].
pub fn text_values(column: &Column) -> Result<Vec<Option<String>>, FrameError> {
    let name = column.name().as_str();
    let series = column.as_materialized_series();
    if is_numeric(series.dtype()) {
        let floats = series
            .cast(&DataType::Float64)
            .map_err(column_error(name))?;
        let values = floats.f64().map_err(column_error(name))?;
        return Ok(values.into_iter().map(|v| v.map(format_number)).collect());
    }
    let text = series.cast(&DataType::String).map_err(column_error(name))?;
    let values = text.str().map_err(column_error(name))?;
    Ok(values
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

/// Text cells of the column labelled `name`
pub fn texts(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>, FrameError> {
    text_values(require(frame, name)?)
}

/// Distinct non-null values of a column rendered as text, in sorted order
///
/// Numeric columns sort by value (`9` before `10`), text columns
/// lexicographically.
pub fn sorted_categories(column: &Column) -> Result<Vec<String>, FrameError> {
    let name = column.name().as_str();
    let series = column.as_materialized_series();
    if is_numeric(series.dtype()) {
        let floats = series
            .cast(&DataType::Float64)
            .map_err(column_error(name))?;
        let mut values = floats
            .f64()
            .map_err(column_error(name))?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        values.dedup_by(|a, b| a == b);
        return Ok(values.into_iter().map(format_number).collect());
    }
    let distinct = text_values(column)?
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>();
    Ok(distinct.into_iter().collect())
}

/// Builds a `f64` column
#[must_use]
pub fn float_series(name: &str, values: Vec<Option<f64>>) -> Column {
    Series::new(name.into(), values).into()
}

/// Formats a number the way it is shown in category labels and reports
///
/// Integral values carry no fractional part, so a rating of `14.0` reads `14`.
///
/// ```
/// use boxoffice_analysis::frame::format_number;
///
/// assert_eq!(format_number(1.0), "1");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(12.5), "12.5");
/// ```
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_owned()
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    fn sample() -> DataFrame {
        df!(
            "rating" => [Some(14_i64), Some(9), None, Some(10), Some(14)],
            "venue" => [Some("Sala 2"), Some("Sala 10"), Some("Sala 1"), None, Some("Sala 2")],
            "empty" => [None::<&str>, None, None, None, None]
        )
        .unwrap()
    }

    #[test]
    fn test_integer_column_reads_as_float() {
        assert_eq!(
            numbers(&sample(), "rating").unwrap(),
            vec![Some(14.0), Some(9.0), None, Some(10.0), Some(14.0)]
        );
    }

    #[test]
    fn test_text_column_is_not_numeric() {
        assert!(matches!(
            numbers(&sample(), "venue"),
            Err(FrameError::NotNumeric { .. })
        ));
        assert!(matches!(
            numbers(&sample(), "missing"),
            Err(FrameError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_all_null_text_column_is_numeric() {
        let frame = sample();
        assert_eq!(numbers(&frame, "empty").unwrap(), vec![None; 5]);
        assert!(is_all_null(require(&frame, "empty").unwrap()));
    }

    #[test]
    fn test_numeric_categories_sort_by_value() {
        let frame = sample();
        assert_eq!(
            sorted_categories(require(&frame, "rating").unwrap()).unwrap(),
            ["9", "10", "14"]
        );
        assert_eq!(
            sorted_categories(require(&frame, "venue").unwrap()).unwrap(),
            ["Sala 1", "Sala 10", "Sala 2"]
        );
    }

    #[test]
    fn test_text_values_render_numbers() {
        let frame = sample();
        assert_eq!(
            text_values(require(&frame, "rating").unwrap()).unwrap(),
            vec![
                Some("14".to_owned()),
                Some("9".to_owned()),
                None,
                Some("10".to_owned()),
                Some("14".to_owned()),
            ]
        );
    }
}
