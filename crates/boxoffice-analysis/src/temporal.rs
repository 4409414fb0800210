//! Calendar features derived from session and exhibition-period text
//!
//! Session timestamps are exported as `DD/MM/YYYY - HH:MM`; exhibition periods
//! as `DD/MM/YYYY` optionally followed by ` - ` and more text. Four features
//! are derived from them:
//!
//! | feature          | source                    | parse failure          |
//! |------------------|---------------------------|------------------------|
//! | hour             | full session timestamp    | null hour              |
//! | day of week      | date part of session      | fatal [`TemporalError`] |
//! | day of month     | date part of session      | fatal [`TemporalError`] |
//! | days in theaters | exhibition start and end  | fatal [`TemporalError`] |
//!
//! Null source cells always produce null features.
//!
//! # Example
//!
//! ```
//! use boxoffice_analysis::temporal;
//!
//! let session = "25/12/2023 - 20:30";
//! assert_eq!(temporal::session_hour(session), Some(20));
//!
//! let date = temporal::parse_leading_date(session)?;
//! assert_eq!(temporal::day_of_week(date), 0); // Monday
//! assert_eq!(temporal::day_of_month(date), 25);
//! # Ok::<(), chrono::ParseError>(())
//! ```

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, Timelike as _};
use polars::prelude::DataFrame;

use crate::frame::{self, FrameError};

/// Strict format of the full session timestamp
pub const SESSION_DATETIME_FORMAT: &str = "%d/%m/%Y - %H:%M";
/// Format of a calendar date
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Separator between the date and whatever follows it
pub const DATE_SEPARATOR: &str = " - ";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TemporalError {
    #[display("row {row}: cannot parse '{value}' in column '{column}' as DD/MM/YYYY")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[display("{_0}")]
    Frame(FrameError),
}

impl From<FrameError> for TemporalError {
    fn from(err: FrameError) -> Self {
        TemporalError::Frame(err)
    }
}

/// Parses a full session timestamp
#[must_use]
pub fn parse_session_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, SESSION_DATETIME_FORMAT).ok()
}

/// Hour of day (0-23) of a session timestamp, `None` when it does not parse
#[must_use]
pub fn session_hour(text: &str) -> Option<u32> {
    parse_session_datetime(text).map(|dt| dt.hour())
}

/// Parses the text before the first ` - ` as `DD/MM/YYYY`
pub fn parse_leading_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    let date_part = text
        .split_once(DATE_SEPARATOR)
        .map_or(text, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
}

/// Day of week, 0 = Monday through 6 = Sunday
#[must_use]
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Calendar day, 1-31
#[must_use]
pub fn day_of_month(date: NaiveDate) -> u32 {
    date.day()
}

/// Whole days from `start` to `end`; negative when `end` precedes `start`
#[must_use]
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Adds the hour-of-session column
///
/// Cells that do not match [`SESSION_DATETIME_FORMAT`] yield null.
pub fn extract_hour(table: &mut DataFrame, source: &str, output: &str) -> Result<(), FrameError> {
    let hours = frame::texts(table, source)?
        .iter()
        .map(|cell| {
            cell.as_deref()
                .and_then(session_hour)
                .map(f64::from)
        })
        .collect::<Vec<_>>();
    let unparsed = hours.iter().filter(|h| h.is_none()).count();
    if unparsed > 0 {
        tracing::debug!(column = source, unparsed, "session hours left null");
    }
    set_column(table, output, hours)
}

fn set_column(
    table: &mut DataFrame,
    name: &str,
    values: Vec<Option<f64>>,
) -> Result<(), FrameError> {
    table
        .with_column(frame::float_series(name, values))
        .map_err(frame::layout_error)?;
    Ok(())
}

/// Adds the day-of-week column from the date part of the session timestamp
pub fn extract_day_of_week(
    table: &mut DataFrame,
    source: &str,
    output: &str,
) -> Result<(), TemporalError> {
    let values = map_leading_dates(table, source, day_of_week)?;
    set_column(table, output, values)?;
    Ok(())
}

/// Adds the day-of-month column from the date part of the session timestamp
pub fn extract_day_of_month(
    table: &mut DataFrame,
    source: &str,
    output: &str,
) -> Result<(), TemporalError> {
    let values = map_leading_dates(table, source, day_of_month)?;
    set_column(table, output, values)?;
    Ok(())
}

/// Adds the days-in-theaters column and removes both period columns
#[expect(clippy::cast_precision_loss)]
pub fn extract_days_in_theaters(
    table: &mut DataFrame,
    start: &str,
    end: &str,
    output: &str,
) -> Result<(), TemporalError> {
    let start_dates = leading_dates(table, start)?;
    let end_dates = leading_dates(table, end)?;
    let days = start_dates
        .into_iter()
        .zip(end_dates)
        .map(|(s, e)| Some(days_between(s?, e?) as f64))
        .collect();
    set_column(table, output, days)?;
    for label in [start, end] {
        table.drop_in_place(label).map_err(frame::layout_error)?;
    }
    Ok(())
}

fn map_leading_dates<F>(
    table: &DataFrame,
    source: &str,
    f: F,
) -> Result<Vec<Option<f64>>, TemporalError>
where
    F: Fn(NaiveDate) -> u32,
{
    Ok(leading_dates(table, source)?
        .into_iter()
        .map(|date| date.map(|d| f64::from(f(d))))
        .collect())
}

fn leading_dates(
    table: &DataFrame,
    column: &str,
) -> Result<Vec<Option<NaiveDate>>, TemporalError> {
    frame::texts(table, column)?
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.as_deref()
                .map(|text| {
                    parse_leading_date(text).map_err(|source| TemporalError::InvalidDate {
                        column: column.to_owned(),
                        row,
                        value: text.to_owned(),
                        source,
                    })
                })
                .transpose()
        })
        .collect()
}
