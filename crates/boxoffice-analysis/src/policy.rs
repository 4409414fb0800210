//! Missing-data and leakage policies applied before feature extraction
//!
//! Each policy is a standalone function over a [`DataFrame`] so it can be
//! exercised and overridden independently of the full pipeline.

use polars::prelude::*;

use crate::frame::{self, FrameError};

/// Drops a column that leaks the target (e.g. total sales = price × quantity)
///
/// Returns `true` if the column was present.
pub fn drop_leakage_column(table: &mut DataFrame, label: &str) -> bool {
    table.drop_in_place(label).is_ok()
}

/// Drops the last column when every value in it is null
///
/// Trailing delimiters in the export produce an unnamed, empty last column.
/// Returns the dropped column's label.
pub fn drop_trailing_empty_column(table: &mut DataFrame) -> Option<String> {
    let last = table.get_columns().last()?;
    if !frame::is_all_null(last) {
        return None;
    }
    let name = last.name().to_string();
    table.drop_in_place(&name).ok()?;
    Some(name)
}

/// Fills null prices with `fill_value` (an untracked price means free admission)
///
/// The price column becomes `f64`. Returns the number of filled cells.
pub fn fill_missing_price(
    table: &mut DataFrame,
    label: &str,
    fill_value: f64,
) -> Result<usize, FrameError> {
    let prices = frame::float_column(table, label)?;
    let filled = prices.null_count();
    let prices = prices
        .f64()
        .map_err(frame::column_error(label))?
        .fill_null_with_values(fill_value)
        .map_err(frame::column_error(label))?;
    table
        .with_column(prices.into_series())
        .map_err(frame::layout_error)?;
    Ok(filled)
}

/// Drops rows without a target value (the target is never imputed)
///
/// The target column becomes `f64`. Returns the number of dropped rows.
pub fn drop_rows_missing_target(table: &mut DataFrame, label: &str) -> Result<usize, FrameError> {
    let target = frame::float_column(table, label)?;
    let present = target.is_not_null();
    table.with_column(target).map_err(frame::layout_error)?;
    let before = table.height();
    *table = table.filter(&present).map_err(frame::layout_error)?;
    Ok(before - table.height())
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    fn table() -> DataFrame {
        df!(
            "Valor do Ingresso" => [None, Some(20_i64), None],
            "Quantidade de ingressos vendidos" => [Some(3_i64), None, Some(5)],
            "Total de Vendas" => [Some(0.0), None, Some(0.0)],
            "Unnamed: 3" => [None::<&str>, None, None]
        )
        .unwrap()
    }

    #[test]
    fn test_leakage_column_dropped() {
        let mut table = table();
        assert!(drop_leakage_column(&mut table, "Total de Vendas"));
        assert!(table.column("Total de Vendas").is_err());
        assert!(!drop_leakage_column(&mut table, "Total de Vendas"));
    }

    #[test]
    fn test_trailing_empty_column() {
        let mut table = table();
        assert_eq!(
            drop_trailing_empty_column(&mut table).as_deref(),
            Some("Unnamed: 3")
        );
        // the new last column has values, so nothing more is dropped
        assert_eq!(drop_trailing_empty_column(&mut table), None);
        assert_eq!(table.width(), 3);
    }

    #[test]
    fn test_fill_price() {
        let mut table = table();
        assert_eq!(fill_missing_price(&mut table, "Valor do Ingresso", 0.0).unwrap(), 2);
        assert_eq!(
            frame::numbers(&table, "Valor do Ingresso").unwrap(),
            vec![Some(0.0), Some(20.0), Some(0.0)]
        );
        assert_eq!(
            table.column("Valor do Ingresso").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_drop_missing_target() {
        let mut table = table();
        let dropped =
            drop_rows_missing_target(&mut table, "Quantidade de ingressos vendidos").unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(table.height(), 2);
        assert_eq!(
            frame::numbers(&table, "Valor do Ingresso").unwrap(),
            vec![None, None]
        );
    }

    #[test]
    fn test_missing_price_column_is_fatal() {
        let mut table = table();
        table.drop_in_place("Valor do Ingresso").unwrap();
        assert!(matches!(
            fill_missing_price(&mut table, "Valor do Ingresso", 0.0),
            Err(FrameError::MissingColumn { .. })
        ));
    }
}
