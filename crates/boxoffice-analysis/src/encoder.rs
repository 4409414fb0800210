//! One-hot encoding of categorical columns
//!
//! The encoder learns the vocabulary of each categorical column from the table
//! it is fitted on and expands every column into one `0`/`1` indicator column
//! per category, named `<column>_<category>`.
//!
//! # Vocabulary Order
//!
//! Categories of a numeric column are ordered by value, those of a text column
//! lexicographically. Null cells form a trailing category rendered as `nan`.
//! The vocabulary can be serialized and reused against new data, where unseen
//! categories encode as an all-zero row for that column's group instead of
//! failing.
//!
//! # Example
//!
//! ```
//! use boxoffice_analysis::{encoder::one_hot_encode, frame};
//! use polars::df;
//!
//! let table = df!(
//!     "price" => [10.0, 0.0],
//!     "room" => ["B", "A"]
//! )?;
//! let (encoded, _encoder) = one_hot_encode(&table, &["room"], &["price"])?;
//!
//! assert_eq!(frame::column_names(&encoded), ["price", "room_A", "room_B"]);
//! assert_eq!(frame::numbers(&encoded, "room_A")?, vec![Some(0.0), Some(1.0)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::frame::{self, FrameError};

/// Label used for the null category in output column names
pub const MISSING_CATEGORY: &str = "nan";

/// Learned vocabulary of a single categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Source column label
    pub column: String,
    /// Categories in output order; `None` is the null category
    pub categories: Vec<Option<String>>,
}

impl CategoryGroup {
    fn fit(column_name: &str, column: &Column) -> Result<Self, FrameError> {
        let mut categories = frame::sorted_categories(column)?
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        if column.null_count() > 0 {
            categories.push(None);
        }
        Ok(Self {
            column: column_name.to_owned(),
            categories,
        })
    }

    /// Output column names, one per category
    #[must_use]
    pub fn output_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| {
                format!(
                    "{}_{}",
                    self.column,
                    category.as_deref().unwrap_or(MISSING_CATEGORY)
                )
            })
            .collect()
    }

    fn encode(&self, column: &Column) -> Result<Vec<Column>, FrameError> {
        let values = frame::text_values(column)?;
        let mut indicators = vec![Vec::with_capacity(values.len()); self.categories.len()];
        for value in &values {
            let hit = self.categories.iter().position(|c| c == value);
            for (i, indicator) in indicators.iter_mut().enumerate() {
                indicator.push(if hit == Some(i) { 1.0 } else { 0.0 });
            }
        }
        Ok(self
            .output_names()
            .into_iter()
            .zip(indicators)
            .map(|(name, values)| Series::new(name.into(), values).into())
            .collect())
    }
}

/// One-hot encoder fitted on a fixed list of categorical columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    groups: Vec<CategoryGroup>,
}

impl CategoricalEncoder {
    /// Learns the vocabulary of `columns` from `table`
    pub fn fit<S>(table: &DataFrame, columns: &[S]) -> Result<Self, FrameError>
    where
        S: AsRef<str>,
    {
        let groups = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                CategoryGroup::fit(name, frame::require(table, name)?)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { groups })
    }

    #[must_use]
    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// All indicator column names in output order
    #[must_use]
    pub fn output_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(CategoryGroup::output_names)
            .collect()
    }

    /// Builds the dense `f64` indicator columns for `table`
    ///
    /// Rows are aligned with `table`. Values outside the learned vocabulary
    /// produce zeros in every indicator of their group.
    pub fn transform(&self, table: &DataFrame) -> Result<Vec<Column>, FrameError> {
        let mut output = Vec::new();
        for group in &self.groups {
            output.extend(group.encode(frame::require(table, &group.column)?)?);
        }
        Ok(output)
    }
}

/// Fits an encoder on `categorical` and assembles passthrough-then-encoded columns
pub fn one_hot_encode<S>(
    table: &DataFrame,
    categorical: &[S],
    passthrough: &[S],
) -> Result<(DataFrame, CategoricalEncoder), FrameError>
where
    S: AsRef<str>,
{
    let encoder = CategoricalEncoder::fit(table, categorical)?;
    let mut columns = passthrough
        .iter()
        .map(|name| frame::require(table, name.as_ref()).cloned())
        .collect::<Result<Vec<_>, _>>()?;
    columns.extend(encoder.transform(table)?);
    let encoded = DataFrame::new(columns).map_err(frame::layout_error)?;
    Ok((encoded, encoder))
}
