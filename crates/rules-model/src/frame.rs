//! Tabular frame abstraction.
//!
//! A dataset under evaluation is either fully materialised ([`DataFrame`]) or
//! a deferred query plan ([`LazyFrame`]), for example a domain assembled from
//! several partitions. Operations build their logic on top of [`DatasetFrame::lazy`]
//! so both representations go through the same filter/group/join plan and
//! only materialise when the result is collected.

use polars::prelude::{
    DataFrame, IntoLazy, LazyFrame, PlSmallStr, UnionArgs, col, concat, len,
};
use rules_common::any_to_i64;

use crate::error::Result;

/// Name of the temporary column used to count rows lazily.
const ROW_COUNT_COLUMN: &str = "__row_count";

/// A dataset held eagerly in memory or as a lazy, possibly partitioned, plan.
#[derive(Clone)]
pub enum DatasetFrame {
    /// Materialised frame.
    Eager(DataFrame),
    /// Deferred frame; evaluated when collected.
    Lazy(LazyFrame),
}

impl std::fmt::Debug for DatasetFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetFrame::Eager(df) => f
                .debug_tuple("Eager")
                .field(&df.shape())
                .finish(),
            DatasetFrame::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<DataFrame> for DatasetFrame {
    fn from(df: DataFrame) -> Self {
        DatasetFrame::Eager(df)
    }
}

impl From<LazyFrame> for DatasetFrame {
    fn from(lf: LazyFrame) -> Self {
        DatasetFrame::Lazy(lf)
    }
}

impl Default for DatasetFrame {
    fn default() -> Self {
        DatasetFrame::Eager(DataFrame::empty())
    }
}

impl DatasetFrame {
    /// Build a lazy frame from row-wise partitions, kept in partition order.
    pub fn partitioned(partitions: Vec<DataFrame>) -> Result<Self> {
        if partitions.is_empty() {
            return Ok(DatasetFrame::default());
        }
        let parts: Vec<LazyFrame> = partitions.into_iter().map(IntoLazy::lazy).collect();
        let lf = concat(parts, UnionArgs::default())?;
        Ok(DatasetFrame::Lazy(lf))
    }

    /// Returns true for deferred frames.
    pub fn is_lazy(&self) -> bool {
        matches!(self, DatasetFrame::Lazy(_))
    }

    /// A lazy plan over this frame. Cheap for both variants.
    pub fn lazy(&self) -> LazyFrame {
        match self {
            DatasetFrame::Eager(df) => df.clone().lazy(),
            DatasetFrame::Lazy(lf) => lf.clone(),
        }
    }

    /// Materialise the frame.
    pub fn collect(&self) -> Result<DataFrame> {
        match self {
            DatasetFrame::Eager(df) => Ok(df.clone()),
            DatasetFrame::Lazy(lf) => Ok(lf.clone().collect()?),
        }
    }

    /// Number of rows. Lazy frames evaluate a count-only plan.
    pub fn height(&self) -> Result<usize> {
        match self {
            DatasetFrame::Eager(df) => Ok(df.height()),
            DatasetFrame::Lazy(lf) => count_rows(lf.clone()),
        }
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        match self {
            DatasetFrame::Eager(df) => Ok(df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect()),
            DatasetFrame::Lazy(lf) => {
                let schema = lf.clone().collect_schema()?;
                Ok(schema.iter_names().map(|name| name.to_string()).collect())
            }
        }
    }

    /// Whether the frame has a column with exactly this name.
    pub fn has_column(&self, name: &str) -> Result<bool> {
        Ok(self.column_names()?.iter().any(|c| c == name))
    }
}

/// Count the rows produced by a lazy plan.
pub fn count_rows(lf: LazyFrame) -> Result<usize> {
    let counted = lf
        .select([len().alias(PlSmallStr::from_static(ROW_COUNT_COLUMN))])
        .collect()?;
    let value = counted.column(ROW_COUNT_COLUMN)?.get(0)?;
    Ok(any_to_i64(value).unwrap_or(0).max(0) as usize)
}

/// Select a subset of columns from a lazy plan.
pub fn select_columns(lf: LazyFrame, columns: &[String]) -> LazyFrame {
    lf.select(
        columns
            .iter()
            .map(|name| col(name.as_str()))
            .collect::<Vec<_>>(),
    )
}
