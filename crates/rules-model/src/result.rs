//! Operation outputs and their row-aligned form.
//!
//! An operation returns an [`OperationOutput`]: a scalar to broadcast, a
//! per-row column, or a per-group table. The dispatcher turns each output
//! into an [`AlignedResult`] with exactly one value per row of the frame the
//! operation ran against, and collects them into [`OperationResults`].

use polars::prelude::{AnyValue, DataFrame, DataType, NamedFrom, PlSmallStr, Series};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A single value an operation can broadcast to every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl OperationValue {
    /// Build a list value, keeping the given order.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OperationValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Repeat this value `height` times as a series named `name`.
    pub fn to_series(&self, name: &str, height: usize) -> Result<Series> {
        let name = PlSmallStr::from(name);
        let series = match self {
            OperationValue::Null => Series::full_null(name, height, &DataType::Null),
            OperationValue::Bool(v) => Series::new(name, vec![*v; height]),
            OperationValue::Int(v) => Series::new(name, vec![*v; height]),
            OperationValue::Float(v) => Series::new(name, vec![*v; height]),
            OperationValue::Str(v) => Series::new(name, vec![v.as_str(); height]),
            OperationValue::List(items) => {
                let inner = Series::new(PlSmallStr::EMPTY, items.as_slice());
                Series::new(name, [inner]).new_from_index(0, height)
            }
        };
        Ok(series)
    }
}

impl From<bool> for OperationValue {
    fn from(value: bool) -> Self {
        OperationValue::Bool(value)
    }
}

impl From<i64> for OperationValue {
    fn from(value: i64) -> Self {
        OperationValue::Int(value)
    }
}

impl From<usize> for OperationValue {
    fn from(value: usize) -> Self {
        OperationValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for OperationValue {
    fn from(value: f64) -> Self {
        OperationValue::Float(value)
    }
}

impl From<String> for OperationValue {
    fn from(value: String) -> Self {
        OperationValue::Str(value)
    }
}

impl From<&str> for OperationValue {
    fn from(value: &str) -> Self {
        OperationValue::Str(value.to_string())
    }
}

impl From<Vec<String>> for OperationValue {
    fn from(value: Vec<String>) -> Self {
        OperationValue::List(value)
    }
}

impl<T: Into<OperationValue>> From<Option<T>> for OperationValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OperationValue::Null, Into::into)
    }
}

/// What an operation implementation returns.
#[derive(Debug, Clone)]
pub enum OperationOutput {
    /// One value for every row.
    Scalar(OperationValue),
    /// One value per row of the evaluation frame, in row order.
    Column(Series),
    /// One value per group. `table` holds the grouping columns and
    /// `value_column`; groups missing from the table align to null.
    Grouped {
        table: DataFrame,
        grouping: Vec<String>,
        value_column: String,
    },
}

impl OperationOutput {
    pub fn scalar(value: impl Into<OperationValue>) -> Self {
        OperationOutput::Scalar(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OperationOutput::Scalar(_) => "scalar",
            OperationOutput::Column(_) => "column",
            OperationOutput::Grouped { .. } => "grouped",
        }
    }
}

/// An operation result re-expanded to the rows of the evaluation frame.
#[derive(Debug, Clone)]
pub struct AlignedResult {
    /// One value per row, named after the operation id.
    pub values: Series,
    /// The per-group table, for grouped outputs.
    pub groups: Option<DataFrame>,
}

impl AlignedResult {
    pub fn new(values: Series) -> Self {
        Self {
            values,
            groups: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at row `index`.
    pub fn get(&self, index: usize) -> Result<AnyValue<'_>> {
        Ok(self.values.get(index)?)
    }

    /// Row values as JSON, list cells becoming arrays.
    pub fn to_json_values(&self) -> Result<Vec<Value>> {
        (0..self.values.len())
            .map(|i| Ok(any_to_json(self.values.get(i)?)))
            .collect()
    }
}

fn any_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Bool(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Float32(v) => {
            serde_json::Number::from_f64(f64::from(v)).map_or(Value::Null, Value::Number)
        }
        AnyValue::Float64(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        AnyValue::List(inner) => Value::Array(
            (0..inner.len())
                .filter_map(|i| inner.get(i).ok().map(any_to_json))
                .collect(),
        ),
        other => match rules_common::any_to_i64(other.clone()) {
            Some(v) => Value::from(v),
            None => Value::String(rules_common::any_to_string(other)),
        },
    }
}

/// Aligned results keyed by operation id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OperationResults {
    entries: Vec<(String, AlignedResult)>,
}

impl OperationResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the result for `operation_id`.
    pub fn insert(&mut self, operation_id: impl Into<String>, result: AlignedResult) {
        let operation_id = operation_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == operation_id) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((operation_id, result)),
        }
    }

    pub fn get(&self, operation_id: &str) -> Option<&AlignedResult> {
        self.entries
            .iter()
            .find(|(id, _)| id == operation_id)
            .map(|(_, result)| result)
    }

    pub fn contains(&self, operation_id: &str) -> bool {
        self.get(operation_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlignedResult)> {
        self.entries.iter().map(|(id, result)| (id.as_str(), result))
    }

    /// Merge another result set; later entries win.
    pub fn extend(&mut self, other: OperationResults) {
        for (id, result) in other.entries {
            self.insert(id, result);
        }
    }
}

impl IntoIterator for OperationResults {
    type Item = (String, AlignedResult);
    type IntoIter = std::vec::IntoIter<(String, AlignedResult)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_broadcasts_to_height() {
        let series = OperationValue::Int(7).to_series("$count", 3).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.name().as_str(), "$count");
        assert_eq!(series.get(2).unwrap(), AnyValue::Int64(7));
    }

    #[test]
    fn list_broadcasts_as_list_column() {
        let value = OperationValue::list(["AE", "DM"]);
        let aligned = AlignedResult::new(value.to_series("$domains", 2).unwrap());
        assert_eq!(aligned.len(), 2);
        assert_eq!(
            aligned.to_json_values().unwrap(),
            vec![serde_json::json!(["AE", "DM"]), serde_json::json!(["AE", "DM"])]
        );
    }

    #[test]
    fn null_scalar_is_all_null() {
        let series = OperationValue::from(None::<i64>).to_series("$x", 2).unwrap();
        assert_eq!(series.null_count(), 2);
    }

    #[test]
    fn results_replace_by_id_and_keep_order() {
        let one = AlignedResult::new(OperationValue::Int(1).to_series("a", 1).unwrap());
        let two = AlignedResult::new(OperationValue::Int(2).to_series("b", 1).unwrap());
        let three = AlignedResult::new(OperationValue::Int(3).to_series("a", 1).unwrap());

        let mut results = OperationResults::new();
        results.insert("a", one);
        results.insert("b", two);
        results.insert("a", three);

        assert_eq!(results.len(), 2);
        let ids: Vec<_> = results.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            results.get("a").unwrap().get(0).unwrap(),
            AnyValue::Int64(3)
        );
    }
}
