//! Result alignment.
//!
//! Turns an [`OperationOutput`] into an [`AlignedResult`] with exactly one
//! value per row of the evaluation frame, in row order.

use polars::prelude::{
    DataFrame, Expr, IntoLazy, JoinArgs, JoinType, PlSmallStr, SortMultipleOptions, col,
};
use rules_model::{AlignedResult, DatasetFrame, EngineError, OperationOutput, Result};

const ROW_INDEX: &str = "__row_index";

/// Align `output` to the rows of `frame`, naming the values `operation_id`.
///
/// # Errors
///
/// Returns [`EngineError::Alignment`] when a column output does not have one
/// value per row.
pub fn align_output(
    operation: &str,
    operation_id: &str,
    output: OperationOutput,
    frame: &DatasetFrame,
) -> Result<AlignedResult> {
    let height = frame.height()?;
    let name = PlSmallStr::from(operation_id);
    match output {
        OperationOutput::Scalar(value) => Ok(AlignedResult::new(value.to_series(operation_id, height)?)),
        OperationOutput::Column(mut series) => {
            if series.len() != height {
                return Err(EngineError::Alignment {
                    operation: operation.to_string(),
                    expected: height,
                    actual: series.len(),
                });
            }
            series.rename(name);
            Ok(AlignedResult::new(series))
        }
        OperationOutput::Grouped {
            table,
            grouping,
            value_column,
        } => {
            let values = expand_groups(frame, &table, &grouping, &value_column, operation_id)?;
            if values.height() != height {
                return Err(EngineError::Alignment {
                    operation: operation.to_string(),
                    expected: height,
                    actual: values.height(),
                });
            }
            let series = values
                .column(operation_id)?
                .as_materialized_series()
                .clone();
            Ok(AlignedResult {
                values: series,
                groups: Some(table),
            })
        }
    }
}

/// Left-join the per-group table onto the row-indexed frame and restore
/// row order.
fn expand_groups(
    frame: &DatasetFrame,
    table: &DataFrame,
    grouping: &[String],
    value_column: &str,
    operation_id: &str,
) -> Result<DataFrame> {
    let keys: Vec<Expr> = grouping.iter().map(|g| col(g.as_str())).collect();
    let mut right_columns = keys.clone();
    right_columns.push(col(value_column));

    let rows = frame
        .lazy()
        .select(keys.clone())
        .with_row_index(ROW_INDEX, None);
    let groups = table.clone().lazy().select(right_columns);

    Ok(rows
        .join(groups, keys.clone(), keys, JoinArgs::new(JoinType::Left))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .select([col(value_column).alias(operation_id)])
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{AnyValue, NamedFrom, Series};
    use rules_model::{ErrorKind, OperationValue};

    fn frame() -> DatasetFrame {
        DataFrame::new(vec![
            Series::new("USUBJID".into(), ["02", "01", "02", "03"]).into(),
        ])
        .unwrap()
        .into()
    }

    #[test]
    fn scalar_is_broadcast() {
        let aligned = align_output("record_count", "$n", OperationOutput::scalar(4i64), &frame())
            .unwrap();
        assert_eq!(aligned.len(), 4);
        assert_eq!(aligned.values.name().as_str(), "$n");
    }

    #[test]
    fn short_column_is_an_alignment_error() {
        let output = OperationOutput::Column(Series::new("x".into(), [1i64, 2]));
        let err = align_output("dy", "$dy", output, &frame()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alignment);
        insta::assert_snapshot!(err, @"Operation 'dy' produced 2 values for 4 rows");
    }

    #[test]
    fn groups_expand_in_row_order_with_nulls_for_absent_groups() {
        let table = DataFrame::new(vec![
            Series::new("USUBJID".into(), ["01", "02"]).into(),
            Series::new("n".into(), [5i64, 7]).into(),
        ])
        .unwrap();
        let output = OperationOutput::Grouped {
            table,
            grouping: vec!["USUBJID".into()],
            value_column: "n".into(),
        };

        for frame in [frame(), DatasetFrame::partitioned(vec![frame().collect().unwrap()]).unwrap()] {
            let aligned = align_output("record_count", "$n", output.clone(), &frame).unwrap();
            let values: Vec<_> = (0..aligned.len()).map(|i| aligned.get(i).unwrap().into_static()).collect();
            assert_eq!(
                values,
                vec![
                    AnyValue::Int64(7),
                    AnyValue::Int64(5),
                    AnyValue::Int64(7),
                    AnyValue::Null
                ]
            );
            assert!(aligned.groups.is_some());
        }
    }

    #[test]
    fn list_scalar_keeps_items() {
        let aligned = align_output(
            "study_domains",
            "$domains",
            OperationOutput::Scalar(OperationValue::list(["AE", "DM"])),
            &frame(),
        )
        .unwrap();
        assert_eq!(
            aligned.to_json_values().unwrap()[3],
            serde_json::json!(["AE", "DM"])
        );
    }
}
