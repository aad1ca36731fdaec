//! Row count.

use polars::prelude::{DataType, len};
use rules_model::frame::count_rows;
use rules_model::{OperationOutput, Result};

use super::RECORD_COUNT;
use crate::operation::{Operation, OperationContext};

/// Number of rows, after the filter when one is set.
///
/// With grouping, the count of filtered rows per group. Groups with no
/// filtered rows are left out of the table and align to null.
pub struct RecordCount;

impl Operation for RecordCount {
    fn name(&self) -> &'static str {
        RECORD_COUNT
    }

    fn description(&self) -> &'static str {
        "Number of records in the dataset"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        ctx.validate_filter_and_grouping()?;
        if ctx.params.is_grouped() {
            return ctx.grouped(len().cast(DataType::Int64));
        }
        let count = count_rows(ctx.filtered())?;
        Ok(OperationOutput::scalar(count))
    }
}
