//! Column aggregates: distinct, min, max, mean.

use std::collections::BTreeSet;

use polars::prelude::{DataType, Expr, SortOptions, col};
use rules_model::{OperationOutput, OperationValue, Result};

use super::{DISTINCT, MAX, MEAN, MIN};
use crate::operation::{Operation, OperationContext, VALUE_COLUMN, any_to_value};

/// Sorted distinct non-null values of `target`, as strings.
pub struct Distinct;

impl Operation for Distinct {
    fn name(&self) -> &'static str {
        DISTINCT
    }

    fn description(&self) -> &'static str {
        "Distinct values of a column"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let target = ctx.params.require_target(self.name())?;
        ctx.require_columns("target", [target])?;
        ctx.validate_filter_and_grouping()?;

        let values = col(target).cast(DataType::String).drop_nulls();
        if ctx.params.is_grouped() {
            return ctx.grouped(values.unique().sort(SortOptions::default()));
        }

        let df = ctx
            .filtered()
            .select([values.alias(VALUE_COLUMN)])
            .collect()?;
        let distinct: BTreeSet<String> = df
            .column(VALUE_COLUMN)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(OperationOutput::Scalar(OperationValue::list(distinct)))
    }
}

fn aggregate_target(
    ctx: &OperationContext<'_>,
    name: &'static str,
    aggregate: impl Fn(Expr) -> Expr,
) -> Result<OperationOutput> {
    let target = ctx.params.require_target(name)?;
    ctx.require_columns("target", [target])?;
    ctx.validate_filter_and_grouping()?;

    let value = aggregate(col(target));
    if ctx.params.is_grouped() {
        return ctx.grouped(value);
    }
    Ok(OperationOutput::Scalar(any_to_value(ctx.aggregate(value)?)))
}

/// Smallest value of `target`.
pub struct Minimum;

impl Operation for Minimum {
    fn name(&self) -> &'static str {
        MIN
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        aggregate_target(ctx, self.name(), Expr::min)
    }
}

/// Largest value of `target`.
pub struct Maximum;

impl Operation for Maximum {
    fn name(&self) -> &'static str {
        MAX
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        aggregate_target(ctx, self.name(), Expr::max)
    }
}

/// Arithmetic mean of `target`.
pub struct Mean;

impl Operation for Mean {
    fn name(&self) -> &'static str {
        MEAN
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        aggregate_target(ctx, self.name(), |expr| expr.cast(DataType::Float64).mean())
    }
}
