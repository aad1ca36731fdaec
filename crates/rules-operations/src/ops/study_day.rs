//! Study day relative to the subject reference start date.

use polars::prelude::{DataType, Expr, Null, StrptimeOptions, col, lit, when};
use rules_model::{OperationOutput, Result};

use super::DY;
use crate::operation::{Operation, OperationContext};

/// Column holding the subject reference start date.
pub const REFERENCE_START_COLUMN: &str = "RFSTDTC";

/// Date part of an ISO 8601 date or datetime column, null when partial.
fn date_part(column: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .str()
        .slice(lit(0), lit(10))
        .str()
        .to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: false,
            exact: true,
            cache: true,
        })
        .cast(DataType::Int64)
}

/// Study day of column `date` relative to column `reference`.
///
/// There is no day 0: the reference date is day 1 and the day before it is
/// day -1. Null when either side is missing or not a full date.
pub fn study_day(date: &str, reference: &str) -> Expr {
    let days = date_part(date) - date_part(reference);
    when(days.clone().gt_eq(lit(0)))
        .then(days.clone() + lit(1))
        .otherwise(days)
}

/// Per-row study day of `target`.
pub struct StudyDay;

impl Operation for StudyDay {
    fn name(&self) -> &'static str {
        DY
    }

    fn description(&self) -> &'static str {
        "Study day of a date column relative to RFSTDTC"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let target = ctx.params.require_target(self.name())?;
        ctx.require_columns("target", [target, REFERENCE_START_COLUMN])?;
        if let Some(filter) = ctx.params.active_filter() {
            ctx.require_columns("filter", filter.columns())?;
        }

        let mut days = study_day(target, REFERENCE_START_COLUMN);
        if let Some(predicate) = ctx.params.active_filter().and_then(|f| f.to_expr()) {
            days = when(predicate.fill_null(lit(false)))
                .then(days)
                .otherwise(lit(Null {}).cast(DataType::Int64));
        }
        let df = ctx.frame.lazy().select([days.alias(target)]).collect()?;
        let series = df.column(target)?.as_materialized_series().clone();
        Ok(OperationOutput::Column(series))
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, IntoLazy, NamedFrom, Series};

    use super::*;

    fn days(dates: &[Option<&str>], references: &[Option<&str>]) -> Vec<Option<i64>> {
        let df = DataFrame::new(vec![
            Series::new("DTC".into(), dates).into(),
            Series::new("REF".into(), references).into(),
        ])
        .unwrap();
        let out = df
            .lazy()
            .select([study_day("DTC", "REF").alias("DY")])
            .collect()
            .unwrap();
        out.column("DY").unwrap().i64().unwrap().into_iter().collect()
    }

    #[test]
    fn no_day_zero() {
        let reference = [Some("2021-01-01"); 3];
        assert_eq!(
            days(&[Some("2021-01-01"), Some("2021-01-02"), Some("2020-12-31")], &reference),
            vec![Some(1), Some(2), Some(-1)]
        );
    }

    #[test]
    fn datetimes_use_date_part() {
        assert_eq!(
            days(&[Some("2021-01-10T08:30")], &[Some("2021-01-01T23:59:59")]),
            vec![Some(10)]
        );
    }

    #[test]
    fn partial_or_missing_dates_are_null() {
        assert_eq!(
            days(
                &[Some("2021-01"), None, Some("2021-01-01"), Some("not a date")],
                &[Some("2021-01-01"), Some("2021-01-01"), Some(""), Some("2021-01-01")],
            ),
            vec![None, None, None, None]
        );
    }
}
