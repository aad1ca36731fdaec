//! Operation trait and execution context.
//!
//! Every operation follows the same skeleton: apply the row filter if one is
//! set, compute per group when grouping columns are set, otherwise per row or
//! as a single value. The helpers on [`OperationContext`] implement the
//! filter and grouping steps as lazy plans so eager and partitioned frames go
//! through identical logic.

use std::sync::Arc;

use polars::prelude::{AnyValue, DataFrame, Expr, LazyFrame, col};
use rules_cache::CacheService;
use rules_common::{any_to_i64, any_to_string};
use rules_data::DataService;
use rules_library::LibraryMetadataContainer;
use rules_model::{
    DatasetFrame, EngineError, OperationOutput, OperationParams, OperationValue, Result,
};

/// Column name used for per-group values before alignment.
pub(crate) const VALUE_COLUMN: &str = "__value";

/// Trait for a named operation.
///
/// # Implementing an Operation
///
/// 1. Implement this trait for a unit struct
/// 2. Register it in [`build_default_registry`](crate::build_default_registry)
pub trait Operation: Send + Sync {
    /// Registered name, matched exactly.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str {
        "Operation"
    }

    /// Compute the operation's output for `ctx.frame`.
    ///
    /// # Errors
    ///
    /// Usage errors for missing parameters, NotFound for missing metadata,
    /// and wrapped frame errors.
    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput>;
}

/// Everything an operation invocation can read.
pub struct OperationContext<'a> {
    pub params: &'a OperationParams,
    /// Frame the result is aligned to.
    pub frame: &'a DatasetFrame,
    pub cache: &'a Arc<dyn CacheService>,
    pub data_service: &'a Arc<dyn DataService>,
    pub library: &'a LibraryMetadataContainer,
}

impl OperationContext<'_> {
    /// Name of the running operation, for error messages.
    pub fn operation(&self) -> &str {
        &self.params.operation_name
    }

    /// The frame with the row filter applied, as a lazy plan.
    pub fn filtered(&self) -> LazyFrame {
        let lf = self.frame.lazy();
        match self.params.active_filter().and_then(|f| f.to_expr()) {
            Some(predicate) => lf.filter(predicate),
            None => lf,
        }
    }

    /// Fail with InvalidParameter unless every name is a column of the frame.
    pub fn require_columns<'n>(
        &self,
        parameter: &'static str,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<()> {
        let columns = self.frame.column_names()?;
        for name in names {
            if !columns.iter().any(|c| c == name) {
                return Err(EngineError::invalid(
                    self.operation(),
                    parameter,
                    format!("column '{name}' is not in the dataset"),
                ));
            }
        }
        Ok(())
    }

    /// Check the filter and grouping columns exist.
    pub fn validate_filter_and_grouping(&self) -> Result<()> {
        if let Some(filter) = self.params.active_filter() {
            self.require_columns("filter", filter.columns())?;
        }
        self.require_columns("grouping", self.params.grouping.iter().map(String::as_str))
    }

    /// Aggregate `value` per group over the filtered rows.
    ///
    /// Groups without filtered rows do not appear in the table.
    pub fn grouped(&self, value: Expr) -> Result<OperationOutput> {
        let keys: Vec<Expr> = self.params.grouping.iter().map(|g| col(g.as_str())).collect();
        let table: DataFrame = self
            .filtered()
            .group_by_stable(keys)
            .agg([value.alias(VALUE_COLUMN)])
            .collect()?;
        Ok(OperationOutput::Grouped {
            table,
            grouping: self.params.grouping.clone(),
            value_column: VALUE_COLUMN.to_string(),
        })
    }

    /// Evaluate `value` over the filtered rows and return the single result.
    pub fn aggregate(&self, value: Expr) -> Result<AnyValue<'static>> {
        let df = self.filtered().select([value.alias(VALUE_COLUMN)]).collect()?;
        if df.height() == 0 {
            return Ok(AnyValue::Null);
        }
        Ok(df.column(VALUE_COLUMN)?.get(0)?.into_static())
    }
}

/// Convert an aggregate cell into an operation value.
pub fn any_to_value(value: AnyValue<'_>) -> OperationValue {
    match value {
        AnyValue::Null => OperationValue::Null,
        AnyValue::Boolean(v) => OperationValue::Bool(v),
        AnyValue::Float32(v) => OperationValue::Float(f64::from(v)),
        AnyValue::Float64(v) => OperationValue::Float(v),
        AnyValue::String(s) => OperationValue::Str(s.to_string()),
        AnyValue::StringOwned(s) => OperationValue::Str(s.to_string()),
        other => match any_to_i64(other.clone()) {
            Some(v) => OperationValue::Int(v),
            None => OperationValue::Str(any_to_string(other)),
        },
    }
}

/// Replace the `--` placeholder of a generic variable name with `domain`.
pub fn replace_prefix(name: &str, domain: &str) -> String {
    name.replace("--", domain)
}
