//! Controlled-terminology codelist attributes.

use polars::prelude::{
    DataFrame, DataType, IntoLazy, JoinArgs, JoinType, LazyFrame, NamedFrom, Series,
    SortMultipleOptions, SortOptions, UniqueKeepStrategy, col, concat_str, lit,
};
use rules_model::{EngineError, OperationOutput, Result};

use super::CODELIST_ATTRIBUTES;
use crate::operation::{Operation, OperationContext, VALUE_COLUMN};

/// Codelist reference naming CDISC controlled terminology.
const CDISC_CT: &str = "CDISC CT";

/// Prefix of the SDTM CT package id for a CT version date.
const SDTM_CT_PREFIX: &str = "sdtmct-";

const ROW: &str = "__row";
const CODE: &str = "__code";
const PACKAGE: &str = "__package";

/// Packages defining each row's codelist code.
///
/// Each value of the `ct_attribute` column is looked up in the codelists of
/// the packages listed in `ct_packages`. A row gets the sorted ids of every
/// package defining its code, and an empty list when none does.
///
/// With `target` naming the code reference column and `ct_version` the
/// version column, only designated packages the dataset references are
/// searched: a row whose reference is `CDISC CT` references
/// `sdtmct-{version}`.
pub struct CodelistAttributes;

impl Operation for CodelistAttributes {
    fn name(&self) -> &'static str {
        CODELIST_ATTRIBUTES
    }

    fn description(&self) -> &'static str {
        "CT packages defining each row's codelist code"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let params = ctx.params;
        let attribute = params
            .ct_attribute
            .as_deref()
            .ok_or_else(|| EngineError::missing(self.name(), "ct_attribute"))?;
        let designated = params
            .ct_packages
            .as_ref()
            .ok_or_else(|| EngineError::missing(self.name(), "ct_packages"))?;
        ctx.require_columns("ct_attribute", [attribute])?;

        let mut lookup = code_table(ctx, designated)?.lazy();
        if let (Some(reference), Some(version)) =
            (params.target.as_deref(), params.ct_version.as_deref())
        {
            ctx.require_columns("target", [reference])?;
            ctx.require_columns("ct_version", [version])?;
            let referenced = referenced_packages(ctx.frame.lazy(), reference, version);
            lookup = lookup.join(
                referenced,
                [col(PACKAGE)],
                [col(PACKAGE)],
                JoinArgs::new(JoinType::Inner),
            );
        }

        let df = ctx
            .frame
            .lazy()
            .with_row_index(ROW, None)
            .select([col(ROW), col(attribute).cast(DataType::String).alias(CODE)])
            .join(lookup, [col(CODE)], [col(CODE)], JoinArgs::new(JoinType::Left))
            .group_by([col(ROW)])
            .agg([col(PACKAGE)
                .drop_nulls()
                .unique()
                .sort(SortOptions::default())
                .alias(VALUE_COLUMN)])
            .sort([ROW], SortMultipleOptions::default())
            .select([col(VALUE_COLUMN)])
            .collect()?;
        tracing::debug!(
            attribute,
            packages = designated.len(),
            rows = df.height(),
            "codelist attributes"
        );
        Ok(OperationOutput::Column(
            df.column(VALUE_COLUMN)?.as_materialized_series().clone(),
        ))
    }
}

/// One (code, package) row per codelist of every designated package.
fn code_table(ctx: &OperationContext<'_>, designated: &[String]) -> Result<DataFrame> {
    let mut codes = Vec::new();
    let mut packages = Vec::new();
    for package_id in designated {
        let package = ctx
            .library
            .get_ct_package_metadata(package_id)?
            .ok_or_else(|| EngineError::not_found("CT package", package_id.as_str()))?;
        for code in package.codes() {
            codes.push(code.to_string());
            packages.push(package_id.clone());
        }
    }
    Ok(DataFrame::new(vec![
        Series::new(CODE.into(), codes).into(),
        Series::new(PACKAGE.into(), packages).into(),
    ])?)
}

/// Distinct package ids the rows reference through CDISC CT and a version.
fn referenced_packages(frame: LazyFrame, reference: &str, version: &str) -> LazyFrame {
    frame
        .filter(col(reference).cast(DataType::String).eq(lit(CDISC_CT)))
        .select([concat_str(
            [lit(SDTM_CT_PREFIX), col(version).cast(DataType::String)],
            "",
            false,
        )
        .alias(PACKAGE)])
        .unique(None, UniqueKeepStrategy::Any)
}
