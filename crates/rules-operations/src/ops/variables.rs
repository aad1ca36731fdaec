//! Variable-level operations across the study's datasets.

use std::collections::BTreeSet;
use std::path::Path;

use rules_model::{DatasetFrame, EngineError, OperationOutput, OperationValue, Result};

use super::{VARIABLE_COUNT, VARIABLE_EXISTS, VARIABLE_NAMES};
use crate::operation::{Operation, OperationContext, replace_prefix};

/// Reference to `filename` in the directory of `dataset_path`.
pub fn sibling_reference(dataset_path: Option<&str>, filename: &str) -> String {
    match dataset_path.and_then(|p| Path::new(p).parent()) {
        Some(dir) => dir.join(filename).to_string_lossy().into_owned(),
        None => filename.to_string(),
    }
}

/// Union of column names across every dataset file of the requested domains.
///
/// Domains come from `target_domains`, or the bundle's `domain` when unset.
/// Files sharing a domain are joined as a split dataset.
pub struct VariableNames;

impl Operation for VariableNames {
    fn name(&self) -> &'static str {
        VARIABLE_NAMES
    }

    fn description(&self) -> &'static str {
        "Variable names present in the study datasets of the requested domains"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let params = ctx.params;
        let domains: Vec<String> = match &params.target_domains {
            Some(domains) => domains.clone(),
            None => vec![params.require_domain(self.name())?.to_string()],
        };

        let files: Vec<String> = params
            .datasets
            .iter()
            .filter(|entry| {
                entry
                    .domain
                    .as_ref()
                    .is_some_and(|d| domains.iter().any(|wanted| wanted == d))
            })
            .map(|entry| sibling_reference(params.dataset_path.as_deref(), &entry.filename))
            .collect();
        if files.is_empty() {
            tracing::warn!(?domains, "no study datasets for requested domains");
            return Ok(OperationOutput::Scalar(OperationValue::List(Vec::new())));
        }

        let loader = |file: &str| ctx.data_service.get_dataset(file);
        let joined = ctx.data_service.join_split_datasets(&loader, &files)?;
        let names: BTreeSet<String> = joined.column_names()?.into_iter().collect();
        Ok(OperationOutput::Scalar(OperationValue::list(names)))
    }
}

/// Whether `target` is a column of the dataset. A `--` prefix is replaced by
/// the bundle's domain.
pub struct VariableExists;

impl Operation for VariableExists {
    fn name(&self) -> &'static str {
        VARIABLE_EXISTS
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let target = ctx.params.require_target(self.name())?;
        let name = match ctx.params.domain.as_deref() {
            Some(domain) => replace_prefix(target, domain),
            None => target.to_string(),
        };
        Ok(OperationOutput::scalar(ctx.frame.has_column(&name)?))
    }
}

/// Number of study datasets that contain `target`, with `--` replaced by
/// each dataset's domain.
pub struct VariableCount;

impl VariableCount {
    fn load(ctx: &OperationContext<'_>, filename: &str) -> Result<DatasetFrame> {
        let reference = sibling_reference(ctx.params.dataset_path.as_deref(), filename);
        ctx.data_service.get_dataset(&reference)
    }
}

impl Operation for VariableCount {
    fn name(&self) -> &'static str {
        VARIABLE_COUNT
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let target = ctx.params.require_target(self.name())?;
        if ctx.params.datasets.is_empty() {
            return Err(EngineError::missing(self.name(), "datasets"));
        }

        let mut count = 0usize;
        for entry in &ctx.params.datasets {
            let name = replace_prefix(target, entry.domain.as_deref().unwrap_or_default());
            if Self::load(ctx, &entry.filename)?.has_column(&name)? {
                count += 1;
            }
        }
        Ok(OperationOutput::scalar(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_reference_uses_dataset_directory() {
        assert_eq!(sibling_reference(Some("study/bundle/blah"), "AE"), "study/bundle/AE");
        assert_eq!(sibling_reference(Some("ae.csv"), "ex.csv"), "ex.csv");
        assert_eq!(sibling_reference(None, "ex.csv"), "ex.csv");
    }
}
