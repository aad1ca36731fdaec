//! Domain-level operations.

use std::collections::BTreeSet;

use rules_model::{OperationOutput, OperationValue, Result};

use super::{DOMAIN_IS_CUSTOM, STUDY_DOMAINS};
use crate::operation::{Operation, OperationContext};

/// Whether the dataset's domain is missing from the standard's domains.
pub struct DomainIsCustom;

impl Operation for DomainIsCustom {
    fn name(&self) -> &'static str {
        DOMAIN_IS_CUSTOM
    }

    fn description(&self) -> &'static str {
        "True when the domain is not defined by the standard"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let domain = ctx.params.require_domain(self.name())?;
        let standard = ctx.params.require_standard(self.name())?;
        let version = ctx.params.require_standard_version(self.name())?;

        let metadata = ctx.library.get_standard_metadata(standard, version)?;
        Ok(OperationOutput::scalar(!metadata.has_domain(domain)))
    }
}

/// Every domain in the study manifest.
///
/// Entries without a domain contribute an empty string.
pub struct StudyDomains;

impl Operation for StudyDomains {
    fn name(&self) -> &'static str {
        STUDY_DOMAINS
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let domains: BTreeSet<String> = ctx
            .params
            .datasets
            .iter()
            .map(|entry| entry.domain.clone().unwrap_or_default())
            .collect();
        Ok(OperationOutput::Scalar(OperationValue::list(domains)))
    }
}
