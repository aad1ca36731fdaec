//! Column order from the dataset and from the standards library.

use std::collections::HashSet;

use rules_library::{
    GENERAL_OBSERVATIONS_CLASS, ModelMetadata, ModelVariable, ObservationClass, VariableRole,
    names_by_ordinal,
};
use rules_model::{OperationOutput, OperationValue, Result};

use super::{COLUMN_ORDER_FROM_DATASET, COLUMN_ORDER_FROM_LIBRARY};
use crate::operation::{Operation, OperationContext, replace_prefix};

/// The dataset's own column names, in frame order.
pub struct DatasetColumnOrder;

impl Operation for DatasetColumnOrder {
    fn name(&self) -> &'static str {
        COLUMN_ORDER_FROM_DATASET
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        Ok(OperationOutput::Scalar(OperationValue::List(
            ctx.frame.column_names()?,
        )))
    }
}

/// Variable order the model defines for the dataset's domain.
pub struct LibraryColumnOrder;

impl Operation for LibraryColumnOrder {
    fn name(&self) -> &'static str {
        COLUMN_ORDER_FROM_LIBRARY
    }

    fn description(&self) -> &'static str {
        "Expected variable order from the standards library"
    }

    fn execute(&self, ctx: &OperationContext<'_>) -> Result<OperationOutput> {
        let domain = ctx.params.require_domain(self.name())?;
        let standard = ctx.params.require_standard(self.name())?;
        let version = ctx.params.require_standard_version(self.name())?;

        let model = ctx.library.get_model_metadata(standard, version)?;
        let columns = ctx.frame.column_names()?;
        let order = library_column_order(&model, domain, &columns);
        tracing::debug!(domain, variables = order.len(), "library column order");
        Ok(OperationOutput::Scalar(OperationValue::List(order)))
    }
}

fn role_names(variables: &[ModelVariable], role: VariableRole, domain: &str) -> Vec<String> {
    let with_role: Vec<ModelVariable> = variables
        .iter()
        .filter(|v| v.has_role(role))
        .cloned()
        .collect();
    names_by_ordinal(&with_role)
        .iter()
        .map(|name| replace_prefix(name, domain))
        .collect()
}

/// Expected variable order for `domain`.
///
/// Domains the model defines use their dataset variables. Other domains use
/// the variables of the class detected from `columns`. General observation
/// identifiers come first and timing variables last, unless the domain is
/// known to belong to a class outside the general observation classes.
pub fn library_column_order(model: &ModelMetadata, domain: &str, columns: &[String]) -> Vec<String> {
    let (body, class) = match model.dataset(domain) {
        Some(dataset) => (
            names_by_ordinal(&dataset.variables),
            dataset
                .parent_class
                .as_deref()
                .and_then(ObservationClass::parse),
        ),
        None => {
            let class = ObservationClass::detect(domain, columns);
            let body = class
                .and_then(|c| model.class(c.as_str()))
                .map(|c| {
                    names_by_ordinal(&c.variables)
                        .iter()
                        .map(|name| replace_prefix(name, domain))
                        .collect()
                })
                .unwrap_or_default();
            (body, class)
        }
    };

    let general = class
        .is_none_or(|c| c.is_general_observation())
        .then(|| model.class(GENERAL_OBSERVATIONS_CLASS))
        .flatten();

    let mut ordered = Vec::new();
    if let Some(general) = general {
        ordered.extend(role_names(&general.variables, VariableRole::Identifier, domain));
    }
    ordered.extend(body);
    if let Some(general) = general {
        ordered.extend(role_names(&general.variables, VariableRole::Timing, domain));
    }

    let mut seen = HashSet::new();
    ordered.retain(|name| seen.insert(name.clone()));
    ordered
}
