//! Operation registry and dispatcher.
//!
//! The registry maps exact operation names to implementations. Dispatch
//! resolves the name, runs the operation inside an `operation` tracing span,
//! aligns the output to the evaluation frame and returns it keyed by the
//! bundle's operation id. Outputs are never cached here.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use rules_cache::CacheService;
use rules_data::DataService;
use rules_library::LibraryMetadataContainer;
use rules_model::{DatasetFrame, EngineError, OperationParams, OperationResults, Result};

use crate::align::align_output;
use crate::operation::{Operation, OperationContext};
use crate::ops;

/// Registry of operations indexed by name.
///
/// Lookup is exact: no case folding and no prefix matching.
#[derive(Default)]
pub struct OperationRegistry {
    operations: HashMap<&'static str, Box<dyn Operation>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation under its name, replacing any previous one.
    pub fn register(&mut self, operation: Box<dyn Operation>) {
        self.operations.insert(operation.name(), operation);
    }

    /// The operation registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Operation> {
        self.operations.get(name).map(|op| op.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operations.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run the operation `name` against `frame`.
    ///
    /// When `library` is `None` a container over `cache` and `data_service`
    /// is created for this call.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownOperation`] when `name` is not registered, and
    /// any error raised by the operation or by alignment.
    pub fn get_service(
        &self,
        name: &str,
        params: &OperationParams,
        frame: &DatasetFrame,
        cache: &Arc<dyn CacheService>,
        data_service: &Arc<dyn DataService>,
        library: Option<&LibraryMetadataContainer>,
    ) -> Result<OperationResults> {
        let operation = self.get(name).ok_or_else(|| EngineError::UnknownOperation {
            name: name.to_string(),
        })?;

        let span = tracing::info_span!(
            "operation",
            name = operation.name(),
            operation_id = %params.operation_id
        );
        let _guard = span.enter();

        let owned_library;
        let library = match library {
            Some(library) => library,
            None => {
                owned_library = LibraryMetadataContainer::new(Arc::clone(cache))
                    .with_data_service(Arc::clone(data_service));
                &owned_library
            }
        };

        let mut params = params.clone();
        params.operation_name = operation.name().to_string();
        let ctx = OperationContext {
            params: &params,
            frame,
            cache,
            data_service,
            library,
        };

        tracing::debug!(lazy = frame.is_lazy(), "executing operation");
        let output = operation.execute(&ctx)?;
        tracing::debug!(kind = output.kind(), "operation finished");
        let aligned = align_output(operation.name(), &params.operation_id, output, frame)?;

        let mut results = OperationResults::new();
        results.insert(params.operation_id.clone(), aligned);
        Ok(results)
    }
}

/// Builds a registry with every built-in operation.
pub fn build_default_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();
    registry.register(Box::new(ops::RecordCount));
    registry.register(Box::new(ops::Distinct));
    registry.register(Box::new(ops::Minimum));
    registry.register(Box::new(ops::Maximum));
    registry.register(Box::new(ops::Mean));
    registry.register(Box::new(ops::StudyDay));
    registry.register(Box::new(ops::DatasetColumnOrder));
    registry.register(Box::new(ops::LibraryColumnOrder));
    registry.register(Box::new(ops::CodelistAttributes));
    registry.register(Box::new(ops::DomainIsCustom));
    registry.register(Box::new(ops::StudyDomains));
    registry.register(Box::new(ops::VariableNames));
    registry.register(Box::new(ops::VariableExists));
    registry.register(Box::new(ops::VariableCount));
    registry
}

/// The shared default registry, built on first use.
pub fn default_registry() -> &'static OperationRegistry {
    static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(build_default_registry)
}

/// Evaluate `name` with the default registry.
pub fn evaluate(
    name: &str,
    params: &OperationParams,
    frame: &DatasetFrame,
    cache: &Arc<dyn CacheService>,
    data_service: &Arc<dyn DataService>,
    library: Option<&LibraryMetadataContainer>,
) -> Result<OperationResults> {
    default_registry().get_service(name, params, frame, cache, data_service, library)
}

/// Evaluate `name` against the bundle's own frame.
pub fn evaluate_params(
    name: &str,
    params: &OperationParams,
    cache: &Arc<dyn CacheService>,
    data_service: &Arc<dyn DataService>,
    library: Option<&LibraryMetadataContainer>,
) -> Result<OperationResults> {
    evaluate(name, params, &params.dataframe, cache, data_service, library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_model::{ErrorKind, OperationOutput};

    struct Constant;

    impl Operation for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn execute(&self, _ctx: &OperationContext<'_>) -> Result<OperationOutput> {
            Ok(OperationOutput::scalar("x"))
        }
    }

    #[test]
    fn default_registry_has_every_operation() {
        let registry = build_default_registry();
        assert_eq!(
            registry.names(),
            vec![
                "distinct",
                "domain_is_custom",
                "dy",
                "get_codelist_attributes",
                "get_column_order_from_dataset",
                "get_column_order_from_library",
                "max",
                "mean",
                "min",
                "record_count",
                "study_domains",
                "variable_count",
                "variable_exists",
                "variable_names",
            ]
        );
    }

    #[test]
    fn lookup_is_exact() {
        let registry = default_registry();
        assert!(registry.contains("record_count"));
        assert!(!registry.contains("Record_Count"));
        assert!(!registry.contains("record"));
    }

    #[test]
    fn custom_operations_can_be_registered() {
        let mut registry = OperationRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(Constant));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("constant").unwrap().description(), "Operation");
    }

    #[test]
    fn unknown_name_is_a_usage_error() {
        let cache: Arc<dyn CacheService> = Arc::new(rules_cache::InMemoryCacheService::new());
        let data: Arc<dyn DataService> = Arc::new(rules_data::InMemoryDataService::new());
        let params = OperationParams::new("$x", DatasetFrame::default());
        let err = evaluate("no_such_op", &params, &params.dataframe, &cache, &data, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        insta::assert_snapshot!(err, @"Unknown operation 'no_such_op'");
    }
}
