//! Operation parameter bundle.
//!
//! [`OperationParams`] carries everything one operation invocation needs. It
//! is built once per rule evaluation by the caller and read, never modified,
//! by the engine. Bundles are cheap to clone; clone rather than share a
//! bundle across concurrent invocations.

use std::collections::BTreeMap;

use polars::prelude::{Expr, col, lit};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::frame::DatasetFrame;

/// A literal a [`RowFilter`] compares a column against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FilterValue {
    fn to_lit(&self) -> Expr {
        match self {
            FilterValue::Bool(v) => lit(*v),
            FilterValue::Int(v) => lit(*v),
            FilterValue::Float(v) => lit(*v),
            FilterValue::Str(v) => lit(v.clone()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Str(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// Row predicate: every listed column must equal its value.
///
/// # Example
///
/// ```
/// use rules_model::RowFilter;
///
/// let filter = RowFilter::new().with("AESEV", "SEVERE").with("AESER", "Y");
/// assert_eq!(filter.len(), 2);
/// assert!(filter.to_expr().is_some());
/// assert!(RowFilter::new().to_expr().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowFilter {
    conditions: BTreeMap<String, FilterValue>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.conditions.insert(column.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Columns the filter reads.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Conjunction of the conditions, or `None` when there are none.
    pub fn to_expr(&self) -> Option<Expr> {
        self.conditions
            .iter()
            .map(|(column, value)| col(column.as_str()).eq(value.to_lit()))
            .reduce(Expr::and)
    }
}

/// One dataset file of the study, as listed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifestEntry {
    pub filename: String,
    #[serde(default)]
    pub domain: Option<String>,
}

impl DatasetManifestEntry {
    pub fn new(filename: impl Into<String>, domain: Option<&str>) -> Self {
        Self {
            filename: filename.into(),
            domain: domain.map(str::to_string),
        }
    }
}

/// Parameters for a single operation invocation.
#[derive(Debug, Clone, Default)]
pub struct OperationParams {
    /// Frame the rule is evaluated against.
    pub dataframe: DatasetFrame,
    /// Key the result is stored under.
    pub operation_id: String,
    /// Registered name of the operation this bundle is for.
    pub operation_name: String,
    /// Column to read (or name to assign).
    pub target: Option<String>,
    /// Domain of `dataframe` (e.g. "AE").
    pub domain: Option<String>,
    /// Standard identifier (e.g. "sdtmig").
    pub standard: Option<String>,
    /// Standard version (e.g. "3-4").
    pub standard_version: Option<String>,
    /// Grouping columns, in order. Empty means no grouping.
    pub grouping: Vec<String>,
    /// Optional row filter.
    pub filter: Option<RowFilter>,
    /// Column holding controlled-terminology codes.
    pub ct_attribute: Option<String>,
    /// Column holding controlled-terminology versions.
    pub ct_version: Option<String>,
    /// Controlled-terminology packages that apply.
    pub ct_packages: Option<Vec<String>>,
    /// Manifest of every dataset file in the study.
    pub datasets: Vec<DatasetManifestEntry>,
    /// Path of the dataset under evaluation; siblings resolve next to it.
    pub dataset_path: Option<String>,
    /// Domains a cross-file operation should look at.
    pub target_domains: Option<Vec<String>>,
}

impl OperationParams {
    pub fn new(operation_id: impl Into<String>, dataframe: impl Into<DatasetFrame>) -> Self {
        Self {
            dataframe: dataframe.into(),
            operation_id: operation_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = name.into();
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_standard(mut self, standard: impl Into<String>, version: impl Into<String>) -> Self {
        self.standard = Some(standard.into());
        self.standard_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_grouping<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_ct(
        mut self,
        attribute: impl Into<String>,
        version: impl Into<String>,
        packages: Vec<String>,
    ) -> Self {
        self.ct_attribute = Some(attribute.into());
        self.ct_version = Some(version.into());
        self.ct_packages = Some(packages);
        self
    }

    #[must_use]
    pub fn with_datasets(mut self, datasets: Vec<DatasetManifestEntry>) -> Self {
        self.datasets = datasets;
        self
    }

    #[must_use]
    pub fn with_dataset_path(mut self, path: impl Into<String>) -> Self {
        self.dataset_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_target_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// The filter to apply, ignoring an empty one.
    pub fn active_filter(&self) -> Option<&RowFilter> {
        self.filter.as_ref().filter(|f| !f.is_empty())
    }

    pub fn is_grouped(&self) -> bool {
        !self.grouping.is_empty()
    }

    pub fn require_target(&self, operation: &str) -> Result<&str> {
        require(self.target.as_deref(), operation, "target")
    }

    pub fn require_domain(&self, operation: &str) -> Result<&str> {
        require(self.domain.as_deref(), operation, "domain")
    }

    pub fn require_standard(&self, operation: &str) -> Result<&str> {
        require(self.standard.as_deref(), operation, "standard")
    }

    pub fn require_standard_version(&self, operation: &str) -> Result<&str> {
        require(self.standard_version.as_deref(), operation, "standard_version")
    }
}

fn require<'a>(value: Option<&'a str>, operation: &str, parameter: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(EngineError::missing(operation, parameter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn builder_sets_fields() {
        let params = OperationParams::new("$count", DatasetFrame::default())
            .with_operation_name("record_count")
            .with_domain("AE")
            .with_standard("sdtmig", "3-4")
            .with_grouping(["USUBJID"])
            .with_filter(RowFilter::new().with("AESER", "Y"));

        assert_eq!(params.operation_id, "$count");
        assert_eq!(params.require_domain("record_count").unwrap(), "AE");
        assert_eq!(params.require_standard_version("record_count").unwrap(), "3-4");
        assert!(params.is_grouped());
        assert!(params.active_filter().is_some());
    }

    #[test]
    fn blank_parameters_count_as_missing() {
        let params = OperationParams::new("$x", DatasetFrame::default()).with_domain("  ");
        let err = params.require_domain("domain_is_custom").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(params.require_target("distinct").is_err());
    }

    #[test]
    fn empty_filter_is_inactive() {
        let params =
            OperationParams::new("$x", DatasetFrame::default()).with_filter(RowFilter::new());
        assert!(params.active_filter().is_none());
    }

    #[test]
    fn manifest_entry_without_domain_deserializes() {
        let entries: Vec<DatasetManifestEntry> = serde_json::from_str(
            r#"[{"filename": "dm.xpt"}, {"filename": "ae.xpt", "domain": "AE"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0].domain, None);
        assert_eq!(entries[1], DatasetManifestEntry::new("ae.xpt", Some("AE")));
    }

    #[test]
    fn filter_deserializes_from_plain_map() {
        let filter: RowFilter = serde_json::from_str(r#"{"AESEV": "MILD", "AESEQ": 2}"#).unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.columns().collect::<Vec<_>>(), vec!["AESEQ", "AESEV"]);
    }
}
