//! Building an operation bundle from command-line inputs.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use polars::prelude::{DataType, Schema};
use rules_library::CtPackage;
use rules_model::{DatasetFrame, DatasetManifestEntry, FilterValue, RowFilter};

/// Split a `COLUMN=VALUE` condition.
pub fn split_condition(condition: &str) -> Result<(&str, &str)> {
    let (column, value) = condition
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{condition}' must be COLUMN=VALUE"))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("filter '{condition}' has no column");
    }
    Ok((column, value))
}

/// Type a filter literal after the column it is compared with.
///
/// Unknown columns keep the literal as a string; the operation rejects them.
pub fn typed_value(schema: &Schema, column: &str, raw: &str) -> Result<FilterValue> {
    let value = match schema.get(column) {
        Some(DataType::Boolean) => FilterValue::Bool(
            raw.trim()
                .parse()
                .with_context(|| format!("'{raw}' is not a boolean for {column}"))?,
        ),
        Some(dtype) if dtype.is_integer() => FilterValue::Int(
            raw.trim()
                .parse()
                .with_context(|| format!("'{raw}' is not an integer for {column}"))?,
        ),
        Some(dtype) if dtype.is_float() => FilterValue::Float(
            raw.trim()
                .parse()
                .with_context(|| format!("'{raw}' is not a number for {column}"))?,
        ),
        _ => FilterValue::Str(raw.to_string()),
    };
    Ok(value)
}

/// Build a row filter from `COLUMN=VALUE` conditions against `frame`.
pub fn parse_filter(frame: &DatasetFrame, conditions: &[String]) -> Result<Option<RowFilter>> {
    if conditions.is_empty() {
        return Ok(None);
    }
    let schema = frame.lazy().collect_schema().context("read dataset schema")?;
    let mut filter = RowFilter::new();
    for condition in conditions {
        let (column, raw) = split_condition(condition)?;
        filter = filter.with(column, typed_value(&schema, column, raw)?);
    }
    Ok(Some(filter))
}

/// Read a study manifest: a JSON array of `{"filename", "domain"}` objects.
pub fn load_manifest(path: &Path) -> Result<Vec<DatasetManifestEntry>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read manifest {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parse manifest {}", path.display()))
}

/// Read a CT package file. The package id is its `package` field.
pub fn load_ct_package(path: &Path) -> Result<CtPackage> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read CT package {}", path.display()))?;
    let package: CtPackage = serde_json::from_str(&source)
        .with_context(|| format!("parse CT package {}", path.display()))?;
    if package.package.trim().is_empty() {
        bail!("CT package {} has no package id", path.display());
    }
    Ok(package)
}
