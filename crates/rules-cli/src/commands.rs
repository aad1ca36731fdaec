use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use rules_cli::evaluation::{EvaluationRequest, run_evaluation};
use rules_cli::output::{apply_table_style, header_cell, json_lines, results_table};
use rules_common::EngineConfig;
use rules_operations::default_registry;

use crate::cli::EvaluateArgs;

pub fn run_operations() -> Result<()> {
    let registry = default_registry();
    let mut table = Table::new();
    table.set_header(vec![header_cell("Operation"), header_cell("Description")]);
    apply_table_style(&mut table);
    for name in registry.names() {
        let description = registry
            .get(name)
            .map(|op| op.description())
            .unwrap_or_default();
        table.add_row(vec![Cell::new(name), Cell::new(description)]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::from_env().context("read config from environment")?,
    };
    let request = EvaluationRequest {
        dataset: args.dataset.clone(),
        operation: args.operation.clone(),
        operation_id: args.operation_id.clone(),
        domain: args.domain.clone(),
        standard: args.standard.clone(),
        standard_version: args.standard_version.clone(),
        target: args.target.clone(),
        grouping: args.group_by.clone(),
        filter: args.filter.clone(),
        manifest: args.manifest.clone(),
        target_domains: args.target_domains.clone(),
        ct_attribute: args.ct_attribute.clone(),
        ct_version: args.ct_version.clone(),
        ct_packages: args.ct_packages.clone(),
        library_dir: args.library.clone(),
        lazy: args.lazy,
    };
    let outcome = run_evaluation(&request, &config)?;

    if args.json {
        for line in json_lines(&outcome.operation_id, &outcome.values) {
            println!("{line}");
        }
    } else {
        println!("Operation: {}", args.operation);
        println!("Rows: {}", outcome.values.len());
        println!(
            "{}",
            results_table(&outcome.operation_id, &outcome.values, args.limit)
        );
    }
    Ok(())
}
