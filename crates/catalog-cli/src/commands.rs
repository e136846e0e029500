use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use catalog_cli::config::{CatalogConfig, Overrides};
use catalog_model::Dataset;
use catalog_storage::{MemoryStorage, open_storage};
use catalog_validate::{CatalogContext, CatalogSummary, IdentifierFormat, run_catalog};

use crate::cli::{IdentifierFormatArg, RunArgs};
use crate::summary::apply_table_style;

pub fn run_datasets() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Dataset", "Default file", "Columns"]);
    apply_table_style(&mut table);
    for dataset in Dataset::ALL {
        table.add_row(vec![
            dataset.as_str().to_string(),
            dataset.default_file_name(),
            dataset.columns().join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn overrides_from_args(args: &RunArgs) -> Overrides {
    Overrides {
        input_dir: args.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        closure_depth: args.closure_depth,
        fail_on_unresolved: args.fail_on_unresolved,
        identifier_format: args.identifier_format.map(|format| match format {
            IdentifierFormatArg::Token => IdentifierFormat::Token,
            IdentifierFormatArg::Uuid => IdentifierFormat::Uuid,
        }),
    }
}

pub fn run_catalog_command(args: &RunArgs) -> Result<CatalogSummary> {
    let mut config = CatalogConfig::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(&overrides_from_args(args));

    let span = info_span!("run", dry_run = args.dry_run);
    let _guard = span.enter();
    info!(
        storage = %config.storage.kind,
        input_dir = %config.storage.input_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        "configuration resolved"
    );

    let mut storage = open_storage(&config.storage).context("open storage")?;
    if args.dry_run {
        storage = storage.with_sink(Arc::new(MemoryStorage::new()));
    }
    let ctx = CatalogContext::from_storage(&storage, config.rules);
    run_catalog(&ctx).context("catalog run failed")
}
