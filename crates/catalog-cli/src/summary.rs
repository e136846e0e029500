use anyhow::Result;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use catalog_validate::CatalogSummary;

pub fn print_summary(summary: &CatalogSummary, dry_run: bool) {
    if dry_run {
        println!("Dry run: nothing was written");
    }
    println!(
        "Closure depth: {}  Elapsed: {} ms",
        summary.closure_depth, summary.elapsed_ms
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Input"),
        header_cell("Stored"),
        header_cell("Removed"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total_input = 0usize;
    let mut total_stored = 0usize;
    for dataset in &summary.datasets {
        total_input += dataset.input_rows;
        total_stored += dataset.stored_rows;
        table.add_row(vec![
            Cell::new(dataset.dataset.as_str()).fg(Color::Cyan),
            Cell::new(dataset.input_rows),
            Cell::new(dataset.stored_rows),
            removed_cell(dataset.removed_rows()),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_input).add_attribute(Attribute::Bold),
        Cell::new(total_stored).add_attribute(Attribute::Bold),
        removed_cell(total_input.saturating_sub(total_stored)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_summary_json(summary: &CatalogSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn removed_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow)
    } else {
        Cell::new(count).add_attribute(Attribute::Dim)
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}
