use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fas_core::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    println!("Study: {}", summary.research_study_id);
    let mut table = Table::new();
    table.set_header(vec![header_cell("File"), header_cell("Records")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let mut total = 0usize;
    for (resource_type, count) in &summary.emitted {
        total += count;
        table.add_row(vec![
            Cell::new(format!("{resource_type}.ndjson"))
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(count),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Assays synthesized: {}", summary.assays_synthesized);
    println!("Vocabulary studies: {}", summary.vocabulary_studies);
    println!(
        "Ids registered: {} (references seen: {})",
        summary.ids_registered, summary.references_seen
    );
    if !summary.validation_errors.is_empty() {
        eprintln!("Validation failures:");
        for error in &summary.validation_errors {
            eprintln!("- {error}");
        }
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
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
