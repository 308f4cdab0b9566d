use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::BuildResult;

pub fn print_build_summary(result: &BuildResult) {
    println!("Data: {}", result.data_dir.display());
    if result.dry_run {
        println!("Dry run: no outputs written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    print_inputs_table(result);
    print_matrix_table(result);
    print_consolidation(result);
    print_outputs_table(result);
}

fn print_inputs_table(result: &BuildResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Input"),
        header_cell("File"),
        header_cell("Records"),
        header_cell("Warnings"),
        header_cell("SHA-256"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for digest in &result.digests {
        let file = digest
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown");
        table.add_row(vec![
            Cell::new(digest.kind.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(file),
            Cell::new(digest.records),
            count_cell(digest.warnings, Color::Yellow),
            dim_cell(short_digest(&digest.sha256)),
        ]);
    }
    println!("{table}");
}

fn print_matrix_table(result: &BuildResult) {
    let matrix = &result.matrix;
    let distribution = matrix.source_distribution();
    let cells = matrix.cell_count();
    let coverage = if cells == 0 {
        0.0
    } else {
        matrix.numeric_count() as f64 / cells as f64 * 100.0
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Encounters"),
        header_cell("Columns"),
        header_cell("Resolved"),
        header_cell("Numeric"),
        header_cell("Coverage"),
        header_cell("Day0"),
        header_cell("Day-1"),
        header_cell("Day+1"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(matrix.encounter_count()),
        Cell::new(matrix.column_count()),
        Cell::new(matrix.resolved_count()),
        Cell::new(matrix.numeric_count()),
        Cell::new(format!("{coverage:.1}%")),
        Cell::new(distribution.day0),
        Cell::new(distribution.day_minus1),
        Cell::new(distribution.day_plus1),
    ]);
    println!("{table}");
}

fn print_consolidation(result: &BuildResult) {
    let consolidation = &result.consolidation;
    println!(
        "Consolidation: {} labels evaluated, {} merged, {} not merged",
        consolidation.labels_evaluated(),
        consolidation.merged_groups(),
        consolidation.unmerged().len()
    );
    if consolidation.merges().is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Target"),
        header_cell("Label"),
    ]);
    apply_table_style(&mut table);
    for rule in consolidation.merges() {
        table.add_row(vec![
            Cell::new(rule.source),
            Cell::new(rule.target),
            Cell::new(rule.label.clone()),
        ]);
    }
    println!("{table}");
}

fn print_outputs_table(result: &BuildResult) {
    if result.outputs.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Output"), header_cell("Path")]);
    apply_table_style(&mut table);
    for path in &result.outputs {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        table.add_row(vec![Cell::new(name), dim_cell(path.display())]);
    }
    println!("{table}");
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
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn short_digest(sha256: &str) -> &str {
    sha256.get(..12).unwrap_or(sha256)
}
