//! Terminal rendering of schema trees and result pages

use anyhow::Result;
use comfy_table::{Table, presets::UTF8_FULL};
use nosql_schema::{Datamodel, SchemaElement, TableId};
use nosql_results::TablePage;
use std::fmt::Write;

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate_cell(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

/// The schemas of `model` with each table's columns and indexes
///
/// Tables that have not been loaded yet are listed by name only. With
/// `only` set, every other table is skipped.
pub fn schema_tree(model: &Datamodel, only: Option<TableId>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "datamodel {}", model.name())?;
    for schema_id in model.schema_ids() {
        let Some(schema) = model.get_schema(schema_id) else {
            continue;
        };
        let table_ids = schema.table_ids();
        if only.is_some_and(|t| !table_ids.contains(&t)) {
            continue;
        }
        writeln!(out, "schema {} ({} tables)", schema.name(), schema.table_count())?;
        for table_id in table_ids {
            if only.is_some_and(|t| t != table_id) {
                continue;
            }
            write_table(&mut out, model, table_id)?;
        }
    }
    Ok(out)
}

fn write_table(out: &mut String, model: &Datamodel, table_id: TableId) -> Result<()> {
    let Some(table) = model.get_table(table_id) else {
        return Ok(());
    };
    if !table.is_fetched() {
        writeln!(out, "  table {} (not loaded)", table.name())?;
        return Ok(());
    }

    write!(out, "  table {}", table.name())?;
    if let Some(ttl) = table.ttl() {
        write!(out, " ttl={ttl}")?;
    }
    let limits = table.limits();
    if !limits.is_unset() {
        write!(
            out,
            " limits={}/{}/{}",
            limits.read_units, limits.write_units, limits.storage_gb
        )?;
    }
    out.push('\n');

    let mut columns = new_table();
    columns.set_header(vec!["Column", "Type", "Nullable", "Default", "Key"]);
    for field in model.table_fields(table_id)? {
        let mut key = Vec::new();
        if field.is_primary_key() {
            key.push("PK");
        }
        if field.is_shard_key() {
            key.push("SHARD");
        }
        if field.is_index_key() {
            key.push("IDX");
        }
        columns.add_row(vec![
            field.name().to_string(),
            field.type_syntax(),
            if field.is_nullable() { "yes" } else { "no" }.to_string(),
            field.default_value().unwrap_or("").to_string(),
            key.join(" "),
        ]);
    }
    writeln!(out, "{columns}")?;

    for index_id in table.index_ids() {
        let Some(index) = model.get_index(index_id) else {
            continue;
        };
        let terms = model.group_names(index.fields());
        writeln!(out, "  index {} ({})", index.name(), terms.join(", "))?;
    }
    Ok(())
}

/// One result page as a grid, cells cut to `max_cell_width`
pub fn page_table(page: &TablePage, max_cell_width: usize) -> String {
    let columns = page.column_names();
    let mut grid = new_table();
    grid.set_header(columns.clone());
    for row in page.rows() {
        grid.add_row(
            columns
                .iter()
                .map(|c| truncate_cell(&row.cell(c), max_cell_width))
                .collect::<Vec<_>>(),
        );
    }
    grid.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_cell() {
        assert_eq!(truncate_cell("short", 8), "short");
        assert_eq!(truncate_cell("exactly8", 8), "exactly8");
        assert_eq!(truncate_cell("much too long", 8), "much to…");
    }
}
