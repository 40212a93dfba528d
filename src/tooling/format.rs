//! Format nodes, trees and project aggregates as text.

use crate::node::Node;
use crate::project::Project;
use crate::views::TreeItem;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn display_name(node: &Node) -> String {
    if node.info.name.is_empty() {
        format!("({})", node.id)
    } else {
        node.info.name.clone()
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Nodes as a table, one row per node.
pub fn format_node_table(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return "No nodes.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Type", "Parent", "Updated"]);
    for node in nodes {
        table.add_row(vec![
            node.id.clone(),
            display_name(node),
            node.node_type().as_str().to_string(),
            or_dash(&node.pid),
            or_dash(&node.updated_at),
        ]);
    }
    table.to_string()
}

/// Deleted nodes, most recently deleted first.
pub fn format_deleted_table(project_id: &str, nodes: &[Node]) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Deleted in {}", project_id))
    );
    if nodes.is_empty() {
        out.push_str("Nothing deleted.");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Type", "Deleted At"]);
    for node in nodes {
        table.add_row(vec![
            node.id.clone(),
            display_name(node),
            node.node_type().as_str().to_string(),
            or_dash(&node.updated_at),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

fn push_items(out: &mut Vec<String>, items: &[TreeItem], depth: usize) {
    for item in items {
        let indent = "  ".repeat(depth);
        let name = display_name(&item.node);
        let label = if item.node.is_folder() {
            format!("{}/", name.bold().blue())
        } else {
            format!("{} {}", name, item.node.node_type().as_str().dimmed())
        };
        out.push(format!("{}{}  {}", indent, label, item.node.id.dimmed()));
        push_items(out, &item.children, depth + 1);
    }
}

/// Indented tree, children below their parent.
pub fn format_tree_text(project_id: &str, items: &[TreeItem]) -> String {
    let mut lines = vec![format_section_heading(project_id), String::new()];
    if items.is_empty() {
        lines.push("Empty project.".to_string());
    } else {
        push_items(&mut lines, items, 0);
    }
    lines.join("\n")
}

pub fn format_project_text(project: &Project) -> String {
    format!(
        "{}\n\n  Documents: {}",
        format_section_heading(&project.id),
        project.doc_num.green()
    )
}

/// Ids touched by a command, one per line under a summary line.
pub fn format_id_list(summary: &str, ids: &[String]) -> String {
    let mut out = format!("{} {}", summary.green(), ids.len());
    for id in ids {
        out.push_str("\n  ");
        out.push_str(id);
    }
    out
}
