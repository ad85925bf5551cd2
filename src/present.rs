use std::collections::HashMap;
use std::io::Write;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{Constraint, DetailOutput, SwiftUiNode, TreeOutput};

/// Writes tree output as YAML.
pub fn write_tree_yaml(w: &mut impl Write, tree: &TreeOutput) -> Result<()> {
    let text = serde_yaml::to_string(tree).context("serialize tree yaml")?;
    w.write_all(text.as_bytes()).context("write tree yaml")
}

pub fn write_tree_json(w: &mut impl Write, tree: &TreeOutput) -> Result<()> {
    let text = serde_json::to_string_pretty(tree).context("serialize tree json")?;
    writeln!(w, "{}", text).context("write tree json")
}

/// Writes detail output as YAML.
pub fn write_detail_yaml(w: &mut impl Write, detail: &DetailOutput) -> Result<()> {
    let text = serde_yaml::to_string(detail).context("serialize detail yaml")?;
    w.write_all(text.as_bytes()).context("write detail yaml")
}

pub fn write_detail_json(w: &mut impl Write, detail: &DetailOutput) -> Result<()> {
    let text = serde_json::to_string_pretty(detail).context("serialize detail json")?;
    writeln!(w, "{}", text).context("write detail json")
}

/// Formats a number with no decimal point when integral, otherwise with
/// exactly one decimal digit.
pub fn format_number(v: f64) -> String {
    if v == (v as i64) as f64 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Renders a constraint operand address as its resolved class name when
/// known, otherwise shortened ("0x104b1dd50" → "0x…1dd50") when long
/// enough, else verbatim.
pub fn resolve_operand(addr: &str, index: &HashMap<String, String>) -> String {
    if let Some(name) = index.get(addr) {
        return name.clone();
    }
    if addr.len() > 7 && addr.starts_with("0x") {
        return format!("0x…{}", &addr[addr.len() - 5..]);
    }
    addr.to_string()
}

/// True for a constraint whose right-hand side is a literal value
/// rather than another node's attribute.
pub fn is_constant_only(c: &Constraint) -> bool {
    (c.second_item == "0x0" || c.second_item == "?") && c.second_attribute == "notAnAttribute"
}

/// Formats one constraint as
/// `<first>.<attr> <rel> <second>.<attr> [* m] [+ c | - |c|] [(priority: p)]`,
/// with the literal constant replacing the second operand for
/// constant-only constraints.
pub fn format_constraint(c: &Constraint, index: &HashMap<String, String>) -> String {
    let mut out = format!(
        "{}.{} {} ",
        resolve_operand(&c.first_item, index),
        c.first_attribute,
        c.relation
    );

    if is_constant_only(c) {
        out.push_str(&format_number(c.constant));
    } else {
        out.push_str(&format!(
            "{}.{}",
            resolve_operand(&c.second_item, index),
            c.second_attribute
        ));
        if c.multiplier != 1.0 {
            out.push_str(&format!(" * {}", format_number(c.multiplier)));
        }
        if c.constant != 0.0 {
            if c.constant > 0.0 {
                out.push_str(&format!(" + {}", format_number(c.constant)));
            } else {
                out.push_str(&format!(" - {}", format_number(-c.constant)));
            }
        }
    }

    if c.priority != 1000.0 {
        out.push_str(&format!("  (priority: {:.0})", c.priority));
    }

    out
}

/// Renders declarative subtree nodes with box-drawing connectors.
/// `prefix` is the inherited line prefix from parent nodes.
pub fn render_subtree_text(nodes: &[SwiftUiNode], prefix: &str) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };

        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&node.name);
        if let Some(value) = &node.value {
            out.push_str(&format!(" {:?}", value));
        }
        if let Some(size) = &node.size {
            out.push_str(&format!(
                "  {}x{}",
                format_number(size.width),
                format_number(size.height)
            ));
        }
        out.push('\n');

        if !node.children.is_empty() {
            let child_prefix = if is_last {
                format!("{}    ", prefix)
            } else {
                format!("{}│   ", prefix)
            };
            out.push_str(&render_subtree_text(&node.children, &child_prefix));
        }
    }
    out
}

fn yaml_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*(?:- )?)(\w+)(:.*)$").expect("yaml key regex"))
}

/// Splits a YAML line into (prefix, key, rest) for key highlighting.
/// Lines without a key position return `None`.
pub fn split_yaml_key(line: &str) -> Option<(&str, &str, &str)> {
    let caps = yaml_key_re().captures(line)?;
    Some((
        caps.get(1).map_or("", |m| m.as_str()),
        caps.get(2).map_or("", |m| m.as_str()),
        caps.get(3).map_or("", |m| m.as_str()),
    ))
}
