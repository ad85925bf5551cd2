use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::hierarchy;
use crate::present::format_number;
use crate::resolver::{self, NameTable};
use crate::snapshot::{RawView, Snapshot};

/// One visible row of the navigation tree. Rows reference nodes by
/// address only; the snapshot arena resolves them on selection.
#[derive(Clone, Debug)]
pub(super) struct TreeRow {
    pub(super) address: String,
    pub(super) label: String,
    pub(super) depth: usize,
    pub(super) has_children: bool,
    pub(super) expanded: bool,
}

/// Display label: resolved class, hosting marker, frame dimensions.
pub(super) fn row_label(view: &RawView, snapshot: &Snapshot, resolved: Option<&NameTable>) -> String {
    let mut label = resolver::resolve_class(&view.class, resolved).to_string();
    if hierarchy::is_hosting(view, &snapshot.classmap) {
        label.push_str(" ★");
    }
    if let Some(frame) = hierarchy::build_rect(&view.frame) {
        label.push_str(&format!(
            " {}x{}",
            format_number(frame.width),
            format_number(frame.height)
        ));
    }
    label
}

/// Flattens the snapshot into visible rows, skipping the children of
/// collapsed nodes.
pub(super) fn flatten_rows(
    snapshot: &Snapshot,
    resolved: Option<&NameTable>,
    collapsed: &HashSet<String>,
) -> Vec<TreeRow> {
    fn walk(
        views: &[RawView],
        snapshot: &Snapshot,
        resolved: Option<&NameTable>,
        collapsed: &HashSet<String>,
        depth: usize,
        rows: &mut Vec<TreeRow>,
    ) {
        for view in views {
            let expanded = !collapsed.contains(&view.address);
            rows.push(TreeRow {
                address: view.address.clone(),
                label: row_label(view, snapshot, resolved),
                depth,
                has_children: !view.subviews.is_empty(),
                expanded,
            });
            if expanded {
                walk(&view.subviews, snapshot, resolved, collapsed, depth + 1, rows);
            }
        }
    }

    let mut rows = Vec::new();
    walk(&snapshot.views, snapshot, resolved, collapsed, 0, &mut rows);
    rows
}

/// Flattens the whole tree (collapse state ignored) into
/// `address\t<indent><label>` lines for the external fuzzy filter.
pub(super) fn filter_lines(snapshot: &Snapshot, resolved: Option<&NameTable>) -> Vec<String> {
    fn walk(
        views: &[RawView],
        snapshot: &Snapshot,
        resolved: Option<&NameTable>,
        depth: usize,
        lines: &mut Vec<String>,
    ) {
        for view in views {
            lines.push(format!(
                "{}\t{}{}",
                view.address,
                "  ".repeat(depth),
                row_label(view, snapshot, resolved)
            ));
            walk(&view.subviews, snapshot, resolved, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(&snapshot.views, snapshot, resolved, 0, &mut lines);
    lines
}

/// Hands the flattened rows to fzf and returns the selected address,
/// or `None` when the user cancelled or selected nothing.
pub(super) fn run_fuzzy_filter(lines: &[String]) -> Result<Option<String>> {
    let mut child = Command::new("fzf")
        .args(["--ansi", "--no-sort", "--header=Select a view", "--with-nth=2.."])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .context("spawn fzf")?;

    {
        let stdin = child.stdin.as_mut().context("fzf stdin")?;
        for line in lines {
            writeln!(stdin, "{}", line).context("write fzf input")?;
        }
    }

    let output = child.wait_with_output().context("wait for fzf")?;
    let selected = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if selected.is_empty() {
        return Ok(None);
    }
    let address = match selected.split_once('\t') {
        Some((address, _)) => address.to_string(),
        None => selected,
    };
    Ok(Some(address))
}

/// Expands every ancestor of `address` so the row is visible after a
/// filter jump.
pub(super) fn expand_ancestors(snapshot: &Snapshot, address: &str, collapsed: &mut HashSet<String>) {
    fn walk(views: &[RawView], address: &str, trail: &mut Vec<String>, collapsed: &mut HashSet<String>) -> bool {
        for view in views {
            if view.address == address {
                for ancestor in trail.iter() {
                    collapsed.remove(ancestor);
                }
                return true;
            }
            trail.push(view.address.clone());
            if walk(&view.subviews, address, trail, collapsed) {
                return true;
            }
            trail.pop();
        }
        false
    }

    let mut trail = Vec::new();
    walk(&snapshot.views, address, &mut trail, collapsed);
}
