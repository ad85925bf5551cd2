use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::process::{Command, Stdio};

use crate::snapshot::{RawView, Snapshot};

/// Mapping from raw (mangled) class names to display names. Only names
/// that actually changed are recorded.
pub type NameTable = HashMap<String, String>;

/// Returns the display name for a raw class name, or the name unchanged.
pub fn resolve_class<'a>(name: &'a str, table: Option<&'a NameTable>) -> &'a str {
    table
        .and_then(|t| t.get(name))
        .map(String::as_str)
        .unwrap_or(name)
}

/// Resolves each "/"-separated segment of an ancestry chain. The chain
/// is returned verbatim when no segment changed.
pub fn resolve_chain(chain: &str, table: Option<&NameTable>) -> String {
    let Some(table) = table else {
        return chain.to_string();
    };
    if chain.is_empty() {
        return String::new();
    }
    let mut changed = false;
    let parts: Vec<&str> = chain
        .split('/')
        .map(|part| match table.get(part) {
            Some(resolved) => {
                changed = true;
                resolved.as_str()
            }
            None => part,
        })
        .collect();
    if changed {
        parts.join("/")
    } else {
        chain.to_string()
    }
}

/// Collects every class name in a snapshot that may need resolution:
/// node classes, layer classes, and each "/"-segment of classmap keys
/// and values.
pub fn collect_names(snapshot: &Snapshot) -> Vec<String> {
    let mut seen = HashSet::new();

    fn walk(views: &[RawView], seen: &mut HashSet<String>) {
        for view in views {
            if !view.class.is_empty() {
                seen.insert(view.class.clone());
            }
            if let Some(layer) = &view.layer {
                if let Some(class) = layer.get("class") {
                    if !class.is_empty() {
                        seen.insert(class.clone());
                    }
                }
            }
            walk(&view.subviews, seen);
        }
    }
    walk(&snapshot.views, &mut seen);

    for (key, chain) in &snapshot.classmap {
        seen.insert(key.clone());
        for part in chain.split('/') {
            if !part.is_empty() {
                seen.insert(part.to_string());
            }
        }
    }

    seen.into_iter().collect()
}

/// Pipes names through `swift demangle`. Returns `None` when the tool
/// is missing, the run fails, or no name changed — callers then pass
/// raw names through unchanged.
pub fn resolve_names(names: &[String]) -> Option<NameTable> {
    if names.is_empty() {
        return None;
    }
    crate::platform::find_in_path("swift")?;

    let mut child = Command::new("swift")
        .arg("demangle")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    {
        let stdin = child.stdin.as_mut()?;
        let mut input = names.join("\n");
        input.push('\n');
        stdin.write_all(input.as_bytes()).ok()?;
    }

    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.trim_end_matches('\n').split('\n').collect();

    let mut table = NameTable::new();
    for (name, line) in names.iter().zip(lines) {
        let resolved = line.trim();
        if !resolved.is_empty() && resolved != name {
            table.insert(name.clone(), resolved.to_string());
        }
    }

    if table.is_empty() { None } else { Some(table) }
}

/// Collects and resolves in one step, for callers holding a snapshot.
pub fn resolve_snapshot_names(snapshot: &Snapshot) -> Option<NameTable> {
    resolve_names(&collect_names(snapshot))
}
