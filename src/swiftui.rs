use serde::Deserialize;

use crate::error::Result;
use crate::model::{Point, Size, SwiftUiNode};

/// A node of the on-device declarative view graph. All property values
/// arrive as strings; size/position use "(a, b)" tuple text.
#[derive(Clone, Debug, Default, Deserialize)]
struct RawNode {
    #[serde(default, rename = "type")]
    node_type: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    transform: String,
    #[serde(default)]
    children: Vec<RawNode>,
}

/// Parses a "(a, b)" string into two numbers.
fn parse_tuple(s: &str) -> Option<(f64, f64)> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (a, b) = inner.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

/// Derives the short display name from a fully qualified type string,
/// e.g. "SwiftUI.Text" → "Text", "MyApp.List<Row>" → "List<Row>".
fn short_name(qualified: &str) -> String {
    if qualified.is_empty() {
        return "Unknown".to_string();
    }
    let base = match qualified.find('<') {
        Some(idx) => &qualified[..idx],
        None => qualified,
    };
    match base.rfind('.') {
        Some(dot) => qualified[dot + 1..].to_string(),
        None => qualified.to_string(),
    }
}

fn node_size(node: &RawNode) -> Option<Size> {
    parse_tuple(&node.size).map(|(width, height)| Size { width, height })
}

fn node_position(node: &RawNode) -> Option<Point> {
    parse_tuple(&node.position).map(|(x, y)| Point { x, y })
}

/// A node without a decodable size is an intermediate wrapper; compact
/// mode elides it and hoists its children, recursively, preserving
/// relative order across splices.
fn is_intermediate(node: &RawNode) -> bool {
    node_size(node).is_none()
}

fn collect_children(node: &RawNode, compact: bool) -> Vec<&RawNode> {
    if !compact {
        return node.children.iter().collect();
    }
    let mut result = Vec::new();
    for child in &node.children {
        if is_intermediate(child) {
            result.extend(collect_children(child, compact));
        } else {
            result.push(child);
        }
    }
    result
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn build_node(node: &RawNode, compact: bool) -> SwiftUiNode {
    let name = short_name(&node.node_type);
    let qualified_type = if node.node_type == name {
        None
    } else {
        non_empty(&node.node_type)
    };

    SwiftUiNode {
        name,
        qualified_type,
        position: node_position(node),
        size: node_size(node),
        value: non_empty(&node.value),
        transform: non_empty(&node.transform),
        children: collect_children(node, compact)
            .into_iter()
            .map(|child| build_node(child, compact))
            .collect(),
    }
}

/// Parses the declarative-subtree JSON document. Top-level roots are
/// kept even without a size; compaction applies below them.
pub fn parse(bytes: &[u8], compact: bool) -> Result<Vec<SwiftUiNode>> {
    let raw: Vec<RawNode> = serde_json::from_slice(bytes)?;
    Ok(raw.iter().map(|node| build_node(node, compact)).collect())
}

/// Recognizes the agent's `{"error": "<message>"}` failure document.
/// Anything else (including malformed JSON) yields `None`.
pub fn extract_error(bytes: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorDoc {
        error: String,
    }
    serde_json::from_slice::<ErrorDoc>(bytes)
        .ok()
        .map(|doc| doc.error)
}
