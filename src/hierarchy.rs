use std::collections::HashMap;

use crate::model::{Constraint, Insets, LayerInfo, Point, Rect, TreeOutput, ViewNode};
use crate::resolver::{self, NameTable};
use crate::snapshot::{RawConstraint, RawView, Snapshot};

/// Marker substring identifying a bridge view that embeds a declarative
/// subtree (e.g. `_UIHostingView`).
const HOSTING_MARKER: &str = "HostingView";

/// Tree depth sentinel disabling pruning.
pub const UNBOUNDED_DEPTH: i32 = -1;

/// NSLayoutAttribute enum values.
/// https://developer.apple.com/documentation/uikit/nslayoutattribute
fn attribute_name(code: i64) -> Option<&'static str> {
    Some(match code {
        0 => "notAnAttribute",
        1 => "left",
        2 => "right",
        3 => "top",
        4 => "bottom",
        5 => "leading",
        6 => "trailing",
        7 => "width",
        8 => "height",
        9 => "centerX",
        10 => "centerY",
        11 => "lastBaseline",
        12 => "firstBaseline",
        32 => "leftMargin",
        33 => "rightMargin",
        34 => "topMargin",
        35 => "bottomMargin",
        36 => "leadingMargin",
        37 => "trailingMargin",
        38 => "centerXWithinMargins",
        39 => "centerYWithinMargins",
        _ => return None,
    })
}

pub fn lookup_attribute(code: i64) -> String {
    match attribute_name(code) {
        Some(name) => name.to_string(),
        None => code.to_string(),
    }
}

pub fn lookup_relation(code: i64) -> &'static str {
    match code {
        -1 => "<=",
        1 => ">=",
        _ => "==",
    }
}

pub fn build_rect(values: &[f64]) -> Option<Rect> {
    if values.len() < 4 {
        return None;
    }
    Some(Rect {
        x: values[0],
        y: values[1],
        width: values[2],
        height: values[3],
    })
}

pub fn build_point(values: &[f64]) -> Option<Point> {
    if values.len() < 2 {
        return None;
    }
    Some(Point {
        x: values[0],
        y: values[1],
    })
}

pub fn build_insets(values: &[f64]) -> Option<Insets> {
    if values.len() < 4 {
        return None;
    }
    Some(Insets {
        top: values[0],
        left: values[1],
        bottom: values[2],
        right: values[3],
    })
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

pub fn build_constraint(raw: &RawConstraint) -> Constraint {
    Constraint {
        class: or_placeholder(&raw.class, "NSLayoutConstraint"),
        address: or_placeholder(&raw.address, "?"),
        first_item: or_placeholder(&raw.first_item, "?"),
        first_attribute: lookup_attribute(raw.first_attribute),
        relation: lookup_relation(raw.relation).to_string(),
        second_item: or_placeholder(&raw.second_item, "?"),
        second_attribute: lookup_attribute(raw.second_attribute),
        multiplier: raw.multiplier,
        constant: raw.constant,
        priority: raw.priority,
    }
}

/// True when the node's class name, or its ancestry chain in the
/// classmap, carries the hosting marker.
pub fn is_hosting(view: &RawView, classmap: &HashMap<String, String>) -> bool {
    if view.class.contains(HOSTING_MARKER) {
        return true;
    }
    match classmap.get(&view.class) {
        Some(chain) => chain.contains(HOSTING_MARKER),
        None => false,
    }
}

fn build_tree_node(
    view: &RawView,
    classmap: &HashMap<String, String>,
    resolver: Option<&NameTable>,
    depth: i32,
    max_depth: i32,
) -> ViewNode {
    let mut node = ViewNode::new(resolver::resolve_class(&view.class, resolver), &view.address);
    node.frame = build_rect(&view.frame);
    node.is_hosting_view = is_hosting(view, classmap);

    if max_depth >= 0 && depth >= max_depth {
        return node;
    }

    node.subviews = view
        .subviews
        .iter()
        .map(|sv| build_tree_node(sv, classmap, resolver, depth + 1, max_depth))
        .collect();
    node
}

/// Projects a snapshot into the depth-limited navigation tree.
/// `max_depth` of [`UNBOUNDED_DEPTH`] disables pruning; otherwise nodes
/// at `depth == max_depth` are emitted without their children.
pub fn build_tree(snapshot: &Snapshot, max_depth: i32, resolver: Option<&NameTable>) -> TreeOutput {
    let views = snapshot
        .views
        .iter()
        .map(|v| build_tree_node(v, &snapshot.classmap, resolver, 0, max_depth))
        .collect();
    TreeOutput { views }
}

/// Projects a single raw node into the fully-detailed view model.
/// Optional fields mirror presence in the source; subview count is
/// always set.
pub fn build_detail(
    view: &RawView,
    classmap: &HashMap<String, String>,
    resolver: Option<&NameTable>,
) -> ViewNode {
    let mut node = ViewNode::new(resolver::resolve_class(&view.class, resolver), &view.address);

    if let Some(chain) = classmap.get(&view.class) {
        if !chain.is_empty() {
            node.inheritance = Some(resolver::resolve_chain(chain, resolver));
        }
    }

    node.frame = build_rect(&view.frame);
    node.bounds = build_rect(&view.bounds);
    node.position = build_point(&view.position);
    node.hidden = view.hidden;
    node.layout_margins = build_insets(&view.layout_margins);
    node.has_ambiguous_layout = view.has_ambiguous_layout;

    if let Some(layer) = &view.layer {
        let class = layer.get("class").map(String::as_str).unwrap_or("");
        let address = layer.get("address").map(String::as_str).unwrap_or("");
        node.layer = Some(LayerInfo {
            class: resolver::resolve_class(&or_placeholder(class, "CALayer"), resolver).to_string(),
            address: or_placeholder(address, "?"),
        });
    }

    node.constraints = view.constraints.iter().map(build_constraint).collect();
    node.subview_count = Some(view.subviews.len());
    node.is_hosting_view = is_hosting(view, classmap);

    node
}

/// Builds a detail projection and attaches the extracted snapshot image
/// path when the node carries a valid payload.
pub fn build_detail_with_snapshot(
    view: &RawView,
    classmap: &HashMap<String, String>,
    resolver: Option<&NameTable>,
) -> ViewNode {
    let mut node = build_detail(view, classmap, resolver);
    node.snapshot = crate::snapshot::extract_snapshot(view).map(|p| p.display().to_string());
    node
}

/// Full recursive walk producing an address → resolved-class-name map,
/// used to render constraint operands by name instead of raw address.
pub fn address_class_index(snapshot: &Snapshot, resolver: Option<&NameTable>) -> HashMap<String, String> {
    let mut index = HashMap::new();

    fn walk(views: &[RawView], resolver: Option<&NameTable>, index: &mut HashMap<String, String>) {
        for view in views {
            if !view.address.is_empty() {
                index.insert(
                    view.address.clone(),
                    resolver::resolve_class(&view.class, resolver).to_string(),
                );
            }
            walk(&view.subviews, resolver, index);
        }
    }
    walk(&snapshot.views, resolver, &mut index);
    index
}
