use serde::Serialize;

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// CALayer summary attached to a view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerInfo {
    pub class: String,
    pub address: String,
}

/// A decoded NSLayoutConstraint with attribute and relation codes
/// already turned into their display names.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub class: String,
    pub address: String,
    pub first_item: String,
    pub first_attribute: String,
    pub relation: String,
    pub second_item: String,
    pub second_attribute: String,
    pub multiplier: f64,
    pub constant: f64,
    pub priority: f64,
}

/// Presentation model for a UIKit view, used for both the navigation
/// tree and the single-node detail projection. Absent source data stays
/// absent here; serialization omits it entirely.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    pub class: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inheritance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_margins: Option<Insets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_ambiguous_layout: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subview_count: Option<usize>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_hosting_view: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subviews: Vec<ViewNode>,
}

impl ViewNode {
    pub fn new(class: impl Into<String>, address: impl Into<String>) -> Self {
        ViewNode {
            class: class.into(),
            address: address.into(),
            ..ViewNode::default()
        }
    }
}

/// Top-level structured output for tree mode.
#[derive(Clone, Debug, Serialize)]
pub struct TreeOutput {
    pub views: Vec<ViewNode>,
}

/// A node in the declarative (SwiftUI) subtree projection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SwiftUiNode {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub qualified_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SwiftUiNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SwiftUiOutput {
    pub tree: Vec<SwiftUiNode>,
}

/// Structured output for detail mode.
#[derive(Clone, Debug, Serialize)]
pub struct DetailOutput {
    pub uikit: ViewNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swiftui: Option<SwiftUiOutput>,
}
