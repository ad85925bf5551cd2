use std::collections::HashMap;

use anyhow::Result;

use vantage::model::{
    Constraint, DetailOutput, Size, SwiftUiNode, SwiftUiOutput, TreeOutput, ViewNode,
};
use vantage::present::{
    format_constraint, format_number, render_subtree_text, resolve_operand, split_yaml_key,
    write_detail_yaml, write_tree_yaml,
};

fn constraint() -> Constraint {
    Constraint {
        class: "NSLayoutConstraint".to_string(),
        address: "0xc0".to_string(),
        first_item: "0x1".to_string(),
        first_attribute: "width".to_string(),
        relation: "==".to_string(),
        second_item: "0x2".to_string(),
        second_attribute: "width".to_string(),
        multiplier: 1.0,
        constant: 0.0,
        priority: 1000.0,
    }
}

#[test]
fn format_number_drops_trailing_zero() {
    assert_eq!(format_number(10.0), "10");
    assert_eq!(format_number(-8.0), "-8");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(1.25), "1.2");
}

#[test]
fn operands_resolve_shorten_or_pass_through() {
    let mut index = HashMap::new();
    index.insert("0x104b1dd50".to_string(), "UIStackView".to_string());

    assert_eq!(resolve_operand("0x104b1dd50", &index), "UIStackView");
    assert_eq!(resolve_operand("0x104b2ee60", &index), "0x…2ee60");
    assert_eq!(resolve_operand("0x1", &index), "0x1");
    assert_eq!(resolve_operand("?", &index), "?");
}

#[test]
fn constraint_with_defaults_has_no_suffixes() {
    let line = format_constraint(&constraint(), &HashMap::new());
    assert_eq!(line, "0x1.width == 0x2.width");
}

#[test]
fn constraint_constant_signs() {
    let mut c = constraint();
    c.constant = 10.0;
    assert_eq!(format_constraint(&c, &HashMap::new()), "0x1.width == 0x2.width + 10");

    c.constant = -8.0;
    assert_eq!(format_constraint(&c, &HashMap::new()), "0x1.width == 0x2.width - 8");
}

#[test]
fn constraint_multiplier_and_priority_suffixes() {
    let mut c = constraint();
    c.multiplier = 0.5;
    c.priority = 750.0;
    assert_eq!(
        format_constraint(&c, &HashMap::new()),
        "0x1.width == 0x2.width * 0.5  (priority: 750)"
    );
}

#[test]
fn constant_only_constraint_renders_literal() {
    let mut c = constraint();
    c.second_item = "0x0".to_string();
    c.second_attribute = "notAnAttribute".to_string();
    c.constant = 44.0;
    assert_eq!(format_constraint(&c, &HashMap::new()), "0x1.width == 44");

    c.second_item = "?".to_string();
    assert_eq!(format_constraint(&c, &HashMap::new()), "0x1.width == 44");
}

#[test]
fn constraint_operands_use_resolved_names() {
    let mut index = HashMap::new();
    index.insert("0x1".to_string(), "UILabel".to_string());
    index.insert("0x2".to_string(), "UIView".to_string());
    assert_eq!(
        format_constraint(&constraint(), &index),
        "UILabel.width == UIView.width"
    );
}

fn subtree_node(name: &str, size: Option<(f64, f64)>, children: Vec<SwiftUiNode>) -> SwiftUiNode {
    SwiftUiNode {
        name: name.to_string(),
        size: size.map(|(width, height)| Size { width, height }),
        children,
        ..SwiftUiNode::default()
    }
}

#[test]
fn subtree_text_uses_box_drawing_connectors() {
    let nodes = vec![subtree_node(
        "Root",
        Some((390.0, 844.0)),
        vec![
            subtree_node("Text", Some((50.0, 20.0)), vec![]),
            subtree_node(
                "Stack",
                Some((100.0, 40.0)),
                vec![subtree_node("Image", Some((24.0, 24.0)), vec![])],
            ),
        ],
    )];

    let text = render_subtree_text(&nodes, "");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "└── Root  390x844");
    assert_eq!(lines[1], "    ├── Text  50x20");
    assert_eq!(lines[2], "    └── Stack  100x40");
    assert_eq!(lines[3], "        └── Image  24x24");
}

#[test]
fn subtree_text_quotes_values_and_continues_prefixes() {
    let nodes = vec![
        SwiftUiNode {
            name: "Text".to_string(),
            value: Some("Hello".to_string()),
            size: Some(Size {
                width: 50.0,
                height: 20.0,
            }),
            children: vec![subtree_node("Inner", None, vec![])],
            ..SwiftUiNode::default()
        },
        subtree_node("Spacer", None, vec![]),
    ];

    let text = render_subtree_text(&nodes, "");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "├── Text \"Hello\"  50x20");
    assert_eq!(lines[1], "│   └── Inner");
    assert_eq!(lines[2], "└── Spacer");
}

#[test]
fn tree_yaml_omits_absent_fields() -> Result<()> {
    let tree = TreeOutput {
        views: vec![ViewNode::new("UIWindow", "0x1")],
    };
    let mut buf = Vec::new();
    write_tree_yaml(&mut buf, &tree)?;
    let yaml = String::from_utf8(buf)?;

    assert!(yaml.starts_with("views:"));
    assert!(yaml.contains("class: UIWindow"));
    assert!(yaml.contains("address: '0x1'") || yaml.contains("address: 0x1"));
    assert!(!yaml.contains("frame"));
    assert!(!yaml.contains("constraints"));
    assert!(!yaml.contains("isHostingView"));
    assert!(!yaml.contains("subviewCount"));
    Ok(())
}

#[test]
fn detail_yaml_includes_subtree_section_when_present() -> Result<()> {
    let mut uikit = ViewNode::new("MyHostingView", "0x2");
    uikit.subview_count = Some(0);
    uikit.is_hosting_view = true;

    let detail = DetailOutput {
        uikit,
        swiftui: Some(SwiftUiOutput {
            tree: vec![subtree_node("Text", Some((10.0, 10.0)), vec![])],
        }),
    };
    let mut buf = Vec::new();
    write_detail_yaml(&mut buf, &detail)?;
    let yaml = String::from_utf8(buf)?;

    assert!(yaml.starts_with("uikit:"));
    assert!(yaml.contains("subviewCount: 0"));
    assert!(yaml.contains("isHostingView: true"));
    assert!(yaml.contains("swiftui:"));
    assert!(yaml.contains("tree:"));
    assert!(yaml.contains("name: Text"));
    // The qualified type is omitted when it matches the short name.
    assert!(!yaml.contains("type:"));
    Ok(())
}

#[test]
fn detail_yaml_without_subtree_has_no_swiftui_key() -> Result<()> {
    let detail = DetailOutput {
        uikit: ViewNode::new("UIView", "0x9"),
        swiftui: None,
    };
    let mut buf = Vec::new();
    write_detail_yaml(&mut buf, &detail)?;
    let yaml = String::from_utf8(buf)?;
    assert!(!yaml.contains("swiftui"));
    Ok(())
}

#[test]
fn yaml_key_splitting_for_highlighting() {
    assert_eq!(split_yaml_key("class: UIView"), Some(("", "class", ": UIView")));
    assert_eq!(
        split_yaml_key("  - name: Text"),
        Some(("  - ", "name", ": Text"))
    );
    assert_eq!(
        split_yaml_key("    subviewCount: 3"),
        Some(("    ", "subviewCount", ": 3"))
    );
    assert!(split_yaml_key("└── Text").is_none());
    assert!(split_yaml_key("").is_none());
}
