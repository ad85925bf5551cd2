use anyhow::Result;
use serde_json::json;

use vantage::swiftui;

#[test]
fn parse_derives_short_names() -> Result<()> {
    let doc = json!([
        {"type": "SwiftUI.Text", "size": "(100, 20)"},
        {"type": "MyApp.List<Row>", "size": "(390, 600)"},
        {"type": "Plain", "size": "(1, 1)"},
        {"type": "", "size": "(2, 2)"}
    ]);
    let nodes = swiftui::parse(doc.to_string().as_bytes(), false)?;

    assert_eq!(nodes[0].name, "Text");
    assert_eq!(nodes[0].qualified_type.as_deref(), Some("SwiftUI.Text"));

    assert_eq!(nodes[1].name, "List<Row>");
    assert_eq!(nodes[1].qualified_type.as_deref(), Some("MyApp.List<Row>"));

    // Identical short and qualified names collapse to the name alone.
    assert_eq!(nodes[2].name, "Plain");
    assert!(nodes[2].qualified_type.is_none());

    assert_eq!(nodes[3].name, "Unknown");
    assert!(nodes[3].qualified_type.is_none());
    Ok(())
}

#[test]
fn parse_tolerates_malformed_tuples() -> Result<()> {
    let doc = json!([
        {"type": "A.Text", "size": "(10, 20)", "position": "(1, 2)"},
        {"type": "A.Text", "size": "10 x 20"},
        {"type": "A.Text", "size": "(10)"},
        {"type": "A.Text", "size": "(a, b)"},
        {"type": "A.Text"}
    ]);
    let nodes = swiftui::parse(doc.to_string().as_bytes(), false)?;

    let sized = nodes[0].size.unwrap();
    assert_eq!((sized.width, sized.height), (10.0, 20.0));
    let position = nodes[0].position.unwrap();
    assert_eq!((position.x, position.y), (1.0, 2.0));

    for node in &nodes[1..] {
        assert!(node.size.is_none());
        assert!(node.position.is_none());
    }
    Ok(())
}

#[test]
fn parse_rejects_malformed_document() {
    assert!(swiftui::parse(b"{not json", false).is_err());
    assert!(swiftui::parse(b"{\"error\": \"x\"}", false).is_err());
}

fn compaction_fixture() -> Vec<u8> {
    json!([
        {
            "type": "App.Root", "size": "(390, 844)",
            "children": [
                {
                    "type": "SwiftUI.ModifiedContent<A, B>",
                    "children": [
                        {"type": "SwiftUI.Text", "value": "hi", "size": "(50, 20)"},
                        {
                            "type": "SwiftUI._ViewModifier_Content<C>",
                            "children": [
                                {"type": "SwiftUI.Image", "size": "(24, 24)"}
                            ]
                        }
                    ]
                },
                {"type": "SwiftUI.Spacer", "size": "(0, 10)"}
            ]
        }
    ])
    .to_string()
    .into_bytes()
}

#[test]
fn compact_mode_hoists_children_of_unsized_nodes() -> Result<()> {
    let nodes = swiftui::parse(&compaction_fixture(), true)?;

    assert_eq!(nodes.len(), 1);
    let root = &nodes[0];
    assert_eq!(root.name, "Root");
    // Both wrapper levels are elided; splice order is preserved.
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Text", "Image", "Spacer"]);
    Ok(())
}

#[test]
fn full_mode_emits_structure_verbatim() -> Result<()> {
    let nodes = swiftui::parse(&compaction_fixture(), false)?;

    let root = &nodes[0];
    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ModifiedContent<A, B>", "Spacer"]);
    assert_eq!(root.children[0].children.len(), 2);
    Ok(())
}

#[test]
fn compact_keeps_sized_root_chain() -> Result<()> {
    let doc = json!([
        {
            "type": "A.Root", "size": "(100, 100)",
            "children": [
                {
                    "type": "A.Wrapper",
                    "children": [
                        {"type": "A.Leaf", "size": "(10, 10)"}
                    ]
                }
            ]
        }
    ]);
    let nodes = swiftui::parse(doc.to_string().as_bytes(), true)?;

    assert_eq!(nodes[0].name, "Root");
    assert_eq!(nodes[0].children.len(), 1);
    assert_eq!(nodes[0].children[0].name, "Leaf");
    Ok(())
}

#[test]
fn unsized_roots_are_retained() -> Result<()> {
    let doc = json!([
        {"type": "A.Wrapper", "children": [{"type": "A.Leaf", "size": "(5, 5)"}]}
    ]);
    let nodes = swiftui::parse(doc.to_string().as_bytes(), true)?;
    assert_eq!(nodes[0].name, "Wrapper");
    assert_eq!(nodes[0].children[0].name, "Leaf");
    Ok(())
}

#[test]
fn extract_error_recognizes_failure_documents() {
    assert_eq!(
        swiftui::extract_error(b"{\"error\": \"boom\"}").as_deref(),
        Some("boom")
    );
    assert!(swiftui::extract_error(b"[]").is_none());
    assert!(swiftui::extract_error(b"not json").is_none());
    assert!(swiftui::extract_error(b"{\"error\": 5}").is_none());
}

#[test]
fn values_and_transforms_pass_through() -> Result<()> {
    let doc = json!([
        {"type": "SwiftUI.Text", "value": "Hello", "transform": "t(1,0)", "size": "(10, 10)"}
    ]);
    let nodes = swiftui::parse(doc.to_string().as_bytes(), false)?;
    assert_eq!(nodes[0].value.as_deref(), Some("Hello"));
    assert_eq!(nodes[0].transform.as_deref(), Some("t(1,0)"));
    Ok(())
}
