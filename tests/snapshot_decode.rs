use anyhow::{Context, Result};
use plist::{Dictionary, Value};

use vantage::snapshot::{Snapshot, is_valid_png};

fn dict(entries: Vec<(&str, Value)>) -> Dictionary {
    let mut d = Dictionary::new();
    for (key, value) in entries {
        d.insert(key.to_string(), value);
    }
    d
}

fn reals(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|v| Value::Real(*v)).collect())
}

fn view(class: &str, address: &str, extra: Vec<(&str, Value)>) -> Value {
    let mut d = dict(vec![
        ("class", Value::String(class.to_string())),
        ("address", Value::String(address.to_string())),
    ]);
    for (key, value) in extra {
        d.insert(key.to_string(), value);
    }
    Value::Dictionary(d)
}

fn encode(root: Dictionary) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    Value::Dictionary(root)
        .to_writer_binary(&mut buf)
        .context("encode binary plist")?;
    Ok(buf)
}

#[test]
fn decode_round_trips_views_and_classmap() -> Result<()> {
    let root = dict(vec![
        (
            "views",
            Value::Array(vec![view(
                "UIWindow",
                "0x1",
                vec![
                    ("frame", reals(&[0.0, 0.0, 390.0, 844.0])),
                    ("hidden", Value::Boolean(false)),
                    (
                        "subviews",
                        Value::Array(vec![view(
                            "UILabel",
                            "0x2",
                            vec![("bounds", reals(&[0.0, 0.0, 100.0, 20.0]))],
                        )]),
                    ),
                ],
            )]),
        ),
        (
            "classmap",
            Value::Dictionary(dict(vec![(
                "UILabel",
                Value::String("UILabel/UIView/UIResponder".to_string()),
            )])),
        ),
    ]);

    let snapshot = Snapshot::decode(&encode(root)?)?;

    assert_eq!(snapshot.views.len(), 1);
    let window = &snapshot.views[0];
    assert_eq!(window.class, "UIWindow");
    assert_eq!(window.address, "0x1");
    assert_eq!(window.frame, vec![0.0, 0.0, 390.0, 844.0]);
    assert_eq!(window.hidden, Some(false));
    assert_eq!(window.subviews.len(), 1);
    assert_eq!(window.subviews[0].class, "UILabel");
    assert_eq!(window.subviews[0].bounds, vec![0.0, 0.0, 100.0, 20.0]);
    assert_eq!(
        snapshot.classmap.get("UILabel").map(String::as_str),
        Some("UILabel/UIView/UIResponder")
    );
    Ok(())
}

#[test]
fn decode_constraints_with_integer_and_float_fields() -> Result<()> {
    let constraint = Value::Dictionary(dict(vec![
        ("class", Value::String("NSLayoutConstraint".to_string())),
        ("address", Value::String("0xc1".to_string())),
        ("firstItem", Value::String("0x2".to_string())),
        ("firstAttribute", Value::Integer(7i64.into())),
        ("relation", Value::Integer(0i64.into())),
        ("secondItem", Value::String("0x0".to_string())),
        ("secondAttribute", Value::Integer(0i64.into())),
        ("multiplier", Value::Real(1.0)),
        ("constant", Value::Real(44.0)),
        ("priority", Value::Real(1000.0)),
    ]));
    let root = dict(vec![
        (
            "views",
            Value::Array(vec![view(
                "UIView",
                "0x2",
                vec![("constraints", Value::Array(vec![constraint]))],
            )]),
        ),
        ("classmap", Value::Dictionary(Dictionary::new())),
    ]);

    let snapshot = Snapshot::decode(&encode(root)?)?;
    let decoded = &snapshot.views[0].constraints[0];
    assert_eq!(decoded.first_attribute, 7);
    assert_eq!(decoded.relation, 0);
    assert_eq!(decoded.second_attribute, 0);
    assert_eq!(decoded.constant, 44.0);
    Ok(())
}

#[test]
fn decode_handles_deep_nesting() -> Result<()> {
    let mut node = view("UIView", "0xleaf", vec![]);
    for i in 0..200 {
        node = view(
            "UIView",
            &format!("0x{}", i),
            vec![("subviews", Value::Array(vec![node]))],
        );
    }
    let root = dict(vec![
        ("views", Value::Array(vec![node])),
        ("classmap", Value::Dictionary(Dictionary::new())),
    ]);

    let snapshot = Snapshot::decode(&encode(root)?)?;
    assert!(snapshot.find_by_address("0xleaf").is_some());
    Ok(())
}

#[test]
fn decode_rejects_missing_top_level_keys() -> Result<()> {
    let root = dict(vec![("views", Value::Array(vec![]))]);
    assert!(Snapshot::decode(&encode(root)?).is_err());

    assert!(Snapshot::decode(b"not a plist").is_err());
    Ok(())
}

#[test]
fn find_by_address_locates_nested_nodes() -> Result<()> {
    let root = dict(vec![
        (
            "views",
            Value::Array(vec![
                view(
                    "UIWindow",
                    "0x1",
                    vec![(
                        "subviews",
                        Value::Array(vec![view(
                            "UIView",
                            "0x2",
                            vec![(
                                "subviews",
                                Value::Array(vec![view("UILabel", "0x3", vec![])]),
                            )],
                        )]),
                    )],
                ),
                view("UIWindow", "0x4", vec![]),
            ]),
        ),
        ("classmap", Value::Dictionary(Dictionary::new())),
    ]);

    let snapshot = Snapshot::decode(&encode(root)?)?;
    assert_eq!(snapshot.find_by_address("0x3").map(|v| v.class.as_str()), Some("UILabel"));
    assert_eq!(snapshot.find_by_address("0x4").map(|v| v.class.as_str()), Some("UIWindow"));
    assert!(snapshot.find_by_address("0xdead").is_none());
    Ok(())
}

#[test]
fn png_signature_gates_image_payloads() {
    let valid = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01];
    assert!(is_valid_png(&valid));
    assert!(!is_valid_png(&valid[..7]));
    assert!(!is_valid_png(b"GIF89a something"));
    assert!(!is_valid_png(b""));
}
