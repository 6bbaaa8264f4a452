use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(Color::parse("#00FF00").unwrap(), Color::rgb(0, 255, 0));
    assert_eq!(Color::parse("#0f0").unwrap(), Color::rgb(0, 255, 0));
    assert_eq!(
        Color::parse("#0000ff80").unwrap(),
        Color::rgba(0, 0, 255, 128)
    );
    assert_eq!(Color::parse("transparent").unwrap(), Color::TRANSPARENT);
}

#[test]
fn rejects_malformed_colors() {
    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("#zzzzzz").is_err());
    assert!(Color::parse("red").is_err());
}

#[test]
fn serde_uses_hex_strings() {
    let c: Color = serde_json::from_value(json!("#333")).unwrap();
    assert_eq!(c, Color::rgb(0x33, 0x33, 0x33));
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#333333"));
    assert_eq!(
        serde_json::to_value(Color::TRANSPARENT).unwrap(),
        json!("transparent")
    );
}

#[test]
fn premul_of_opaque_is_unchanged() {
    let p = Color::rgb(10, 20, 30).to_premul();
    assert_eq!(p.to_array(), [10, 20, 30, 255]);
}
