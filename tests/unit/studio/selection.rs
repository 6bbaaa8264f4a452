use super::*;

#[test]
fn select_replaces() {
    let mut s = Selection::default();
    s.select(SourceId::from("a"));
    s.select(SourceId::from("b"));
    assert_eq!(s.ids(), &[SourceId::from("b")]);
    assert_eq!(s.primary(), Some(&SourceId::from("b")));
}

#[test]
fn toggle_builds_multi_selection() {
    let mut s = Selection::default();
    assert!(s.toggle(SourceId::from("a")));
    assert!(s.toggle(SourceId::from("b")));
    assert_eq!(s.ids().len(), 2);
    assert!(!s.toggle(SourceId::from("b")));
    assert_eq!(s.primary(), Some(&SourceId::from("a")));
}

#[test]
fn retain_updates_primary() {
    let mut s = Selection::default();
    s.toggle(SourceId::from("a"));
    s.toggle(SourceId::from("b"));
    s.retain(|id| id.as_str() == "a");
    assert_eq!(s.primary(), Some(&SourceId::from("a")));
    s.clear();
    assert!(s.is_empty());
    assert!(s.primary().is_none());
}
