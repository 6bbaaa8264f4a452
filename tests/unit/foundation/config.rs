use super::*;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load_from(&dir.path().join("nope.json"));
    assert_eq!(cfg.logging.level, "info");
    assert!(!cfg.logging.json);
}

#[test]
fn corrupt_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let cfg = AppConfig::load_from(&path);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn save_then_load_keeps_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let cfg = AppConfig {
        profile_dir: dir.path().join("p"),
        logging: LoggingConfig {
            level: "debug".to_string(),
            json: true,
        },
    };
    cfg.save_to(&path).unwrap();
    let back = AppConfig::load_from(&path);
    assert_eq!(back.profile_dir, dir.path().join("p"));
    assert_eq!(back.logging.level, "debug");
    assert!(back.logging.json);
}

#[test]
fn partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"logging": {"json": true}}"#).unwrap();
    let cfg = AppConfig::load_from(&path);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
}
