use super::*;

#[test]
fn empty_json_yields_defaults() {
    let s = ConvertSettings::from_json(b"{}").unwrap();
    assert_eq!(s, ConvertSettings::default());
    assert_eq!(s.num_columns, 80);
    assert_eq!(s.frame_interval_ms, 50);
    assert!((s.fps() - 20.0).abs() < 1e-9);
}

#[test]
fn partial_json_overrides_fields() {
    let s = ConvertSettings::from_json(br#"{"num_columns": 120, "charset": "blocks"}"#).unwrap();
    assert_eq!(s.num_columns, 120);
    assert_eq!(s.charset, Charset::Blocks);
    assert_eq!(s.brightness, 1.0);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = ConvertSettings::from_json(br#"{"columns": 3}"#).unwrap_err();
    assert!(matches!(err, GlyphcastError::Serde(_)));
}

#[test]
fn normalized_clamps_out_of_range_values() {
    let s = ConvertSettings {
        num_columns: 0,
        brightness: 7.5,
        charset: Charset::Minimal,
        frame_interval_ms: 0,
    }
    .normalized();
    assert_eq!(s.num_columns, 1);
    assert_eq!(s.brightness, 2.0);
    assert_eq!(s.frame_interval_ms, 1);

    let s = ConvertSettings {
        num_columns: 50_000,
        brightness: -1.0,
        frame_interval_ms: 1_000_000,
        ..ConvertSettings::default()
    }
    .normalized();
    assert_eq!(s.num_columns, MAX_COLUMNS);
    assert_eq!(s.brightness, 0.0);
    assert_eq!(s.frame_interval_ms, 65_535);
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, br#"{"brightness": 1.5}"#).unwrap();
    let s = ConvertSettings::from_path(&path).unwrap();
    assert_eq!(s.brightness, 1.5);

    let missing = ConvertSettings::from_path(&dir.path().join("nope.json"));
    assert!(missing.is_err());
}
