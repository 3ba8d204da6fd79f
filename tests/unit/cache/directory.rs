use super::*;

#[test]
fn sanitize_replaces_unsafe_characters() {
    assert_eq!(
        sanitize_video_id("my video/clip #1.mp4"),
        "my_video_clip__1.mp4"
    );
    assert_eq!(sanitize_video_id("ok-Name_2.v1"), "ok-Name_2.v1");
    assert_eq!(sanitize_video_id("../etc"), ".._etc");
    assert_eq!(sanitize_video_id("café"), "caf_");
}

#[test]
fn cache_file_name_appends_extension() {
    assert_eq!(cache_file_name("a b"), "a_b.ascache");
}

#[test]
fn write_read_stat_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path().join("nested"));
    assert!(!dir.exists("a.ascache"));
    assert_eq!(dir.list().unwrap(), Vec::<String>::new());

    dir.write("a.ascache", b"first").unwrap();
    dir.write("a.ascache", b"second version").unwrap();
    assert!(dir.exists("a.ascache"));
    assert_eq!(dir.read("a.ascache").unwrap(), b"second version");
    assert_eq!(dir.read_prefix("a.ascache", 6).unwrap(), b"second");
    assert_eq!(dir.read_prefix("a.ascache", 100).unwrap().len(), 14);

    let stat = dir.stat("a.ascache").unwrap();
    assert_eq!(stat.size_bytes, 14);
    assert!(stat.modified.is_some());

    assert!(dir.delete("a.ascache").unwrap());
    assert!(!dir.delete("a.ascache").unwrap());
    assert!(!dir.exists("a.ascache"));
}

#[test]
fn list_only_reports_cache_files() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    dir.write("b.ascache", b"x").unwrap();
    dir.write("a.ascache", b"x").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
    std::fs::create_dir(tmp.path().join("sub.ascache")).unwrap();

    assert_eq!(dir.list().unwrap(), vec!["a.ascache", "b.ascache"]);
}

#[test]
fn write_leaves_no_temp_files() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    dir.write("a.ascache", &[7u8; 1024]).unwrap();
    let names: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.ascache"]);
}

#[test]
fn read_missing_file_is_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = FsCacheDirectory::new(tmp.path());
    assert!(matches!(
        dir.read("missing.ascache"),
        Err(GlyphcastError::Io { .. })
    ));
    assert!(dir.stat("missing.ascache").is_err());
}
