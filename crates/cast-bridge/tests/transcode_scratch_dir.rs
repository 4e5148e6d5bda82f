#[test]
fn scratch_directory_is_removed_on_drop() {
    let transcoder = cast_bridge::Transcoder::new(192).unwrap();
    let dir = std::env::temp_dir().join(format!("cast-bridge-{}", std::process::id()));
    assert!(dir.exists());
    drop(transcoder);
    assert!(!dir.exists());
}
