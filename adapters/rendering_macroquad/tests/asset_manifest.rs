use std::{fs, path::PathBuf};

use pattern_recall_rendering::Viewport;
use pattern_recall_rendering_macroquad::AssetManifest;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pattern-recall-{name}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("scratch directory is writable");
    dir
}

#[test]
fn load_resolves_images_next_to_manifest() {
    let dir = scratch_dir("manifest-load");
    let path = dir.join("manifest.toml");
    fs::write(
        &path,
        "version = 1\n\n[images]\nselection = \"marker.png\"\n",
    )
    .expect("manifest is writable");

    let manifest = AssetManifest::load(&path).expect("manifest loads");

    assert_eq!(manifest.selection(), Some(dir.join("marker.png").as_path()));
    assert_eq!(manifest.backdrop(), None);
    assert_eq!(manifest.viewport(), Viewport::default());
    fs::remove_dir_all(&dir).expect("scratch directory is removable");
}

#[test]
fn load_reports_missing_manifest() {
    let dir = scratch_dir("manifest-missing");
    let error = AssetManifest::load(dir.join("absent.toml")).expect_err("missing file must fail");

    assert!(
        format!("{error:#}").contains("failed to read asset manifest"),
        "unexpected error: {error:#}"
    );
    fs::remove_dir_all(&dir).expect("scratch directory is removable");
}
