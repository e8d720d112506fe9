use std::fs;
use std::path::PathBuf;

use glam::DVec2;

use super::features::{feature_file, parse_features};
use super::*;
use crate::error::Error;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn three_view_scene() -> Scene {
    Scene::new(
        "images",
        vec![
            View::new(0, "a.png", 8, 4),
            View::new(1, "b.png", 8, 4),
            View::new(5, "c.png", 8, 4),
        ],
    )
    .unwrap()
}

#[test]
fn test_scene_load_resolves_relative_root() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "sfm_data.json",
        r#"{"root_path": "images", "views": [
            {"id": 3, "path": "x.jpg", "width": 640, "height": 480},
            {"id": 1, "path": "y.jpg", "width": 320, "height": 240}
        ]}"#,
    );

    let scene = Scene::load(&path).unwrap();
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.root(), dir.path().join("images"));

    let ids: Vec<ViewId> = scene.views().map(|v| v.id).collect();
    assert_eq!(ids, vec![1, 3], "views are ordered by id");

    let view = scene.view(3).unwrap();
    assert_eq!(view.size(), (640, 480));
    assert_eq!(scene.image_path(view), dir.path().join("images").join("x.jpg"));
}

#[test]
fn test_scene_rejects_duplicate_ids() {
    let result = Scene::new(
        "",
        vec![View::new(2, "a.png", 1, 1), View::new(2, "b.png", 1, 1)],
    );
    assert!(matches!(result, Err(Error::DuplicateView(2))));
}

#[test]
fn test_scene_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Scene::load(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(Error::ReadFile { .. })));
}

#[test]
fn test_scene_load_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "sfm_data.json", "{ not json");
    assert!(matches!(Scene::load(&path), Err(Error::ParseJson { .. })));
}

#[test]
fn test_pair_key_is_canonical() {
    assert_eq!(PairKey::new(4, 1), PairKey::new(1, 4));
    let key = PairKey::new(9, 2);
    assert_eq!((key.lo(), key.hi()), (2, 9));
    assert!(key.contains(9) && key.contains(2) && !key.contains(3));
    assert_eq!(key.to_string(), "(2, 9)");
}

#[test]
fn test_insert_reversed_pair_reorients_matches() {
    let mut matches = PairwiseMatches::new();
    matches.insert(5, 1, "SIFT", vec![IndMatch::new(10, 20)]);
    matches.insert(1, 5, "SIFT", vec![IndMatch::new(30, 40)]);

    assert_eq!(matches.len(), 1);
    let per_desc = matches.get(PairKey::new(1, 5)).unwrap();
    assert_eq!(
        per_desc["SIFT"],
        vec![IndMatch::new(20, 10), IndMatch::new(30, 40)]
    );
    assert_eq!(matches.match_count(PairKey::new(5, 1)), 2);
}

#[test]
fn test_retain_supported_counts_all_describers() {
    let mut matches = PairwiseMatches::new();
    matches.insert(0, 1, "SIFT", vec![IndMatch::new(0, 0); 70]);
    matches.insert(0, 1, "AKAZE", vec![IndMatch::new(0, 0); 50]);
    matches.insert(1, 2, "SIFT", vec![IndMatch::new(0, 0); 119]);

    let removed = matches.retain_supported(120);
    assert_eq!(removed, 1);
    assert!(matches.contains(PairKey::new(0, 1)));
    assert!(!matches.contains(PairKey::new(1, 2)));
    assert_eq!(matches.view_ids().into_iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_matches_load_filters_describers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "matches.f.json",
        r#"[
            {"i": 5, "j": 0, "matches": {"SIFT": [[1, 2], [3, 4]], "AKAZE": [[9, 9]]}},
            {"i": 0, "j": 1, "matches": {"SIFT": [[0, 0]]}}
        ]"#,
    );

    let scene = three_view_scene();
    let matches = PairwiseMatches::load(&path, &["SIFT".to_string()], &scene).unwrap();
    assert_eq!(matches.len(), 2);

    let per_desc = matches.get(PairKey::new(0, 5)).unwrap();
    assert!(!per_desc.contains_key("AKAZE"));
    assert_eq!(
        per_desc["SIFT"],
        vec![IndMatch::new(2, 1), IndMatch::new(4, 3)],
        "indices follow the canonical (lo, hi) orientation"
    );
}

#[test]
fn test_matches_load_rejects_unknown_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "matches.f.json",
        r#"[{"i": 0, "j": 42, "matches": {"SIFT": [[0, 0]]}}]"#,
    );

    let result = PairwiseMatches::load(&path, &["SIFT".to_string()], &three_view_scene());
    assert!(matches!(result, Err(Error::UnknownView { view: 42, .. })));
}

#[test]
fn test_matches_load_rejects_self_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "matches.f.json",
        r#"[{"i": 1, "j": 1, "matches": {}}]"#,
    );

    let result = PairwiseMatches::load(&path, &["SIFT".to_string()], &three_view_scene());
    assert!(matches!(result, Err(Error::SelfPair(1))));
}

#[test]
fn test_parse_features() {
    let text = "1.5 2.0 3.0 0.1\n\n  4 5\n";
    let positions = parse_features(text, Path::new("v.feat")).unwrap();
    assert_eq!(positions, vec![DVec2::new(1.5, 2.0), DVec2::new(4.0, 5.0)]);
}

#[test]
fn test_parse_features_reports_line() {
    let text = "1 2\n3\n";
    match parse_features(text, Path::new("v.feat")) {
        Err(Error::ParseFeatures { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected ParseFeatures, got {:?}", other),
    }

    let text = "1 abc\n";
    assert!(matches!(
        parse_features(text, Path::new("v.feat")),
        Err(Error::ParseFeatures { line: 1, .. })
    ));
}

#[test]
fn test_features_load_and_lookup() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(feature_file(dir.path(), 0, "SIFT"), "10 20 1 0\n").unwrap();
    fs::write(feature_file(dir.path(), 1, "SIFT"), "30 40 1 0\n50 60 1 0\n").unwrap();

    let features = FeaturesPerView::load(dir.path(), [0, 1], &["SIFT".to_string()]).unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features.positions(1, "SIFT").unwrap().len(), 2);
    assert!(matches!(
        features.positions(1, "AKAZE"),
        Err(Error::MissingFeatures { view: 1, .. })
    ));

    let missing = FeaturesPerView::load(dir.path(), [7], &["SIFT".to_string()]);
    assert!(matches!(missing, Err(Error::ReadFile { .. })));
}
