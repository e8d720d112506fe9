use std::path::Path;

use image::{Rgb, RgbImage};
use serde_json::json;

use super::*;
use crate::channel::Channel;
use crate::config::SelectionMethod;
use crate::lp::{LpError, LpProblem};
use crate::report::REPORT_FILE;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 8;
const STRONG: u32 = 150;
const WEAK: u32 = 10;

fn base_image() -> RgbImage {
    RgbImage::from_fn(WIDTH, HEIGHT, |x, _| {
        let x = x as u8;
        Rgb([x * 3, x * 2 + 30, x + 100])
    })
}

fn brightened(image: &RgbImage, delta: u8) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c += delta;
        }
    }
    out
}

fn match_list(count: u32) -> Vec<[u32; 2]> {
    (0..count).map(|k| [k, k]).collect()
}

/// Views 0-1-2 form a strongly matched path; view 3 hangs off view 2 by a weak pair.
/// View 1 is the base image brightened by 20 levels.
fn write_fixture(dir: &Path) {
    let images = dir.join("images");
    std::fs::create_dir_all(&images).unwrap();
    let base = base_image();
    base.save(images.join("v0.png")).unwrap();
    brightened(&base, 20).save(images.join("v1.png")).unwrap();
    base.save(images.join("v2.png")).unwrap();
    brightened(&base, 40).save(images.join("v3.png")).unwrap();

    let views: Vec<_> = (0..4)
        .map(|id| json!({"id": id, "path": format!("v{id}.png"), "width": WIDTH, "height": HEIGHT}))
        .collect();
    let scene = json!({"root_path": "images", "views": views});
    std::fs::write(dir.join("sfm_data.json"), scene.to_string()).unwrap();

    write_matches(dir, &[(1, 0, STRONG), (1, 2, STRONG), (3, 2, WEAK)]);

    for view in 0..4 {
        let lines: Vec<String> = (0..STRONG)
            .map(|i| format!("{} 4.0 1.0 0.0", (i % 60) + 2))
            .collect();
        std::fs::write(dir.join(format!("matches/{view}.SIFT.feat")), lines.join("\n")).unwrap();
    }
}

fn write_matches(dir: &Path, pairs: &[(u32, u32, u32)]) {
    let matches_dir = dir.join("matches");
    std::fs::create_dir_all(&matches_dir).unwrap();
    let records: Vec<_> = pairs
        .iter()
        .map(|&(i, j, count)| json!({"i": i, "j": j, "matches": {"SIFT": match_list(count)}}))
        .collect();
    std::fs::write(
        matches_dir.join("matches.f.json"),
        serde_json::Value::Array(records).to_string(),
    )
    .unwrap();
}

fn config(dir: &Path, method: SelectionMethod, reference: u32) -> HarmonizeConfig {
    HarmonizeConfig::new(
        dir.join("sfm_data.json"),
        dir.join("matches"),
        dir.join("out"),
        method,
        reference,
    )
}

fn assert_identity(correction: crate::solve::GainOffset) {
    assert!(
        (correction.gain - 1.0).abs() < 1e-6 && correction.offset.abs() < 1e-6,
        "expected identity, got {correction:?}"
    );
}

#[test]
fn test_full_frame_run() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = config(dir.path(), SelectionMethod::FullFrame, 0);
    let images_dir = config.images_dir();

    let report = Harmonizer::new(config).unwrap().run().unwrap();

    // Graph: weak pair (2, 3) removed, view 3 dropped.
    assert_eq!(report.graph.initial_nodes, 4);
    assert_eq!(report.graph.initial_edges, 3);
    assert_eq!(report.graph.supported_edges, 2);
    assert_eq!(report.graph.kept_nodes, 3);
    assert_eq!(report.graph.kept_edges, 2);
    for name in ["initial_graph.dot", "supported_graph.dot", "cleaned_graph.dot"] {
        assert!(dir.path().join("out").join(name).is_file(), "{name} missing");
    }

    // Solution: view 1 is pulled back by 20 levels in every channel.
    for channel in Channel::ALL {
        assert!(report.max_error.get(channel).abs() < 1e-6);
    }
    let ids: Vec<u32> = report.cameras.iter().map(|c| c.view_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(report.cameras[0].red, crate::solve::GainOffset::IDENTITY);
    for correction in [report.cameras[1].red, report.cameras[1].green, report.cameras[1].blue] {
        assert!((correction.gain - 1.0).abs() < 1e-6, "{correction:?}");
        assert!((correction.offset + 20.0).abs() < 1e-6, "{correction:?}");
    }
    assert_identity(report.cameras[2].green);

    // Output: every surviving image now equals the base image.
    assert_eq!(images_dir.file_name().unwrap(), "fullFrame_quantifiedGainCompensation");
    let base = base_image();
    for name in ["v0.png", "v1.png", "v2.png"] {
        let out = image::open(images_dir.join(name)).unwrap().into_rgb8();
        assert_eq!(out, base, "{name} not harmonized");
    }
    assert!(!images_dir.join("v3.png").exists());
    assert!(!dir
        .path()
        .join("out/.fullFrame_quantifiedGainCompensation.partial")
        .exists());

    let loaded = HarmonizationReport::load(&dir.path().join("out").join(REPORT_FILE)).unwrap();
    assert_eq!(loaded.graph, report.graph);
    assert_eq!(loaded.cameras.len(), 3);
    assert_eq!(loaded.images_dir, images_dir);
}

#[test]
fn test_matched_points_run() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let report = Harmonizer::new(config(dir.path(), SelectionMethod::MatchedPoints, 2))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.selection_method, "matchedPoints");
    assert_eq!(report.reference_view, 2);
    assert_eq!(report.cameras[2].blue, crate::solve::GainOffset::IDENTITY);
    for channel in Channel::ALL {
        assert!(report.max_error.get(channel).abs() < 1e-6);
    }
    assert!((report.cameras[1].red.offset + 20.0).abs() < 1e-6);
}

#[test]
fn test_existing_result_directory_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = config(dir.path(), SelectionMethod::FullFrame, 0);
    let images_dir = config.images_dir();
    std::fs::create_dir_all(&images_dir).unwrap();
    std::fs::write(images_dir.join("stale.txt"), "old").unwrap();

    Harmonizer::new(config).unwrap().run().unwrap();

    assert!(!images_dir.join("stale.txt").exists());
    assert!(images_dir.join("v0.png").is_file());
}

#[test]
fn test_reference_outside_scene() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let err = Harmonizer::new(config(dir.path(), SelectionMethod::FullFrame, 9))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::ReferenceOutOfRange {
            view: 9,
            view_count: 4
        })
    ));
}

#[test]
fn test_reference_pruned_away() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = config(dir.path(), SelectionMethod::FullFrame, 3);
    let images_dir = config.images_dir();

    let err = Harmonizer::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, Error::ReferenceNotInComponent(3)));
    assert!(!images_dir.exists());
}

#[test]
fn test_no_supported_pairs() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    write_matches(dir.path(), &[(0, 1, WEAK), (1, 2, WEAK)]);

    let err = Harmonizer::new(config(dir.path(), SelectionMethod::FullFrame, 0))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::GraphEmpty));
}

#[test]
fn test_missing_features_for_matched_points() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    std::fs::remove_file(dir.path().join("matches/1.SIFT.feat")).unwrap();

    let err = Harmonizer::new(config(dir.path(), SelectionMethod::MatchedPoints, 0))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::ReadFile { .. }));
}

struct FailingSolver;

impl LpSolver for FailingSolver {
    fn solve(&self, _problem: &LpProblem) -> std::result::Result<Vec<f64>, LpError> {
        Err(LpError::Infeasible)
    }
}

#[test]
fn test_solver_failure_writes_no_images() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = config(dir.path(), SelectionMethod::FullFrame, 0);
    let images_dir = config.images_dir();

    let err = Harmonizer::new(config)
        .unwrap()
        .with_solver(FailingSolver)
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::LpSolve { .. }));
    assert!(!images_dir.exists());
    assert!(!dir.path().join("out").join(REPORT_FILE).exists());
}

#[test]
fn test_invalid_config_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), SelectionMethod::FullFrame, 0).with_describers(Vec::new());

    assert!(matches!(
        Harmonizer::new(config),
        Err(Error::Config(ConfigError::NoDescriberMethods))
    ));
}

#[test]
fn test_second_run_on_harmonized_output_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let first = config(dir.path(), SelectionMethod::FullFrame, 0);
    let first_images = first.images_dir();
    Harmonizer::new(first).unwrap().run().unwrap();

    // Feed the harmonized images back in as a new scene of the surviving views.
    let rerun = dir.path().join("rerun");
    std::fs::create_dir_all(&rerun).unwrap();
    let views: Vec<_> = (0..3)
        .map(|id| json!({"id": id, "path": format!("v{id}.png"), "width": WIDTH, "height": HEIGHT}))
        .collect();
    let scene = json!({"root_path": first_images, "views": views});
    std::fs::write(rerun.join("sfm_data.json"), scene.to_string()).unwrap();
    write_matches(&rerun, &[(1, 0, STRONG), (1, 2, STRONG)]);

    let second = config(&rerun, SelectionMethod::FullFrame, 0);
    let second_images = second.images_dir();
    let report = Harmonizer::new(second).unwrap().run().unwrap();

    for camera in &report.cameras {
        for correction in [camera.red, camera.green, camera.blue] {
            assert_identity(correction);
        }
    }
    for name in ["v0.png", "v1.png", "v2.png"] {
        let before = image::open(first_images.join(name)).unwrap().into_rgb8();
        let after = image::open(second_images.join(name)).unwrap().into_rgb8();
        assert_eq!(after, before, "{name} changed on the second pass");
    }
}
