//! End-to-end harmonization run.
//!
//! Phases run strictly in order: LOAD, PRUNE, EXTRACT, SOLVE, APPLY. A failure
//! aborts everything after it and leaves no harmonized image directory behind.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::camera_index::CameraIndex;
use crate::config::{ConfigError, HarmonizeConfig, HARMONIZE_METHOD};
use crate::error::{Error, Result};
use crate::graph::OverlapGraph;
use crate::histogram::HistogramExtractor;
use crate::image_io::{load_rgb, save_rgb};
use crate::lp::{LpSolver, SimplexSolver};
use crate::lut::RgbLut;
use crate::report::{
    millis, CameraReport, ChannelErrors, GraphStats, HarmonizationReport, PhaseTimings,
};
use crate::scene::{FeaturesPerView, PairwiseMatches, Scene, View};
use crate::selection::selector_for;
use crate::solve::{solve_channels, ChannelSolution};

const INITIAL_GRAPH: &str = "initial_graph";
const SUPPORTED_GRAPH: &str = "supported_graph";
const CLEANED_GRAPH: &str = "cleaned_graph";

/// Inputs read during the LOAD phase.
struct Inputs {
    scene: Scene,
    matches: PairwiseMatches,
    features: Option<FeaturesPerView>,
}

/// Runs the harmonization pipeline for one configuration.
pub struct Harmonizer {
    config: HarmonizeConfig,
    solver: Box<dyn LpSolver>,
}

impl Harmonizer {
    /// Validates `config` and selects the bundled simplex backend.
    pub fn new(config: HarmonizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            solver: Box::new(SimplexSolver),
        })
    }

    /// Replaces the LP backend.
    pub fn with_solver(mut self, solver: impl LpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &HarmonizeConfig {
        &self.config
    }

    /// Runs every phase and writes images, graph snapshots and the report
    /// into the output directory.
    pub fn run(&self) -> Result<HarmonizationReport> {
        let config = &self.config;
        tracing::info!(
            scene = %config.scene_path.display(),
            selection = %config.selection_method,
            reference = config.reference_view,
            "Starting color harmonization"
        );
        create_dir(&config.out_dir)?;
        let mut timings = PhaseTimings::default();

        // Step 1: Load the scene, matches and (if needed) feature positions
        let start = Instant::now();
        let Inputs {
            scene,
            mut matches,
            features,
        } = self.load()?;
        timings.load_ms = millis(start.elapsed());

        // Step 2: Drop weak pairs and keep the largest connected component
        let start = Instant::now();
        let (graph, stats) = self.prune(&mut matches)?;
        let cameras = CameraIndex::new(graph.nodes());
        let reference = cameras
            .index_of(config.reference_view)
            .ok_or(Error::ReferenceNotInComponent(config.reference_view))?;
        timings.prune_ms = millis(start.elapsed());

        // Step 3: Edge histograms under the configured selection
        let start = Instant::now();
        let selector = selector_for(config);
        let extractor =
            HistogramExtractor::new(&scene, &cameras, selector.as_ref(), features.as_ref());
        let edges = extractor.extract(&matches)?;
        timings.extract_ms = millis(start.elapsed());
        tracing::info!(
            edges = edges.edge_count(),
            elapsed_ms = timings.extract_ms,
            "Extracted edge histograms"
        );

        // Step 4: Minimax gain/offset per channel
        let start = Instant::now();
        let solutions = solve_channels(&edges, cameras.len(), reference, self.solver.as_ref())?;
        timings.solve_ms = millis(start.elapsed());

        // Step 5: Remap every surviving image
        let start = Instant::now();
        let outputs = self.apply(&scene, &cameras, &solutions)?;
        timings.apply_ms = millis(start.elapsed());

        let report = HarmonizationReport {
            selection_method: config.selection_method.output_label().to_string(),
            harmonize_method: HARMONIZE_METHOD.to_string(),
            reference_view: config.reference_view,
            images_dir: config.images_dir(),
            graph: stats,
            max_error: ChannelErrors::from_solutions(&solutions),
            cameras: cameras
                .view_ids()
                .iter()
                .zip(outputs)
                .enumerate()
                .map(|(index, (&view_id, output))| {
                    CameraReport::from_solutions(index, view_id, output, &solutions)
                })
                .collect(),
            timings,
        };
        report.write(&config.out_dir)?;

        tracing::info!(
            cameras = cameras.len(),
            red = report.max_error.red,
            green = report.max_error.green,
            blue = report.max_error.blue,
            total_ms = timings.total_ms(),
            "Color harmonization finished"
        );
        Ok(report)
    }

    fn load(&self) -> Result<Inputs> {
        let config = &self.config;
        let scene = Scene::load(&config.scene_path)?;
        if !scene.contains(config.reference_view) {
            return Err(ConfigError::ReferenceOutOfRange {
                view: config.reference_view,
                view_count: scene.len(),
            }
            .into());
        }

        let matches_path = config.matches_file();
        let matches = PairwiseMatches::load(&matches_path, &config.describers, &scene)?;
        tracing::info!(
            path = %matches_path.display(),
            pairs = matches.len(),
            "Loaded pairwise matches"
        );

        let features = if config.selection_method.needs_features() {
            let features =
                FeaturesPerView::load(&config.matches_dir, matches.view_ids(), &config.describers)?;
            tracing::info!(views = features.len(), "Loaded feature positions");
            Some(features)
        } else {
            None
        };

        Ok(Inputs {
            scene,
            matches,
            features,
        })
    }

    fn prune(&self, matches: &mut PairwiseMatches) -> Result<(OverlapGraph, GraphStats)> {
        let out_dir = &self.config.out_dir;

        let initial = OverlapGraph::from_matches(matches);
        initial.write_dot(out_dir, INITIAL_GRAPH)?;

        let removed = matches.retain_supported(self.config.min_pair_matches);
        let mut graph = OverlapGraph::from_matches(matches);
        graph.write_dot(out_dir, SUPPORTED_GRAPH)?;
        tracing::info!(
            min_matches = self.config.min_pair_matches,
            removed,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Filtered pairs by match support"
        );

        let summary = graph.prune_to_largest_component(matches)?;
        graph.write_dot(out_dir, CLEANED_GRAPH)?;

        let stats = GraphStats {
            initial_nodes: initial.node_count(),
            initial_edges: initial.edge_count(),
            supported_nodes: summary.kept_nodes + summary.removed_nodes,
            supported_edges: summary.kept_edges + summary.removed_edges,
            component_sizes: summary.component_sizes,
            kept_nodes: summary.kept_nodes,
            kept_edges: summary.kept_edges,
        };
        Ok((graph, stats))
    }

    /// Writes every corrected image into a staging directory, then moves it
    /// over the result directory. Returns the final image paths in camera order.
    fn apply(
        &self,
        scene: &Scene,
        cameras: &CameraIndex,
        solutions: &[ChannelSolution],
    ) -> Result<Vec<PathBuf>> {
        let images_dir = self.config.images_dir();
        let staging = self
            .config
            .out_dir
            .join(format!(".{}.partial", self.config.output_dir_name()));
        remove_dir_if_exists(&staging).map_err(|source| Error::CreateDir {
            path: staging.clone(),
            source,
        })?;
        create_dir(&staging)?;

        let written = cameras
            .view_ids()
            .par_iter()
            .enumerate()
            .map(|(index, &view_id)| -> Result<PathBuf> {
                let view = scene.require_view(view_id)?;
                let file_name = output_file_name(view);

                let mut image = load_rgb(&scene.image_path(view), Some(view.size()))?;
                RgbLut::for_camera(solutions, index).apply(&mut image);
                save_rgb(&staging.join(&file_name), &image)?;

                tracing::debug!(view = view_id, file = %file_name.display(), "Harmonized image");
                Ok(images_dir.join(file_name))
            })
            .collect::<Result<Vec<_>>>();

        let outputs = match written {
            Ok(outputs) => outputs,
            Err(err) => {
                if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                    tracing::warn!(
                        path = %staging.display(),
                        error = %cleanup,
                        "Failed to remove staging directory"
                    );
                }
                return Err(err);
            }
        };

        remove_dir_if_exists(&images_dir)
            .and_then(|()| std::fs::rename(&staging, &images_dir))
            .map_err(|source| Error::FinalizeOutput {
                path: images_dir.clone(),
                source,
            })?;

        tracing::info!(
            images = outputs.len(),
            dir = %images_dir.display(),
            "Wrote harmonized images"
        );
        Ok(outputs)
    }
}

/// File name of a view's image; falls back to `<id>.png` when the path has none.
fn output_file_name(view: &View) -> PathBuf {
    view.path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", view.id)))
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
