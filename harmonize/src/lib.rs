//! Harmonize - global color harmonization for overlapping image collections.
//!
//! Given the views of a multi-view reconstruction and the feature matches
//! between them, this library fits one affine gain/offset correction per
//! camera and color channel so that overlapping images agree photometrically:
//!
//! - Pair graph filtering (match support threshold, largest connected component)
//! - Per-edge masked RGB histograms under a pluggable selection strategy
//! - Minimax (L∞) linear program per channel with a pinned reference camera
//! - Lookup-table remapping of every surviving image
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use harmonize::{HarmonizeConfig, Harmonizer, SelectionMethod};
//!
//! let config = HarmonizeConfig::new(
//!     "scene/sfm_data.json",
//!     "scene/matches",
//!     "out",
//!     SelectionMethod::FullFrame,
//!     0,
//! );
//! let report = Harmonizer::new(config)?.run()?;
//! println!("Red worst-case error: {:.2}", report.max_error.red);
//! ```

mod camera_index;
mod channel;
mod config;
mod error;
pub mod graph;
mod histogram;
mod image_io;
pub mod lp;
mod lut;
mod pipeline;
mod report;
pub mod scene;
pub mod selection;
mod solve;

pub mod prelude;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{
    parse_describers, ConfigError, GeometricModel, HarmonizeConfig, SelectionMethod,
    DEFAULT_DESCRIBER, HARMONIZE_METHOD,
};
pub use error::{Error, Result};

// ============================================================================
// Input data
// ============================================================================

pub use scene::{FeaturesPerView, IndMatch, PairKey, PairwiseMatches, Scene, View, ViewId};

// ============================================================================
// Graph
// ============================================================================

pub use graph::{OverlapGraph, PruneSummary, MIN_PAIR_MATCHES};

// ============================================================================
// Histograms, solve and remapping
// ============================================================================

pub use camera_index::CameraIndex;
pub use channel::Channel;
pub use histogram::{
    EdgeHistograms, Histogram, HistogramExtractor, RelativeHistogramEdge, BIN_COUNT,
};
pub use lp::{LpError, LpProblem, LpSolver, SimplexSolver};
pub use lut::{Lut, RgbLut};
pub use solve::{
    quantile_correspondences, solve_channel, solve_channels, ChannelSolution, ConstraintBuilder,
    GainOffset,
};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::Harmonizer;
pub use report::{
    CameraReport, ChannelErrors, GraphStats, HarmonizationReport, PhaseTimings, REPORT_FILE,
};
