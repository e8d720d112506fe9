//! Harmonization configuration.
//!
//! Every option is resolved and validated before any processing phase runs.
//! Missing or unknown values are reported as [`ConfigError`]; nothing is
//! resolved interactively.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::graph::MIN_PAIR_MATCHES;
use crate::scene::ViewId;

/// Name of the photometric model, used in the output directory name.
pub const HARMONIZE_METHOD: &str = "quantifiedGainCompensation";

/// Describer used when none is configured.
pub const DEFAULT_DESCRIBER: &str = "SIFT";

/// Errors raised while resolving or validating the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No selection method given (expected full-frame, matched-points or segment)")]
    MissingSelectionMethod,

    #[error("Unsupported selection method '{0}' (expected full-frame, matched-points or segment)")]
    UnsupportedSelectionMethod(String),

    #[error("No reference view given")]
    MissingReferenceView,

    #[error("Reference view {view} is not part of the scene ({view_count} views)")]
    ReferenceOutOfRange { view: ViewId, view_count: usize },

    #[error("Unsupported geometric model '{0}' (expected f, e or h)")]
    UnsupportedGeometricModel(String),

    #[error("No describer method given")]
    NoDescriberMethods,

    #[error("Empty describer method name in '{0}'")]
    EmptyDescriberName(String),

    #[error("Minimum pair match count must be positive")]
    ZeroMatchThreshold,

    #[error("{name} must be positive")]
    NonPositiveSize { name: &'static str },
}

/// Strategy that decides which pixels of an image pair enter the histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum SelectionMethod {
    /// Every pixel of both images.
    #[strum(to_string = "full-frame", serialize = "fullFrame", serialize = "0")]
    FullFrame,
    /// Discs around matched feature positions.
    #[strum(to_string = "matched-points", serialize = "matchedPoints", serialize = "1")]
    MatchedPoints,
    /// Thick segments joining pairs of matched features.
    #[strum(to_string = "segment", serialize = "2")]
    Segment,
}

impl SelectionMethod {
    /// Resolves an optional user value, rejecting missing or unknown names.
    pub fn resolve(value: Option<&str>) -> Result<Self, ConfigError> {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingSelectionMethod)?;
        Self::from_str(value).map_err(|_| ConfigError::UnsupportedSelectionMethod(value.to_string()))
    }

    /// Label used for the output directory name.
    pub fn output_label(self) -> &'static str {
        match self {
            SelectionMethod::FullFrame => "fullFrame",
            SelectionMethod::MatchedPoints => "matchedPoints",
            SelectionMethod::Segment => "segment",
        }
    }

    /// Whether per-view feature positions must be loaded.
    pub fn needs_features(self) -> bool {
        !matches!(self, SelectionMethod::FullFrame)
    }
}

/// Geometric model the pairwise matches were filtered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum GeometricModel {
    /// Fundamental matrix.
    #[default]
    #[strum(serialize = "f")]
    Fundamental,
    /// Essential matrix.
    #[strum(serialize = "e")]
    Essential,
    /// Homography.
    #[strum(serialize = "h")]
    Homography,
}

impl GeometricModel {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        Self::from_str(value.trim())
            .map_err(|_| ConfigError::UnsupportedGeometricModel(value.to_string()))
    }
}

/// Splits a comma separated describer list such as `"SIFT,AKAZE"`.
pub fn parse_describers(list: &str) -> Result<Vec<String>, ConfigError> {
    if list.trim().is_empty() {
        return Err(ConfigError::NoDescriberMethods);
    }
    list.split(',')
        .map(|name| {
            let name = name.trim();
            if name.is_empty() {
                Err(ConfigError::EmptyDescriberName(list.to_string()))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

/// Complete configuration of a harmonization run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonizeConfig {
    /// Scene description (views) file.
    pub scene_path: PathBuf,
    /// Directory holding the match and feature files.
    pub matches_dir: PathBuf,
    pub geometric_model: GeometricModel,
    /// Describer types whose matches and features are used.
    pub describers: Vec<String>,
    /// Directory receiving graph snapshots, the report and harmonized images.
    pub out_dir: PathBuf,
    pub selection_method: SelectionMethod,
    /// View whose gain/offset is fixed to (1, 0) in every channel.
    pub reference_view: ViewId,
    /// Pairs with fewer matches (all describers summed) are dropped.
    /// Default: 120
    pub min_pair_matches: usize,
    /// Disc radius in pixels for the matched-points selection.
    /// Default: 10
    pub point_radius: u32,
    /// Segment half-width in pixels for the segment selection.
    /// Default: 2
    pub segment_half_width: u32,
}

impl HarmonizeConfig {
    pub fn new(
        scene_path: impl Into<PathBuf>,
        matches_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        selection_method: SelectionMethod,
        reference_view: ViewId,
    ) -> Self {
        Self {
            scene_path: scene_path.into(),
            matches_dir: matches_dir.into(),
            geometric_model: GeometricModel::default(),
            describers: vec![DEFAULT_DESCRIBER.to_string()],
            out_dir: out_dir.into(),
            selection_method,
            reference_view,
            min_pair_matches: MIN_PAIR_MATCHES,
            point_radius: 10,
            segment_half_width: 2,
        }
    }

    pub fn with_geometric_model(mut self, model: GeometricModel) -> Self {
        self.geometric_model = model;
        self
    }

    pub fn with_describers(mut self, describers: Vec<String>) -> Self {
        self.describers = describers;
        self
    }

    pub fn with_min_pair_matches(mut self, min_pair_matches: usize) -> Self {
        self.min_pair_matches = min_pair_matches;
        self
    }

    /// Checks the values that do not need the scene to be loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.describers.is_empty() {
            return Err(ConfigError::NoDescriberMethods);
        }
        if let Some(name) = self.describers.iter().find(|d| d.trim().is_empty()) {
            return Err(ConfigError::EmptyDescriberName(name.clone()));
        }
        if self.min_pair_matches == 0 {
            return Err(ConfigError::ZeroMatchThreshold);
        }
        if self.point_radius == 0 {
            return Err(ConfigError::NonPositiveSize {
                name: "Point radius",
            });
        }
        if self.segment_half_width == 0 {
            return Err(ConfigError::NonPositiveSize {
                name: "Segment half-width",
            });
        }
        Ok(())
    }

    /// `<selection>_<harmonize method>`, the directory name of the harmonized images.
    pub fn output_dir_name(&self) -> String {
        format!(
            "{}_{}",
            self.selection_method.output_label(),
            HARMONIZE_METHOD
        )
    }

    /// Final location of the harmonized images.
    pub fn images_dir(&self) -> PathBuf {
        self.out_dir.join(self.output_dir_name())
    }

    /// Match file for the configured geometric model.
    pub fn matches_file(&self) -> PathBuf {
        matches_file(&self.matches_dir, self.geometric_model)
    }
}

/// `<dir>/matches.<model>.json`
pub fn matches_file(matches_dir: &Path, model: GeometricModel) -> PathBuf {
    matches_dir.join(format!("matches.{}.json", model))
}
