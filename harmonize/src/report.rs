//! Serializable summary of a harmonization run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::scene::ViewId;
use crate::solve::{ChannelSolution, GainOffset};

/// File name of the report inside the output directory.
pub const REPORT_FILE: &str = "harmonization_report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizationReport {
    pub selection_method: String,
    pub harmonize_method: String,
    pub reference_view: ViewId,
    pub images_dir: PathBuf,
    pub graph: GraphStats,
    pub max_error: ChannelErrors,
    pub cameras: Vec<CameraReport>,
    pub timings: PhaseTimings,
}

/// Node and edge counts through the pruning stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub initial_nodes: usize,
    pub initial_edges: usize,
    pub supported_nodes: usize,
    pub supported_edges: usize,
    pub component_sizes: Vec<usize>,
    pub kept_nodes: usize,
    pub kept_edges: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelErrors {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ChannelErrors {
    pub fn from_solutions(solutions: &[ChannelSolution]) -> Self {
        let mut errors = Self::default();
        for solution in solutions {
            *errors.get_mut(solution.channel) = solution.max_error;
        }
        errors
    }

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut f64 {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }
}

/// Fitted correction of one camera, all channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraReport {
    pub index: usize,
    pub view_id: ViewId,
    pub output: PathBuf,
    pub red: GainOffset,
    pub green: GainOffset,
    pub blue: GainOffset,
}

impl CameraReport {
    pub fn from_solutions(
        index: usize,
        view_id: ViewId,
        output: PathBuf,
        solutions: &[ChannelSolution],
    ) -> Self {
        let correction = |channel: Channel| {
            solutions
                .iter()
                .find(|s| s.channel == channel)
                .and_then(|s| s.cameras.get(index).copied())
                .unwrap_or(GainOffset::IDENTITY)
        };
        Self {
            index,
            view_id,
            output,
            red: correction(Channel::Red),
            green: correction(Channel::Green),
            blue: correction(Channel::Blue),
        }
    }
}

/// Wall time per phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub load_ms: f64,
    pub prune_ms: f64,
    pub extract_ms: f64,
    pub solve_ms: f64,
    pub apply_ms: f64,
}

impl PhaseTimings {
    pub fn total_ms(&self) -> f64 {
        self.load_ms + self.prune_ms + self.extract_ms + self.solve_ms + self.apply_ms
    }
}

pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl HarmonizationReport {
    /// Writes the report as pretty JSON to `<dir>/harmonization_report.json`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self).map_err(Error::SerializeReport)?;
        std::fs::write(&path, json).map_err(|source| Error::WriteFile {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Wrote harmonization report");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    }
}
