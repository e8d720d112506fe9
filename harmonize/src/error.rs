//! Error types for harmonization runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::channel::Channel;
use crate::config::ConfigError;
use crate::lp::LpError;
use crate::scene::{PairKey, ViewId};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a harmonization run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed feature file '{path}' at line {line}: {reason}")]
    ParseFeatures {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("View {0} is declared more than once")]
    DuplicateView(ViewId),

    #[error("View {0} is not declared in the scene")]
    MissingView(ViewId),

    #[error("Match pair {pair} references unknown view {view}")]
    UnknownView { pair: PairKey, view: ViewId },

    #[error("Match pair links view {0} to itself")]
    SelfPair(ViewId),

    #[error("No '{describer}' features loaded for view {view}")]
    MissingFeatures { view: ViewId, describer: String },

    #[error(
        "Match in pair {pair} uses '{describer}' feature {index} of view {view}, which has only {count} features"
    )]
    FeatureIndexOutOfRange {
        pair: PairKey,
        view: ViewId,
        describer: String,
        index: u32,
        count: usize,
    },

    #[error("No connected component left after match support filtering")]
    GraphEmpty,

    #[error("Reference view {0} is not part of the largest connected component")]
    ReferenceNotInComponent(ViewId),

    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save image '{path}': {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image '{path}' is {actual:?} pixels, scene declares {expected:?}")]
    ImageSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Selection mask for view {view} is {mask:?} pixels, image is {image:?}")]
    MaskSizeMismatch {
        view: ViewId,
        mask: (u32, u32),
        image: (u32, u32),
    },

    #[error("Linear program for the {channel} channel failed: {source}")]
    LpSolve {
        channel: Channel,
        #[source]
        source: LpError,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move harmonized images into '{path}': {source}")]
    FinalizeOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    SerializeReport(#[source] serde_json::Error),
}
