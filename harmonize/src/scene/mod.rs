//! Upstream reconstruction data: views, pairwise matches and feature positions.
//!
//! The files read here are produced by the reconstruction pipeline; this module
//! only maps them to typed structures and checks cross references.

mod features;
mod matches;

#[cfg(test)]
mod tests;

pub use features::{FeaturesPerView, ViewFeatures};
pub use matches::{IndMatch, MatchesPerDesc, PairKey, PairwiseMatches};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a view as assigned by the reconstruction pipeline.
pub type ViewId = u32;

/// One input image of the reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    /// Image path, relative to the scene root unless absolute.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl View {
    pub fn new(id: ViewId, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            id,
            path: path.into(),
            width,
            height,
        }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    #[serde(default)]
    root_path: PathBuf,
    views: Vec<View>,
}

/// The view list of a reconstruction.
#[derive(Debug, Clone)]
pub struct Scene {
    root: PathBuf,
    views: BTreeMap<ViewId, View>,
}

impl Scene {
    /// Creates a scene from a view list. View ids must be unique.
    pub fn new(root: impl Into<PathBuf>, views: Vec<View>) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for view in views {
            let id = view.id;
            if by_id.insert(id, view).is_some() {
                return Err(Error::DuplicateView(id));
            }
        }
        Ok(Self {
            root: root.into(),
            views: by_id,
        })
    }

    /// Loads a scene description file.
    ///
    /// A relative `root_path` is resolved against the directory of the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SceneFile = serde_json::from_str(&text).map_err(|source| Error::ParseJson {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let root = if file.root_path.is_absolute() {
            file.root_path
        } else {
            base.join(file.root_path)
        };

        let scene = Self::new(root, file.views)?;
        tracing::info!(
            path = %path.display(),
            views = scene.len(),
            "Loaded scene"
        );
        Ok(scene)
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[inline]
    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Like [`Scene::view`], failing with [`Error::MissingView`].
    pub fn require_view(&self, id: ViewId) -> Result<&View> {
        self.view(id).ok_or(Error::MissingView(id))
    }

    #[inline]
    pub fn contains(&self, id: ViewId) -> bool {
        self.views.contains_key(&id)
    }

    /// Views in ascending id order.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    /// Full path of a view's image.
    pub fn image_path(&self, view: &View) -> PathBuf {
        self.root.join(&view.path)
    }
}
