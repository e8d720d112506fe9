use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::DVec2;

use crate::error::{Error, Result};
use crate::scene::ViewId;

/// Feature positions of one view, grouped by describer type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFeatures {
    per_desc: BTreeMap<String, Vec<DVec2>>,
}

impl ViewFeatures {
    pub fn insert(&mut self, describer: &str, positions: Vec<DVec2>) {
        self.per_desc.insert(describer.to_string(), positions);
    }

    pub fn get(&self, describer: &str) -> Option<&[DVec2]> {
        self.per_desc.get(describer).map(Vec::as_slice)
    }
}

/// Feature positions of every view needed by a feature-based selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturesPerView {
    views: BTreeMap<ViewId, ViewFeatures>,
}

impl FeaturesPerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, view: ViewId, describer: &str, positions: Vec<DVec2>) {
        self.views
            .entry(view)
            .or_default()
            .insert(describer, positions);
    }

    /// Positions of `view` for `describer`, or `MissingFeatures`.
    pub fn positions(&self, view: ViewId, describer: &str) -> Result<&[DVec2]> {
        self.views
            .get(&view)
            .and_then(|f| f.get(describer))
            .ok_or_else(|| Error::MissingFeatures {
                view,
                describer: describer.to_string(),
            })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Loads `<dir>/<view>.<describer>.feat` for every view and describer.
    pub fn load(
        dir: &Path,
        views: impl IntoIterator<Item = ViewId>,
        describers: &[String],
    ) -> Result<Self> {
        let mut result = Self::new();
        for view in views {
            for describer in describers {
                let path = feature_file(dir, view, describer);
                let text = std::fs::read_to_string(&path).map_err(|source| Error::ReadFile {
                    path: path.clone(),
                    source,
                })?;
                let positions = parse_features(&text, &path)?;
                tracing::debug!(view, describer = %describer, count = positions.len(), "Loaded features");
                result.insert(view, describer, positions);
            }
        }
        Ok(result)
    }
}

/// `<dir>/<view>.<describer>.feat`
pub fn feature_file(dir: &Path, view: ViewId, describer: &str) -> PathBuf {
    dir.join(format!("{}.{}.feat", view, describer))
}

/// Parses one feature per line: `x y [scale orientation ...]`.
///
/// Blank lines are skipped. Only the position is kept.
pub(crate) fn parse_features(text: &str, path: &Path) -> Result<Vec<DVec2>> {
    let mut positions = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(x) = fields.next() else {
            continue;
        };
        let malformed = |reason: String| Error::ParseFeatures {
            path: path.to_path_buf(),
            line: line_idx + 1,
            reason,
        };
        let y = fields
            .next()
            .ok_or_else(|| malformed("missing y coordinate".to_string()))?;
        let x: f64 = x
            .parse()
            .map_err(|e| malformed(format!("invalid x '{}': {}", x, e)))?;
        let y: f64 = y
            .parse()
            .map_err(|e| malformed(format!("invalid y '{}': {}", y, e)))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(malformed("non-finite coordinate".to_string()));
        }
        positions.push(DVec2::new(x, y));
    }
    Ok(positions)
}
