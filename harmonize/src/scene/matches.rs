use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scene::{Scene, ViewId};

/// Unordered view pair stored as `(min, max)`.
///
/// Every lookup and removal goes through this key, so a pair has exactly one
/// entry regardless of the order it was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    lo: ViewId,
    hi: ViewId,
}

impl PairKey {
    #[inline]
    pub fn new(a: ViewId, b: ViewId) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    #[inline]
    pub fn lo(self) -> ViewId {
        self.lo
    }

    #[inline]
    pub fn hi(self) -> ViewId {
        self.hi
    }

    #[inline]
    pub fn contains(self, view: ViewId) -> bool {
        self.lo == view || self.hi == view
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// Feature correspondence between the two views of a pair.
///
/// `i` indexes the features of `PairKey::lo`, `j` those of `PairKey::hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndMatch {
    pub i: u32,
    pub j: u32,
}

impl IndMatch {
    #[inline]
    pub fn new(i: u32, j: u32) -> Self {
        Self { i, j }
    }

    #[inline]
    fn swapped(self) -> Self {
        Self {
            i: self.j,
            j: self.i,
        }
    }
}

/// Matches of one pair, grouped by describer type.
pub type MatchesPerDesc = BTreeMap<String, Vec<IndMatch>>;

#[derive(Debug, Deserialize)]
struct PairRecord {
    i: ViewId,
    j: ViewId,
    matches: BTreeMap<String, Vec<[u32; 2]>>,
}

/// Geometrically verified matches for every view pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairwiseMatches {
    pairs: BTreeMap<PairKey, MatchesPerDesc>,
}

impl PairwiseMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds matches reported for views `(a, b)`; `matches[k].i` indexes view `a`.
    ///
    /// Matches are reoriented when `a > b` so that stored indices follow the
    /// canonical key.
    pub fn insert(&mut self, a: ViewId, b: ViewId, describer: &str, matches: Vec<IndMatch>) {
        let key = PairKey::new(a, b);
        let matches: Vec<IndMatch> = if a <= b {
            matches
        } else {
            matches.into_iter().map(IndMatch::swapped).collect()
        };
        self.pairs
            .entry(key)
            .or_default()
            .entry(describer.to_string())
            .or_default()
            .extend(matches);
    }

    #[inline]
    pub fn get(&self, key: PairKey) -> Option<&MatchesPerDesc> {
        self.pairs.get(&key)
    }

    #[inline]
    pub fn contains(&self, key: PairKey) -> bool {
        self.pairs.contains_key(&key)
    }

    #[inline]
    pub fn remove(&mut self, key: PairKey) -> Option<MatchesPerDesc> {
        self.pairs.remove(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = PairKey> + '_ {
        self.pairs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PairKey, &MatchesPerDesc)> {
        self.pairs.iter().map(|(k, v)| (*k, v))
    }

    /// Total number of matches of a pair over all describers.
    pub fn match_count(&self, key: PairKey) -> usize {
        self.pairs
            .get(&key)
            .map(|per_desc| per_desc.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Views appearing in at least one pair.
    pub fn view_ids(&self) -> BTreeSet<ViewId> {
        self.pairs.keys().flat_map(|k| [k.lo, k.hi]).collect()
    }

    /// Drops pairs with fewer than `min_matches` matches. Returns the number removed.
    pub fn retain_supported(&mut self, min_matches: usize) -> usize {
        let before = self.pairs.len();
        self.pairs
            .retain(|_, per_desc| per_desc.values().map(Vec::len).sum::<usize>() >= min_matches);
        before - self.pairs.len()
    }

    /// Loads a match file, keeping only the listed describers.
    ///
    /// Pairs must reference views of `scene` and link two distinct views.
    pub fn load(path: &Path, describers: &[String], scene: &Scene) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<PairRecord> =
            serde_json::from_str(&text).map_err(|source| Error::ParseJson {
                path: path.to_path_buf(),
                source,
            })?;

        let mut result = Self::new();
        for record in records {
            let key = PairKey::new(record.i, record.j);
            if record.i == record.j {
                return Err(Error::SelfPair(record.i));
            }
            for view in [record.i, record.j] {
                if !scene.contains(view) {
                    return Err(Error::UnknownView { pair: key, view });
                }
            }

            for (describer, matches) in record.matches {
                if !describers.contains(&describer) {
                    continue;
                }
                let matches = matches.into_iter().map(|[i, j]| IndMatch::new(i, j)).collect();
                result.insert(record.i, record.j, &describer, matches);
            }
        }

        tracing::info!(
            path = %path.display(),
            pairs = result.len(),
            "Loaded pairwise matches"
        );
        Ok(result)
    }
}
