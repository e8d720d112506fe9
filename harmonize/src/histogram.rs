//! Per-edge masked intensity histograms.

use image::RgbImage;
use rayon::prelude::*;

use crate::camera_index::CameraIndex;
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::image_io::load_rgb;
use crate::scene::{FeaturesPerView, MatchesPerDesc, PairKey, PairwiseMatches, Scene, View};
use crate::selection::{Mask, MaskSelector, PairContext};

/// Number of histogram bins; one per 8-bit intensity level.
pub const BIN_COUNT: usize = 256;

/// 256-bin intensity histogram over [0, 255] with unit-width bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; BIN_COUNT],
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            bins: [0; BIN_COUNT],
        }
    }

    pub fn from_bins(bins: [u64; BIN_COUNT]) -> Self {
        Self { bins }
    }

    #[inline]
    pub fn add(&mut self, value: u8) {
        self.bins[value as usize] += 1;
    }

    #[inline]
    pub fn bins(&self) -> &[u64; BIN_COUNT] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.iter().all(|&b| b == 0)
    }

    /// Running sum of the bins; the last entry equals `total()`.
    pub fn cumulative(&self) -> [u64; BIN_COUNT] {
        let mut cumulative = [0u64; BIN_COUNT];
        let mut sum = 0u64;
        for (c, &b) in cumulative.iter_mut().zip(self.bins.iter()) {
            sum += b;
            *c = sum;
        }
        cumulative
    }
}

/// Red, green and blue histograms of the pixels selected by `mask`.
///
/// # Panics
///
/// Panics if the mask and image sizes differ.
pub fn masked_histograms(image: &RgbImage, mask: &Mask) -> [Histogram; 3] {
    assert_eq!(
        image.dimensions(),
        mask.dimensions(),
        "mask and image sizes must match"
    );

    let mut histograms = [Histogram::new(), Histogram::new(), Histogram::new()];
    for (pixel, m) in image.pixels().zip(mask.pixels()) {
        if m[0] == 0 {
            continue;
        }
        for (hist, &value) in histograms.iter_mut().zip(pixel.0.iter()) {
            hist.add(value);
        }
    }
    histograms
}

/// Histograms of both endpoints of one edge for a single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeHistogramEdge {
    pub camera_a: usize,
    pub camera_b: usize,
    pub histogram_a: Histogram,
    pub histogram_b: Histogram,
}

/// Edge histograms of every surviving edge, per channel, in edge order.
#[derive(Debug, Clone, Default)]
pub struct EdgeHistograms {
    channels: [Vec<RelativeHistogramEdge>; 3],
}

impl EdgeHistograms {
    /// Regroups per-edge `[red, green, blue]` triples by channel.
    pub fn from_edges(edges: Vec<[RelativeHistogramEdge; 3]>) -> Self {
        let mut channels: [Vec<RelativeHistogramEdge>; 3] = Default::default();
        for triple in edges {
            for (list, edge) in channels.iter_mut().zip(triple) {
                list.push(edge);
            }
        }
        Self { channels }
    }

    pub fn channel(&self, channel: Channel) -> &[RelativeHistogramEdge] {
        &self.channels[channel.index()]
    }

    pub fn edge_count(&self) -> usize {
        self.channels[0].len()
    }
}

/// Computes the edge histograms of a pruned match set.
pub struct HistogramExtractor<'a> {
    scene: &'a Scene,
    cameras: &'a CameraIndex,
    selector: &'a dyn MaskSelector,
    features: Option<&'a FeaturesPerView>,
}

impl<'a> HistogramExtractor<'a> {
    pub fn new(
        scene: &'a Scene,
        cameras: &'a CameraIndex,
        selector: &'a dyn MaskSelector,
        features: Option<&'a FeaturesPerView>,
    ) -> Self {
        Self {
            scene,
            cameras,
            selector,
            features,
        }
    }

    /// Processes every pair of `matches` in parallel. Results keep pair order.
    pub fn extract(&self, matches: &PairwiseMatches) -> Result<EdgeHistograms> {
        let pairs: Vec<(PairKey, &MatchesPerDesc)> = matches.iter().collect();
        let edges = pairs
            .par_iter()
            .map(|&(key, per_desc)| self.extract_edge(key, per_desc))
            .collect::<Result<Vec<_>>>()?;
        Ok(EdgeHistograms::from_edges(edges))
    }

    fn extract_edge(
        &self,
        key: PairKey,
        per_desc: &MatchesPerDesc,
    ) -> Result<[RelativeHistogramEdge; 3]> {
        let view_lo = self.view(key, key.lo())?;
        let view_hi = self.view(key, key.hi())?;
        let camera_a = self.camera(key, key.lo())?;
        let camera_b = self.camera(key, key.hi())?;

        let context = PairContext {
            key,
            view_lo,
            view_hi,
            matches: per_desc,
            features: self.features,
        };
        let (mask_lo, mask_hi) = self.selector.compute_masks(&context)?;
        check_mask(view_lo, &mask_lo)?;
        check_mask(view_hi, &mask_hi)?;

        let image_lo = load_rgb(&self.scene.image_path(view_lo), Some(view_lo.size()))?;
        let image_hi = load_rgb(&self.scene.image_path(view_hi), Some(view_hi.size()))?;
        let hist_lo = masked_histograms(&image_lo, &mask_lo);
        let hist_hi = masked_histograms(&image_hi, &mask_hi);

        tracing::debug!(
            pair = %key,
            selected_lo = hist_lo[0].total(),
            selected_hi = hist_hi[0].total(),
            "Computed edge histograms"
        );

        Ok(Channel::ALL.map(|channel| RelativeHistogramEdge {
            camera_a,
            camera_b,
            histogram_a: hist_lo[channel.index()].clone(),
            histogram_b: hist_hi[channel.index()].clone(),
        }))
    }

    fn view(&self, pair: PairKey, view: u32) -> Result<&'a View> {
        self.scene
            .view(view)
            .ok_or(Error::UnknownView { pair, view })
    }

    fn camera(&self, pair: PairKey, view: u32) -> Result<usize> {
        self.cameras
            .index_of(view)
            .ok_or(Error::UnknownView { pair, view })
    }
}

fn check_mask(view: &View, mask: &Mask) -> Result<()> {
    if mask.dimensions() != view.size() {
        return Err(Error::MaskSizeMismatch {
            view: view.id,
            mask: mask.dimensions(),
            image: view.size(),
        });
    }
    Ok(())
}
