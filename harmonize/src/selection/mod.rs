//! Selection strategies deciding which pixels of an image pair are compared.
//!
//! A [`MaskSelector`] turns one edge of the overlap graph into a pair of binary
//! masks, one per endpoint image and at that image's resolution. Non-zero mask
//! pixels enter the edge histograms.

mod full_frame;
mod matched_points;
mod segment;


pub use full_frame::FullFrame;
pub use matched_points::MatchedPoints;
pub use segment::Segment;

use glam::DVec2;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;

use crate::config::{HarmonizeConfig, SelectionMethod};
use crate::error::{Error, Result};
use crate::scene::{FeaturesPerView, IndMatch, MatchesPerDesc, PairKey, View};

/// Binary selection mask; non-zero pixels are selected.
pub type Mask = GrayImage;

/// Value written into selected mask pixels.
pub const SELECTED: Luma<u8> = Luma([255]);

/// Everything a selector may look at for one edge.
#[derive(Debug, Clone, Copy)]
pub struct PairContext<'a> {
    pub key: PairKey,
    /// View `key.lo()`.
    pub view_lo: &'a View,
    /// View `key.hi()`.
    pub view_hi: &'a View,
    pub matches: &'a MatchesPerDesc,
    /// Present when the configured selection needs feature positions.
    pub features: Option<&'a FeaturesPerView>,
}

/// Produces the `(lo, hi)` masks of an edge.
pub trait MaskSelector: Send + Sync {
    fn compute_masks(&self, pair: &PairContext<'_>) -> Result<(Mask, Mask)>;
}

/// Selector implementing the configured method.
pub fn selector_for(config: &HarmonizeConfig) -> Box<dyn MaskSelector> {
    match config.selection_method {
        SelectionMethod::FullFrame => Box::new(FullFrame),
        SelectionMethod::MatchedPoints => Box::new(MatchedPoints::new(config.point_radius)),
        SelectionMethod::Segment => Box::new(Segment::new(config.segment_half_width)),
    }
}

/// All-zero mask at the resolution of `view`.
pub(crate) fn empty_mask(view: &View) -> Mask {
    Mask::new(view.width, view.height)
}

/// Feature positions `(in lo, in hi)` of every match of one describer.
pub(crate) fn matched_positions(
    pair: &PairContext<'_>,
    describer: &str,
    matches: &[IndMatch],
) -> Result<Vec<(DVec2, DVec2)>> {
    let features = pair.features.ok_or_else(|| Error::MissingFeatures {
        view: pair.view_lo.id,
        describer: describer.to_string(),
    })?;
    let lo = features.positions(pair.view_lo.id, describer)?;
    let hi = features.positions(pair.view_hi.id, describer)?;

    let lookup = |positions: &[DVec2], view: &View, index: u32| {
        positions
            .get(index as usize)
            .copied()
            .ok_or_else(|| Error::FeatureIndexOutOfRange {
                pair: pair.key,
                view: view.id,
                describer: describer.to_string(),
                index,
                count: positions.len(),
            })
    };

    matches
        .iter()
        .map(|m| -> Result<(DVec2, DVec2)> {
            Ok((lookup(lo, pair.view_lo, m.i)?, lookup(hi, pair.view_hi, m.j)?))
        })
        .collect()
}

/// Marks a filled disc; parts outside the mask are clipped.
pub(crate) fn stamp_disc(mask: &mut Mask, center: DVec2, radius: u32) {
    let (min, max) = padded_bounds(mask, radius);
    if center.cmplt(min).any() || center.cmpgt(max).any() {
        return;
    }
    draw_filled_circle_mut(
        mask,
        (center.x.round() as i32, center.y.round() as i32),
        radius as i32,
        SELECTED,
    );
}

/// Mask rectangle grown by `padding` pixels on every side.
pub(crate) fn padded_bounds(mask: &Mask, padding: u32) -> (DVec2, DVec2) {
    let padding = padding as f64;
    (
        DVec2::splat(-padding),
        DVec2::new(mask.width() as f64, mask.height() as f64) + padding,
    )
}
