use glam::DVec2;

use super::{
    empty_mask, matched_positions, padded_bounds, stamp_disc, Mask, MaskSelector, PairContext,
};
use crate::error::Result;

/// Segments whose lengths differ by more than this factor between the two
/// images are treated as inconsistent and skipped.
const MAX_LENGTH_RATIO: f64 = 2.0;

/// Segments shorter than this (pixels, in either image) are skipped.
const MIN_LENGTH: f64 = 1.0;

/// Selects thick segments joining consecutive matches of each describer.
///
/// A segment is kept only when it has a comparable length in both images,
/// which rejects most segments ending in a wrong match.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    half_width: u32,
}

impl Segment {
    pub fn new(half_width: u32) -> Self {
        assert!(half_width > 0, "Segment half-width must be positive");
        Self { half_width }
    }
}

impl MaskSelector for Segment {
    fn compute_masks(&self, pair: &PairContext<'_>) -> Result<(Mask, Mask)> {
        let mut lo = empty_mask(pair.view_lo);
        let mut hi = empty_mask(pair.view_hi);
        let mut kept = 0usize;
        let mut rejected = 0usize;

        for (describer, matches) in pair.matches {
            let positions = matched_positions(pair, describer, matches)?;
            for window in positions.windows(2) {
                let (a_lo, a_hi) = window[0];
                let (b_lo, b_hi) = window[1];
                if !is_consistent(a_lo.distance(b_lo), a_hi.distance(b_hi)) {
                    rejected += 1;
                    continue;
                }
                stamp_segment(&mut lo, a_lo, b_lo, self.half_width);
                stamp_segment(&mut hi, a_hi, b_hi, self.half_width);
                kept += 1;
            }
        }

        tracing::debug!(pair = %pair.key, kept, rejected, "Segment selection");
        Ok((lo, hi))
    }
}

fn is_consistent(len_lo: f64, len_hi: f64) -> bool {
    let (short, long) = if len_lo < len_hi {
        (len_lo, len_hi)
    } else {
        (len_hi, len_lo)
    };
    short >= MIN_LENGTH && long <= short * MAX_LENGTH_RATIO
}

/// Marks every pixel within `half_width` of the segment `from`-`to`.
///
/// The segment is first clipped to the mask grown by `half_width`, so the
/// number of stamped discs is bounded by the mask size.
fn stamp_segment(mask: &mut Mask, from: DVec2, to: DVec2, half_width: u32) {
    let (min, max) = padded_bounds(mask, half_width);
    let Some((from, to)) = clip_segment(from, to, min, max) else {
        return;
    };
    let steps = from.distance(to).ceil().max(1.0) as usize;
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        stamp_disc(mask, from.lerp(to, t), half_width);
    }
}

/// Liang-Barsky clipping of `from`-`to` against the box `[min, max]`.
fn clip_segment(from: DVec2, to: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    let delta = to - from;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-delta.x, from.x - min.x),
        (delta.x, max.x - from.x),
        (-delta.y, from.y - min.y),
        (delta.y, max.y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((from + delta * t0, from + delta * t1))
}
