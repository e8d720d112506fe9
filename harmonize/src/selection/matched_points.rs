use super::{empty_mask, matched_positions, stamp_disc, Mask, MaskSelector, PairContext};
use crate::error::Result;

/// Selects discs around the matched feature positions of both images.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPoints {
    radius: u32,
}

impl MatchedPoints {
    pub fn new(radius: u32) -> Self {
        assert!(radius > 0, "Disc radius must be positive");
        Self { radius }
    }
}

impl MaskSelector for MatchedPoints {
    fn compute_masks(&self, pair: &PairContext<'_>) -> Result<(Mask, Mask)> {
        let mut lo = empty_mask(pair.view_lo);
        let mut hi = empty_mask(pair.view_hi);

        for (describer, matches) in pair.matches {
            for (p_lo, p_hi) in matched_positions(pair, describer, matches)? {
                stamp_disc(&mut lo, p_lo, self.radius);
                stamp_disc(&mut hi, p_hi, self.radius);
            }
        }

        Ok((lo, hi))
    }
}
