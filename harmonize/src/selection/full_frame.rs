use super::{Mask, MaskSelector, PairContext, SELECTED};
use crate::error::Result;

/// Selects every pixel of both images.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullFrame;

impl MaskSelector for FullFrame {
    fn compute_masks(&self, pair: &PairContext<'_>) -> Result<(Mask, Mask)> {
        let lo = Mask::from_pixel(pair.view_lo.width, pair.view_lo.height, SELECTED);
        let hi = Mask::from_pixel(pair.view_hi.width, pair.view_hi.height, SELECTED);
        Ok((lo, hi))
    }
}
