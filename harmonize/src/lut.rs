//! Lookup tables that apply fitted corrections to 8-bit images.

use common::parallel::par_rows_mut;
use image::RgbImage;
use rayon::prelude::*;

use crate::channel::Channel;
use crate::histogram::BIN_COUNT;
use crate::solve::{ChannelSolution, GainOffset};

/// 256-entry intensity mapping for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lut([u8; BIN_COUNT]);

impl Default for Lut {
    fn default() -> Self {
        Self::identity()
    }
}

impl Lut {
    pub fn identity() -> Self {
        Self(std::array::from_fn(|k| k as u8))
    }

    /// `clamp(round(k * gain + offset), 0, 255)` for every level `k`.
    pub fn from_gain_offset(correction: GainOffset) -> Self {
        Self(std::array::from_fn(|k| {
            correction.apply(k as f64).round().clamp(0.0, 255.0) as u8
        }))
    }

    #[inline]
    pub fn get(&self, value: u8) -> u8 {
        self.0[value as usize]
    }

    pub fn entries(&self) -> &[u8; BIN_COUNT] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

/// Per-channel tables for one camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbLut {
    channels: [Lut; 3],
}

impl RgbLut {
    pub fn new(red: Lut, green: Lut, blue: Lut) -> Self {
        Self {
            channels: [red, green, blue],
        }
    }

    /// Tables of `camera` taken from the channel solutions. Channels without a
    /// solution keep the identity.
    pub fn for_camera(solutions: &[ChannelSolution], camera: usize) -> Self {
        let mut lut = Self::default();
        for solution in solutions {
            if let Some(&correction) = solution.cameras.get(camera) {
                lut.channels[solution.channel.index()] = Lut::from_gain_offset(correction);
            }
        }
        lut
    }

    pub fn channel(&self, channel: Channel) -> &Lut {
        &self.channels[channel.index()]
    }

    /// Remaps every pixel in place, in parallel over row chunks.
    pub fn apply(&self, image: &mut RgbImage) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let row_len = image.width() as usize * 3;
        let [red, green, blue] = &self.channels;
        par_rows_mut(&mut **image, row_len).for_each(|(_, rows)| {
            for pixel in rows.chunks_exact_mut(3) {
                pixel[0] = red.get(pixel[0]);
                pixel[1] = green.get(pixel[1]);
                pixel[2] = blue.get(pixel[2]);
            }
        });
    }
}
