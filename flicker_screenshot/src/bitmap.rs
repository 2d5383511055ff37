// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

/// Packed `0xAARRGGBB` colors.
pub mod color {
    /// Fully transparent black.
    pub const TRANSPARENT: u32 = 0x00_00_00_00;
    /// Opaque black.
    pub const BLACK: u32 = 0xff_00_00_00;
    /// Opaque white.
    pub const WHITE: u32 = 0xff_ff_ff_ff;
    /// Opaque magenta, used to mark differing pixels.
    pub const MAGENTA: u32 = 0xff_ff_00_ff;

    /// Packs four channels.
    #[must_use]
    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> u32 {
        u32::from_be_bytes([alpha, red, green, blue])
    }

    /// Alpha channel.
    #[must_use]
    pub const fn alpha(c: u32) -> u8 {
        c.to_be_bytes()[0]
    }

    /// Red channel.
    #[must_use]
    pub const fn red(c: u32) -> u8 {
        c.to_be_bytes()[1]
    }

    /// Green channel.
    #[must_use]
    pub const fn green(c: u32) -> u8 {
        c.to_be_bytes()[2]
    }

    /// Blue channel.
    #[must_use]
    pub const fn blue(c: u32) -> u8 {
        c.to_be_bytes()[3]
    }
}

/// A row-major image of packed ARGB pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Bitmap {
    /// An image of one color.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Wraps `pixels`, or returns `None` if there are not `width * height`
    /// of them.
    #[must_use]
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Option<Self> {
        (width.checked_mul(height) == Some(pixels.len())).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels, row by row.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// The pixel at (`x`, `y`).
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Paints the pixel at (`x`, `y`); out of bounds writes are dropped.
    pub fn set(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width
            && let Some(p) = self.pixels.get_mut(y * self.width + x)
        {
            *p = color;
        }
    }
}
