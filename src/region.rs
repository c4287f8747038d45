//! Axis-aligned pixel regions.

use crate::{Error, Result};

/// An axis-aligned rectangle in pixel coordinates, origin top-left.
///
/// Regions always have positive extent; construction rejects empty rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Column of the left edge.
    pub x: u32,
    /// Row of the top edge.
    pub y: u32,
    /// Width in pixels (always > 0).
    pub width: u32,
    /// Height in pixels (always > 0).
    pub height: u32,
}

impl Region {
    /// Create a new region.
    ///
    /// # Arguments
    /// * `x`, `y` - Top-left corner
    /// * `width`, `height` - Extent in pixels, both must be positive
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidRegion(format!(
                "extent must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Centroid in pixel coordinates (truncating division, matching the
    /// integer geometry used throughout the crate).
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Number of pixels covered by the region.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the region lies fully inside a frame of the given size.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= frame_width && b <= frame_height)
    }
}
