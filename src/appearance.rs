//! Appearance fingerprints: hue/saturation histograms over image regions.

use image::{Rgb, RgbImage};
use nalgebra::DMatrix;

use crate::{Error, Region, Result};

/// Joint hue/saturation histogram describing the color appearance of a region.
///
/// Bin values are non-negative and sum to 1 (within floating-point tolerance),
/// so fingerprints from regions of different sizes are directly comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceFingerprint {
    /// Normalized bin weights, shape `(hue_bins, sat_bins)`.
    pub bins: DMatrix<f64>,
}

impl AppearanceFingerprint {
    fn new(bins: DMatrix<f64>) -> Self {
        Self { bins }
    }

    /// Histogram shape as `(hue_bins, sat_bins)`.
    pub fn shape(&self) -> (usize, usize) {
        self.bins.shape()
    }

    /// Total mass across all bins (1.0 up to floating-point tolerance).
    pub fn sum(&self) -> f64 {
        self.bins.sum()
    }

    /// Blend another fingerprint into this one, keeping `retain` of the
    /// existing mass, then renormalize.
    ///
    /// Both fingerprints must share the same shape.
    pub fn blend(&mut self, other: &AppearanceFingerprint, retain: f64) {
        debug_assert_eq!(self.shape(), other.shape());
        self.bins = &self.bins * retain + &other.bins * (1.0 - retain);
        let total = self.bins.sum();
        self.bins /= total;
    }
}

/// Computes [`AppearanceFingerprint`]s from frame regions.
///
/// The descriptor is pure configuration: `compute` has no internal state and
/// identical `(frame, region)` inputs always produce bit-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppearanceDescriptor {
    hue_bins: usize,
    sat_bins: usize,
}

impl AppearanceDescriptor {
    /// Create a descriptor with the given `(hue_bins, sat_bins)` shape.
    ///
    /// Both axes must have at least one bin.
    pub fn new(bins: (usize, usize)) -> Result<Self> {
        let (hue_bins, sat_bins) = bins;
        if hue_bins == 0 || sat_bins == 0 {
            return Err(Error::InvalidConfig(format!(
                "histogram bins must be positive on both axes, got {}x{}",
                hue_bins, sat_bins
            )));
        }
        Ok(Self { hue_bins, sat_bins })
    }

    /// Histogram shape as `(hue_bins, sat_bins)`.
    pub fn bins(&self) -> (usize, usize) {
        (self.hue_bins, self.sat_bins)
    }

    /// Compute the fingerprint of `region` within `frame`.
    ///
    /// The hue axis spans the full [0, 360) degree circle and the saturation
    /// axis spans [0, 256); both are divided into uniform bins. Achromatic
    /// pixels (gray, black, white) land in hue bin 0 with saturation 0.
    ///
    /// # Arguments
    /// * `frame` - Source image
    /// * `region` - Sub-rectangle to describe; must lie fully inside the frame
    ///
    /// # Returns
    /// The normalized fingerprint, or [`Error::InvalidRegion`] if the region
    /// does not fit within the frame.
    pub fn compute(&self, frame: &RgbImage, region: &Region) -> Result<AppearanceFingerprint> {
        let (frame_width, frame_height) = frame.dimensions();
        if !region.fits_within(frame_width, frame_height) {
            return Err(Error::InvalidRegion(format!(
                "{:?} outside {}x{} frame",
                region, frame_width, frame_height
            )));
        }

        let mut bins = DMatrix::zeros(self.hue_bins, self.sat_bins);
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let &Rgb([r, g, b]) = frame.get_pixel(x, y);
                let (hue, sat) = hue_saturation(r, g, b);
                let h = bin_index(hue, 360.0, self.hue_bins);
                let s = bin_index(sat, 256.0, self.sat_bins);
                bins[(h, s)] += 1.0;
            }
        }

        bins /= region.area() as f64;
        Ok(AppearanceFingerprint::new(bins))
    }
}

impl Default for AppearanceDescriptor {
    fn default() -> Self {
        Self {
            hue_bins: 8,
            sat_bins: 8,
        }
    }
}

/// Hue in degrees [0, 360) and saturation in [0, 255] for an RGB pixel.
///
/// Uses the max/min chroma formulation; achromatic pixels report hue 0.
fn hue_saturation(r: u8, g: u8, b: u8) -> (f32, f32) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let hue = if delta > 0.0 {
        let h = if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        if h < 0.0 {
            h + 360.0
        } else {
            h
        }
    } else {
        0.0
    };

    (hue, saturation)
}

/// Uniform bin index for `value` in `[0, range)`, clamped to the last bin.
fn bin_index(value: f32, range: f32, bins: usize) -> usize {
    let idx = (value * bins as f32 / range) as usize;
    idx.min(bins - 1)
}
