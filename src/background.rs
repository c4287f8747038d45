//! Decaying background model and foreground extraction.

use image::{GrayImage, Luma, Rgb, Rgb32FImage, RgbImage};
use log::{debug, warn};

use crate::{Error, Region, Result};

const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];
const DEFACE_GRAY: Rgb<u8> = Rgb([127, 127, 127]);

/// Configuration for [`BackgroundModel`].
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Fraction of the reference kept on each blend, in (0, 1) exclusive.
    /// Values close to 1 adapt slowly; the default is 0.999.
    pub decay: f64,

    /// Regions painted flat gray before the model sees a frame, hiding static
    /// overlays (timestamps, channel logos) from foreground extraction.
    pub masked_regions: Vec<Region>,

    /// Side length of the local mean window, odd and at least 3. Default 51.
    pub threshold_window: u32,

    /// Offset subtracted from the local mean before comparison. Default 8.
    pub threshold_offset: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            decay: 0.999,
            masked_regions: Vec::new(),
            threshold_window: 51,
            threshold_offset: 8.0,
        }
    }
}

/// Slowly-adapting reference image separating moving foreground from static
/// background.
///
/// The first observed frame becomes the reference and yields an all-zero
/// mask. Every later frame is blended into the reference and compared against
/// it; the comparison is an inverted local-mean threshold over the luma of the
/// absolute difference, so the mask picks out locally-contrasted change while
/// staying quiet under uniform illumination drift.
pub struct BackgroundModel {
    config: BackgroundConfig,
    reference: Option<Rgb32FImage>,
}

impl BackgroundModel {
    /// Create a model from a validated configuration.
    pub fn new(config: BackgroundConfig) -> Result<Self> {
        if !(config.decay > 0.0 && config.decay < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "decay must lie strictly inside (0, 1), got {}",
                config.decay
            )));
        }
        if config.threshold_window < 3 || config.threshold_window % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "threshold_window must be odd and at least 3, got {}",
                config.threshold_window
            )));
        }
        Ok(Self {
            config,
            reference: None,
        })
    }

    /// Size of the established reference, if a frame has been observed.
    pub fn reference_size(&self) -> Option<(u32, u32)> {
        self.reference.as_ref().map(|r| r.dimensions())
    }

    /// Fold a frame into the model and return its foreground mask.
    ///
    /// # Arguments
    /// * `frame` - Next frame of the stream, same size as every prior frame
    ///
    /// # Returns
    /// Mask with 255 at foreground pixels. The first call establishes the
    /// reference and returns an all-zero mask; later calls return
    /// [`Error::DimensionMismatch`] if the frame size changed, which is fatal
    /// for the stream.
    pub fn observe(&mut self, frame: &RgbImage) -> Result<GrayImage> {
        let (width, height) = frame.dimensions();
        let mut defaced = frame.clone();
        self.deface(&mut defaced);

        match self.reference.as_mut() {
            None => {
                self.reference = Some(to_f32(&defaced));
                debug!("background reference established at {}x{}", width, height);
                Ok(GrayImage::new(width, height))
            }
            Some(reference) => {
                let expected = reference.dimensions();
                if expected != (width, height) {
                    return Err(Error::DimensionMismatch {
                        expected,
                        got: (width, height),
                    });
                }

                // Blend first, then difference against the updated reference
                blend(reference, &defaced, self.config.decay as f32);
                let gray = luma_difference(reference, &defaced);
                Ok(threshold_foreground(
                    &gray,
                    self.config.threshold_window,
                    self.config.threshold_offset,
                ))
            }
        }
    }

    fn deface(&self, frame: &mut RgbImage) {
        let (width, height) = frame.dimensions();
        for region in &self.config.masked_regions {
            if !region.fits_within(width, height) {
                warn!(
                    "masked region {:?} outside {}x{} frame, skipping",
                    region, width, height
                );
                continue;
            }
            for y in region.y..region.y + region.height {
                for x in region.x..region.x + region.width {
                    frame.put_pixel(x, y, DEFACE_GRAY);
                }
            }
        }
    }
}

fn to_f32(frame: &RgbImage) -> Rgb32FImage {
    let (width, height) = frame.dimensions();
    Rgb32FImage::from_fn(width, height, |x, y| {
        let p = frame.get_pixel(x, y);
        Rgb([p[0] as f32, p[1] as f32, p[2] as f32])
    })
}

/// `reference := decay * reference + (1 - decay) * frame`, per channel.
fn blend(reference: &mut Rgb32FImage, frame: &RgbImage, decay: f32) {
    let take = 1.0 - decay;
    for (reference_px, frame_px) in reference.pixels_mut().zip(frame.pixels()) {
        for c in 0..3 {
            reference_px[c] = reference_px[c] * decay + frame_px[c] as f32 * take;
        }
    }
}

/// Luma of the per-channel absolute difference, rounded to u8.
fn luma_difference(reference: &Rgb32FImage, frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let r = reference.get_pixel(x, y);
        let f = frame.get_pixel(x, y);
        let mut luma = 0.0f32;
        for c in 0..3 {
            luma += LUMA_WEIGHTS[c] * (f[c] as f32 - r[c]).abs();
        }
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Inverted mean threshold: 255 where `gray(x, y) <= window_mean - offset`.
///
/// The window is clamped at image borders and the mean normalized by the
/// clamped pixel count. Means come from a summed-area table, so the cost is
/// independent of the window size.
fn threshold_foreground(gray: &GrayImage, window: u32, offset: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let w = width as usize;
    let h = height as usize;
    let stride = w + 1;

    // Summed-area table with a zero top row and left column
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + (x + 1)] = integral[y * stride + (x + 1)] + row_sum;
        }
    }

    let radius = (window / 2) as i64;
    let mut mask = GrayImage::new(width, height);
    for y in 0..h as i64 {
        let y0 = (y - radius).max(0) as usize;
        let y1 = (y + radius).min(h as i64 - 1) as usize;
        for x in 0..w as i64 {
            let x0 = (x - radius).max(0) as usize;
            let x1 = (x + radius).min(w as i64 - 1) as usize;

            let sum = integral[(y1 + 1) * stride + (x1 + 1)] + integral[y0 * stride + x0]
                - integral[y0 * stride + (x1 + 1)]
                - integral[(y1 + 1) * stride + x0];
            let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as f64;
            let mean = sum as f64 / count;

            let value = gray.get_pixel(x as u32, y as u32)[0] as f64;
            if value <= mean - offset {
                mask.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }
    mask
}
