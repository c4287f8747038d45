//! End-to-end frame processing.

use std::collections::BTreeMap;

use image::RgbImage;
use log::debug;

use crate::appearance::AppearanceFingerprint;
use crate::background::{BackgroundConfig, BackgroundModel};
use crate::blob::{BlobDetector, BlobSelection};
use crate::tracker::{Identity, IdentityTracker, Registry, TrackedRegion, TrackerConfig};
use crate::Result;

/// Configuration for a full [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Background model settings.
    pub background: BackgroundConfig,

    /// Which foreground blobs become detections.
    pub selection: BlobSelection,

    /// Identity matching settings.
    pub tracker: TrackerConfig,
}

/// One stream's worth of tracking state: background model, blob detector,
/// tracker and identity registry, driven one frame at a time.
///
/// A pipeline owns everything it mutates, so independent streams can run on
/// separate pipelines in separate threads without any sharing.
///
/// # Example
///
/// ```rust,ignore
/// use chromatrack::{Pipeline, PipelineConfig};
///
/// let mut pipeline = Pipeline::new(PipelineConfig::default())?;
/// for frame in frames {
///     for tracked in pipeline.process_frame(&frame)? {
///         println!("identity {} at {:?}", tracked.identity, tracked.region);
///     }
/// }
/// ```
pub struct Pipeline {
    background: BackgroundModel,
    detector: BlobDetector,
    tracker: IdentityTracker,
    registry: Registry,
}

impl Pipeline {
    /// Create a pipeline, validating every stage's configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            background: BackgroundModel::new(config.background)?,
            detector: BlobDetector::new(config.selection),
            tracker: IdentityTracker::new(config.tracker)?,
            registry: Registry::new(),
        })
    }

    /// Run one frame through background modelling, blob detection and
    /// identity matching.
    ///
    /// The first frame establishes the background reference and returns no
    /// detections. A frame whose size differs from the reference returns
    /// [`crate::Error::DimensionMismatch`] without touching the registry;
    /// the stream cannot continue past it.
    ///
    /// # Arguments
    /// * `frame` - Next frame of the stream
    ///
    /// # Returns
    /// The identity-bound detections of this frame, largest first.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<Vec<TrackedRegion>> {
        let mask = self.background.observe(frame)?;
        let detections = self.detector.detect(&mask);
        let tracked = self.tracker.update(&mut self.registry, &detections, frame);
        debug!(
            "frame processed: {} candidate regions, {} tracked",
            detections.len(),
            tracked.len()
        );
        Ok(tracked)
    }

    /// The identity registry accumulated so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Copy of every registered fingerprint, keyed by identity.
    pub fn registry_snapshot(&self) -> BTreeMap<Identity, AppearanceFingerprint> {
        self.registry.snapshot()
    }
}
