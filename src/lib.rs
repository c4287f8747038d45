//! # Chromatrack - Color-Appearance Object Tracking
//!
//! Chromatrack is a lightweight library for tracking moving objects across a
//! video stream and keeping their identities stable over time using color
//! appearance rather than motion prediction.
//!
//! ## Features
//!
//! - Decaying background model with masked-region support and adaptive
//!   foreground thresholding
//! - Contour-based blob detection with pluggable selection strategies
//! - Hue/saturation histogram fingerprints for re-identification
//! - Pluggable histogram metrics (Bhattacharyya, intersection, chi-square)
//! - Explicit identity registry, trivially instantiable per stream
//!
//! ## Example
//!
//! ```rust,ignore
//! use chromatrack::{Pipeline, PipelineConfig};
//!
//! // One pipeline per video stream
//! let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//!
//! // Feed decoded frames in order; each call returns the regions that moved
//! // this frame together with their stable identities.
//! for frame in frames {
//!     let tracked = pipeline.process_frame(&frame).unwrap();
//!     for t in &tracked {
//!         println!("identity {} at {:?}", t.identity, t.region);
//!     }
//! }
//! ```

// Public modules
pub mod appearance;
pub mod background;
pub mod blob;
pub mod distance;
pub mod matching;
pub mod pipeline;
pub mod region;
pub mod tracker;

// Re-exports for convenience
pub use appearance::{AppearanceDescriptor, AppearanceFingerprint};
pub use background::{BackgroundConfig, BackgroundModel};
pub use blob::{BlobDetector, BlobSelection};
pub use distance::{metric_by_name, HistogramMetric};
pub use pipeline::{Pipeline, PipelineConfig};
pub use region::Region;
pub use tracker::{
    Identity, IdentityTracker, RefreshPolicy, Registry, TrackRecord, TrackedRegion, TrackerConfig,
};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the chromatrack library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid region: {0}")]
        InvalidRegion(String),

        #[error("Frame size {got:?} does not match established reference {expected:?}")]
        DimensionMismatch {
            expected: (u32, u32),
            got: (u32, u32),
        },

        #[error("Unknown histogram metric: {0}")]
        UnknownMetric(String),
    }

    /// Result type for chromatrack operations
    pub type Result<T> = std::result::Result<T, Error>;
}
