//! Identity tracking over detected regions.

use std::collections::BTreeMap;

use image::RgbImage;
use log::{debug, warn};

use crate::appearance::{AppearanceDescriptor, AppearanceFingerprint};
use crate::distance::HistogramMetric;
use crate::matching::{build_cost_matrix, first_below_threshold};
use crate::{Error, Region, Result};

/// Stable identity of a tracked object, allocated from 0 per [`Registry`].
pub type Identity = u64;

/// How a registered fingerprint evolves on later matches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RefreshPolicy {
    /// Fingerprints are written once at registration and never change; only
    /// the center point follows later matches. The reference behavior.
    #[default]
    WriteOnce,
    /// Blend each matched detection's fingerprint into the stored one,
    /// keeping the given fraction of the stored mass.
    BlendOnMatch(f64),
}

/// A registered identity: its fingerprint and last known position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    /// The identity this record belongs to.
    pub identity: Identity,
    /// Appearance captured at registration (see [`RefreshPolicy`]).
    pub fingerprint: AppearanceFingerprint,
    /// Centroid of the most recently matched region.
    pub last_center: (u32, u32),
}

/// A detection bound to an identity for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRegion {
    /// Where the detection was this frame.
    pub region: Region,
    /// The identity it was bound to.
    pub identity: Identity,
}

/// Known identities of one stream.
///
/// Entries are created once, updated in place and never removed; identities
/// grow monotonically from 0. Iteration is in ascending identity order, which
/// is also the column order used by matching, independent of insertion
/// history.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: BTreeMap<Identity, TrackRecord>,
    next_identity: Identity,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no identity has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by identity.
    pub fn get(&self, identity: Identity) -> Option<&TrackRecord> {
        self.records.get(&identity)
    }

    /// Iterate records in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> + '_ {
        self.records.values()
    }

    /// Iterate identities in ascending order.
    pub fn identities(&self) -> impl Iterator<Item = Identity> + '_ {
        self.records.keys().copied()
    }

    /// Register a new identity with its first fingerprint and center.
    pub fn allocate(&mut self, fingerprint: AppearanceFingerprint, center: (u32, u32)) -> Identity {
        let identity = self.next_identity;
        self.next_identity += 1;
        self.records.insert(
            identity,
            TrackRecord {
                identity,
                fingerprint,
                last_center: center,
            },
        );
        debug!("allocated identity {}", identity);
        identity
    }

    /// Copy of every stored fingerprint, keyed by identity.
    ///
    /// A snapshot, not a live view: later registry changes do not alter it.
    pub fn snapshot(&self) -> BTreeMap<Identity, AppearanceFingerprint> {
        self.records
            .iter()
            .map(|(&identity, record)| (identity, record.fingerprint.clone()))
            .collect()
    }

    fn record_mut(&mut self, identity: Identity) -> Option<&mut TrackRecord> {
        self.records.get_mut(&identity)
    }
}

/// Configuration for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum metric cost for a valid match; strictly below wins.
    pub distance_threshold: f64,

    /// Histogram metric used for matching costs.
    pub metric: HistogramMetric,

    /// Fingerprint histogram shape as `(hue_bins, sat_bins)`.
    pub histogram_bins: (usize, usize),

    /// Fingerprint refresh behavior on successful matches.
    pub refresh: RefreshPolicy,
}

impl TrackerConfig {
    /// Create a configuration with the given matching threshold.
    ///
    /// Thresholds are in the units of the configured metric; the default of
    /// 0.3 is tuned for Bhattacharyya costs on 8x8 fingerprints.
    pub fn new(distance_threshold: f64) -> Self {
        Self {
            distance_threshold,
            metric: HistogramMetric::default(),
            histogram_bins: (8, 8),
            refresh: RefreshPolicy::default(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(0.3)
    }
}

/// Matches detections to registered identities by color appearance.
///
/// The tracker itself is pure configuration; all evolving state lives in the
/// [`Registry`] passed into [`IdentityTracker::update`], so a tracker value
/// serves any number of independent streams.
pub struct IdentityTracker {
    /// Tracker configuration.
    pub config: TrackerConfig,

    descriptor: AppearanceDescriptor,
}

impl IdentityTracker {
    /// Create a tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if !config.distance_threshold.is_finite() || config.distance_threshold <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "distance_threshold must be finite and positive, got {}",
                config.distance_threshold
            )));
        }
        if let RefreshPolicy::BlendOnMatch(retain) = config.refresh {
            if !(0.0..=1.0).contains(&retain) {
                return Err(Error::InvalidConfig(format!(
                    "blend retain fraction must lie in [0, 1], got {}",
                    retain
                )));
            }
        }
        let descriptor = AppearanceDescriptor::new(config.histogram_bins)?;
        Ok(Self { config, descriptor })
    }

    /// The descriptor used for detection fingerprints.
    pub fn descriptor(&self) -> &AppearanceDescriptor {
        &self.descriptor
    }

    /// Bind this frame's detections to identities.
    ///
    /// Each detection's fingerprint is compared against every fingerprint
    /// registered at entry, in ascending identity order; the first cost
    /// strictly below `distance_threshold` wins and updates that identity's
    /// center. A detection matching nothing registers a new identity.
    /// Identities allocated during this call never participate in this
    /// call's matching, and a matched identity stays available to later
    /// detections of the same frame.
    ///
    /// Detections whose region does not fit the frame are dropped with a
    /// warning; the rest of the frame proceeds.
    ///
    /// # Arguments
    /// * `registry` - Identity state of this stream
    /// * `detections` - Candidate regions for this frame, in detection order
    /// * `frame` - The frame the regions were detected in
    ///
    /// # Returns
    /// One [`TrackedRegion`] per surviving detection, in input order.
    pub fn update(
        &self,
        registry: &mut Registry,
        detections: &[Region],
        frame: &RgbImage,
    ) -> Vec<TrackedRegion> {
        // Fingerprint every usable detection
        let mut kept: Vec<Region> = Vec::with_capacity(detections.len());
        let mut fingerprints: Vec<AppearanceFingerprint> = Vec::with_capacity(detections.len());
        for region in detections {
            match self.descriptor.compute(frame, region) {
                Ok(fingerprint) => {
                    kept.push(*region);
                    fingerprints.push(fingerprint);
                }
                Err(err) => warn!("dropping detection {:?}: {}", region, err),
            }
        }

        // Column order is fixed for the whole call: ascending identity at entry
        let columns: Vec<Identity> = registry.identities().collect();
        let costs = {
            let registered: Vec<&AppearanceFingerprint> =
                registry.iter().map(|record| &record.fingerprint).collect();
            build_cost_matrix(self.config.metric, &fingerprints, &registered)
        };

        let mut tracked = Vec::with_capacity(kept.len());
        for (row, region) in kept.iter().enumerate() {
            let identity = match first_below_threshold(&costs, row, self.config.distance_threshold)
            {
                Some(column) => {
                    let identity = columns[column];
                    self.absorb_match(registry, identity, region.center(), &fingerprints[row]);
                    identity
                }
                None => registry.allocate(fingerprints[row].clone(), region.center()),
            };
            tracked.push(TrackedRegion {
                region: *region,
                identity,
            });
        }

        debug!(
            "update: {} detections in, {} tracked, {} identities registered",
            detections.len(),
            tracked.len(),
            registry.len()
        );
        tracked
    }

    fn absorb_match(
        &self,
        registry: &mut Registry,
        identity: Identity,
        center: (u32, u32),
        observed: &AppearanceFingerprint,
    ) {
        if let Some(record) = registry.record_mut(identity) {
            record.last_center = center;
            if let RefreshPolicy::BlendOnMatch(retain) = self.config.refresh {
                record.fingerprint.blend(observed, retain);
            }
        }
    }
}
