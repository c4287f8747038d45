//! Identity matching scenarios at the tracker level.
//!
//! These tests bypass the background model and feed exact regions, so
//! fingerprints and costs are known in closed form.

use chromatrack::{
    BlobDetector, BlobSelection, HistogramMetric, IdentityTracker, Region, Registry,
    TrackerConfig,
};
use image::{GrayImage, Luma, Rgb, RgbImage};

const RED: [u8; 3] = [255, 0, 0];
const YELLOW: [u8; 3] = [255, 255, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const CYAN: [u8; 3] = [0, 255, 255];
const BLUE: [u8; 3] = [0, 0, 255];
const MAGENTA: [u8; 3] = [255, 0, 255];

fn frame_with_patches(
    width: u32,
    height: u32,
    patches: &[(Region, [u8; 3])],
) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    for (region, color) in patches {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                frame.put_pixel(x, y, Rgb(*color));
            }
        }
    }
    frame
}

// =============================================================================
// Test 1: Threshold Gates Reassignment
// =============================================================================

#[test]
fn test_threshold_gates_reassignment() {
    // Phase 1 registers a pure red patch. Phase 2 shows a 90% red sighting,
    // close enough to rebind. Phase 3 shows pure blue, far enough to register.
    let tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
    let mut registry = Registry::new();
    let region = Region::new(10, 10, 20, 10).unwrap();

    let frame = frame_with_patches(64, 48, &[(region, RED)]);
    let tracked = tracker.update(&mut registry, &[region], &frame);
    assert_eq!(tracked[0].identity, 0);

    // 18 of 20 columns red, 2 magenta: Bhattacharyya cost ~0.227 < 0.3
    let mut frame = frame_with_patches(64, 48, &[(region, RED)]);
    for y in region.y..region.y + region.height {
        for x in region.x + 18..region.x + 20 {
            frame.put_pixel(x, y, Rgb(MAGENTA));
        }
    }
    let tracked = tracker.update(&mut registry, &[region], &frame);
    assert_eq!(tracked[0].identity, 0, "near appearance must rebind, not register");
    assert_eq!(registry.len(), 1);

    // Disjoint hue: cost 1.0 > 0.3, so a new identity is required
    let frame = frame_with_patches(64, 48, &[(region, BLUE)]);
    let tracked = tracker.update(&mut registry, &[region], &frame);
    assert_eq!(tracked[0].identity, 1, "far appearance must register a new identity");
    assert_eq!(registry.len(), 2);
}

// =============================================================================
// Test 2: Identities Are Monotonic From Zero
// =============================================================================

#[test]
fn test_identities_count_up_from_zero() {
    let tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
    let mut registry = Registry::new();
    let region = Region::new(8, 8, 16, 16).unwrap();

    // Six hues, each in its own bin: every sighting registers fresh
    for (index, color) in [RED, YELLOW, GREEN, CYAN, BLUE, MAGENTA].iter().enumerate() {
        let frame = frame_with_patches(48, 48, &[(region, *color)]);
        let tracked = tracker.update(&mut registry, &[region], &frame);
        assert_eq!(
            tracked[0].identity, index as u64,
            "sighting {} must get identity {}",
            index, index
        );
    }

    assert_eq!(registry.len(), 6);
    let identities: Vec<u64> = registry.identities().collect();
    assert_eq!(identities, vec![0, 1, 2, 3, 4, 5]);
}

// =============================================================================
// Test 3: Fingerprints Are Stable Under Repeated Matches
// =============================================================================

#[test]
fn test_registered_fingerprint_survives_many_matches() {
    let tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
    let mut registry = Registry::new();

    let start = Region::new(4, 10, 16, 16).unwrap();
    let frame = frame_with_patches(96, 48, &[(start, GREEN)]);
    tracker.update(&mut registry, &[start], &frame);
    let original = registry.get(0).unwrap().fingerprint.clone();

    // Ten more sightings as the patch crosses the frame
    for step in 0u32..10 {
        let region = Region::new(8 + step * 7, 10, 16, 16).unwrap();
        let frame = frame_with_patches(96, 48, &[(region, GREEN)]);
        let tracked = tracker.update(&mut registry, &[region], &frame);
        assert_eq!(tracked[0].identity, 0, "step {}: identity drifted", step);
        assert_eq!(
            registry.get(0).unwrap().last_center,
            region.center(),
            "step {}: center not refreshed",
            step
        );
    }

    assert_eq!(
        registry.get(0).unwrap().fingerprint,
        original,
        "the registered fingerprint must stay bitwise identical"
    );
    assert_eq!(registry.len(), 1);
}

// =============================================================================
// Test 4: Empty Frames Preserve the Registry
// =============================================================================

#[test]
fn test_empty_frames_preserve_registry() {
    let tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
    let mut registry = Registry::new();
    let region = Region::new(10, 10, 16, 16).unwrap();

    let frame = frame_with_patches(64, 48, &[(region, CYAN)]);
    tracker.update(&mut registry, &[region], &frame);
    let before = registry.snapshot();

    // A stretch with nothing detected
    for _ in 0..5 {
        let tracked = tracker.update(&mut registry, &[], &frame);
        assert!(tracked.is_empty());
    }
    assert_eq!(registry.snapshot(), before);

    // The object comes back and is still identity 0
    let tracked = tracker.update(&mut registry, &[region], &frame);
    assert_eq!(tracked[0].identity, 0, "identity must survive an empty stretch");
}

// =============================================================================
// Test 5: Every Metric Honors the Same Gate
// =============================================================================

#[test]
fn test_all_metrics_gate_consistently() {
    // The near sighting is 90% red; its cost sits below 0.3 under every
    // metric (Bhattacharyya ~0.227, intersection 0.1, chi-square ~0.105),
    // while pure blue maxes out all three.
    for metric in [
        HistogramMetric::Bhattacharyya,
        HistogramMetric::Intersection,
        HistogramMetric::ChiSquare,
    ] {
        let mut config = TrackerConfig::default();
        config.metric = metric;
        let tracker = IdentityTracker::new(config).unwrap();
        let mut registry = Registry::new();
        let region = Region::new(10, 10, 20, 10).unwrap();

        let frame = frame_with_patches(64, 48, &[(region, RED)]);
        tracker.update(&mut registry, &[region], &frame);

        let mut near = frame_with_patches(64, 48, &[(region, RED)]);
        for y in region.y..region.y + region.height {
            for x in region.x + 18..region.x + 20 {
                near.put_pixel(x, y, Rgb(MAGENTA));
            }
        }
        let tracked = tracker.update(&mut registry, &[region], &near);
        assert_eq!(
            tracked[0].identity, 0,
            "{}: near sighting must rebind",
            metric.name()
        );

        let far = frame_with_patches(64, 48, &[(region, BLUE)]);
        let tracked = tracker.update(&mut registry, &[region], &far);
        assert_eq!(
            tracked[0].identity, 1,
            "{}: far sighting must register",
            metric.name()
        );
    }
}

// =============================================================================
// Test 6: Detector Feeds the Tracker
// =============================================================================

#[test]
fn test_detector_regions_flow_into_identities() {
    // Hand-built mask with two solid rectangles; the frame carries matching
    // color patches at the same places
    let left = Region::new(10, 12, 20, 16).unwrap();
    let right = Region::new(60, 20, 14, 14).unwrap();

    let mut mask = GrayImage::new(96, 64);
    for region in [&left, &right] {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    let detector = BlobDetector::new(BlobSelection::MinArea(50.0));
    let detections = detector.detect(&mask);
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0], left, "largest blob must come first");
    assert_eq!(detections[1], right);

    let frame = frame_with_patches(96, 64, &[(left, RED), (right, BLUE)]);
    let tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
    let mut registry = Registry::new();

    let tracked = tracker.update(&mut registry, &detections, &frame);
    assert_eq!(tracked.len(), 2);
    assert_ne!(tracked[0].identity, tracked[1].identity);

    // Second pass with the same mask rebinds both
    let tracked_again = tracker.update(&mut registry, &detections, &frame);
    assert_eq!(tracked_again[0].identity, tracked[0].identity);
    assert_eq!(tracked_again[1].identity, tracked[1].identity);
    assert_eq!(registry.len(), 2);
}
