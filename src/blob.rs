//! Blob detection over foreground masks.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;

use crate::Region;

/// Which traced contours become candidate regions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BlobSelection {
    /// Only the single largest-area contour. This is the reference behavior:
    /// at most one candidate per frame, with no minimum size.
    #[default]
    LargestOnly,
    /// Every contour enclosing at least the given area, largest first.
    MinArea(f64),
    /// The `k` largest contours by enclosed area, largest first.
    TopK(usize),
}

/// Turns a foreground mask into candidate bounding boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobDetector {
    selection: BlobSelection,
}

impl BlobDetector {
    /// Create a detector with the given selection strategy.
    pub fn new(selection: BlobSelection) -> Self {
        Self { selection }
    }

    /// The configured selection strategy.
    pub fn selection(&self) -> BlobSelection {
        self.selection
    }

    /// Detect candidate regions in a mask (non-zero pixels are foreground).
    ///
    /// Outer and hole boundaries are both traced and compete on equal terms;
    /// hierarchy information is ignored. Under
    /// [`BlobSelection::LargestOnly`] there is no minimum size, so a lone
    /// noise pixel yields a 1x1 region when nothing larger is present.
    pub fn detect(&self, mask: &GrayImage) -> Vec<Region> {
        let contours = find_contours::<i32>(mask);
        let mut measured: Vec<(f64, Region)> = contours
            .iter()
            .filter_map(|contour| {
                bounding_region(&contour.points)
                    .map(|region| (contour_area(&contour.points), region))
            })
            .collect();

        // Largest first; the sort is stable, so ties keep trace order
        measured.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        match self.selection {
            BlobSelection::LargestOnly => {
                measured.into_iter().take(1).map(|(_, region)| region).collect()
            }
            BlobSelection::MinArea(min_area) => measured
                .into_iter()
                .filter(|&(area, _)| area >= min_area)
                .map(|(_, region)| region)
                .collect(),
            BlobSelection::TopK(k) => {
                measured.into_iter().take(k).map(|(_, region)| region).collect()
            }
        }
    }
}

/// Absolute shoelace area enclosed by a traced boundary.
///
/// Boundaries with fewer than three points enclose nothing and measure 0.
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

/// Pixel-inclusive bounding box of a traced boundary.
fn bounding_region(points: &[Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut max_x) = (first.x, first.x);
    let (mut min_y, mut max_y) = (first.y, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Region::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    )
    .ok()
}
