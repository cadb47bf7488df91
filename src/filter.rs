//! Bounded-region centroid extraction from depth point clouds.
//!
//! Reduces a cloud to the mean lateral position, minimum depth, and count
//! of the points inside the configured tracking box. The reduction is a
//! plain sum + min, so point order never matters.

use crate::config::TrackingParams;

/// Depth reported when no points fall inside the volume.
pub const UNREACHABLE_DEPTH: f64 = 1e6;

/// A single point in the sensor optical frame (meters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The 3D region of interest in sensor-centered coordinates.
///
/// The y-axis test is applied on the negated sensor y: optical frames
/// point y downward, so `-p.y` is height above the sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingVolume {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl BoundingVolume {
    pub fn from_params(params: &TrackingParams) -> Self {
        Self {
            min_x: params.min_x,
            max_x: params.max_x,
            min_y: params.min_y,
            max_y: params.max_y,
            max_z: params.max_z,
        }
    }

    /// Membership test for a single point.
    pub fn contains(&self, p: Point3) -> bool {
        -p.y > self.min_y
            && -p.y < self.max_y
            && p.x < self.max_x
            && p.x > self.min_x
            && p.z < self.max_z
    }
}

/// Centroid summary of the in-volume points for one cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentroidSummary {
    /// Mean lateral position of included points
    pub x: f64,
    /// Mean height of included points
    pub y: f64,
    /// Minimum depth among included points, or [`UNREACHABLE_DEPTH`]
    pub z_min: f64,
    /// Number of included points
    pub count: u32,
}

impl CentroidSummary {
    pub fn empty() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z_min: UNREACHABLE_DEPTH,
            count: 0,
        }
    }
}

/// Reduces point clouds to centroid summaries for one bounding volume.
#[derive(Clone, Copy, Debug)]
pub struct PointFilter {
    volume: BoundingVolume,
}

impl PointFilter {
    pub fn new(volume: BoundingVolume) -> Self {
        Self { volume }
    }

    /// Scan the cloud and summarize the in-volume points.
    ///
    /// Points with any non-finite coordinate are skipped before the
    /// membership test, so sensor NaN returns never poison the sums.
    pub fn summarize(&self, points: &[Point3]) -> CentroidSummary {
        let mut summary = CentroidSummary::empty();

        for &p in points {
            if !p.is_finite() {
                continue;
            }
            if self.volume.contains(p) {
                summary.x += p.x;
                summary.y += p.y;
                summary.z_min = summary.z_min.min(p.z);
                summary.count += 1;
            }
        }

        if summary.count > 0 {
            summary.x /= summary.count as f64;
            summary.y /= summary.count as f64;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> PointFilter {
        PointFilter::new(BoundingVolume::from_params(&TrackingParams::default()))
    }

    /// A point comfortably inside the default box: -y = 0.3, z = 0.5.
    fn inside(x: f64) -> Point3 {
        Point3::new(x, -0.3, 0.5)
    }

    #[test]
    fn empty_cloud_reports_unreachable_depth() {
        let summary = default_filter().summarize(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.z_min, UNREACHABLE_DEPTH);
    }

    #[test]
    fn membership_is_applied_on_negated_y() {
        let filter = default_filter();

        // -y = 0.3 is inside (0.1, 0.5); -y = -0.3 is not
        assert_eq!(filter.summarize(&[Point3::new(0.0, -0.3, 0.5)]).count, 1);
        assert_eq!(filter.summarize(&[Point3::new(0.0, 0.3, 0.5)]).count, 0);
    }

    #[test]
    fn boundary_points_are_excluded() {
        let filter = default_filter();

        // All comparisons are strict
        assert_eq!(filter.summarize(&[Point3::new(0.2, -0.3, 0.5)]).count, 0);
        assert_eq!(filter.summarize(&[Point3::new(-0.2, -0.3, 0.5)]).count, 0);
        assert_eq!(filter.summarize(&[Point3::new(0.0, -0.1, 0.5)]).count, 0);
        assert_eq!(filter.summarize(&[Point3::new(0.0, -0.5, 0.5)]).count, 0);
        assert_eq!(filter.summarize(&[Point3::new(0.0, -0.3, 0.8)]).count, 0);
    }

    #[test]
    fn excluded_points_never_touch_the_sums() {
        let filter = default_filter();
        let cloud = vec![
            inside(0.1),
            Point3::new(5.0, -0.3, 0.5),  // outside x
            Point3::new(0.1, -0.3, 10.0), // outside z
            inside(0.1),
        ];

        let summary = filter.summarize(&cloud);
        assert_eq!(summary.count, 2);
        assert!((summary.x - 0.1).abs() < 1e-12);
        assert_eq!(summary.z_min, 0.5);
    }

    #[test]
    fn non_finite_input_points_are_skipped() {
        let filter = default_filter();
        let cloud = vec![
            Point3::new(f64::NAN, -0.3, 0.5),
            Point3::new(0.0, f64::INFINITY, 0.5),
            Point3::new(0.1, -0.3, f64::NAN),
            inside(0.1),
        ];

        let summary = filter.summarize(&cloud);
        assert_eq!(summary.count, 1);
        assert!(summary.x.is_finite());
        assert!((summary.x - 0.1).abs() < 1e-12);
    }

    #[test]
    fn z_min_is_the_minimum_included_depth() {
        let filter = default_filter();
        let cloud = vec![
            Point3::new(0.0, -0.3, 0.7),
            Point3::new(0.0, -0.3, 0.4),
            Point3::new(0.0, -0.3, 0.6),
            Point3::new(0.0, -0.3, 0.9), // outside z, must not lower z_min
        ];

        assert_eq!(filter.summarize(&cloud).z_min, 0.4);
    }

    #[test]
    fn centroid_is_the_mean_of_included_points() {
        let filter = default_filter();
        let cloud = vec![inside(-0.1), inside(0.1), inside(0.15)];

        let summary = filter.summarize(&cloud);
        assert_eq!(summary.count, 3);
        assert!((summary.x - 0.05).abs() < 1e-12);
        assert!((summary.y - (-0.3)).abs() < 1e-12);
    }
}
