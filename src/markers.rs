//! Diagnostic marker construction.
//!
//! Markers visualize the tracking box and the last reported centroid.
//! They are cosmetic only; nothing here feeds back into control.

use serde::Serialize;

use crate::filter::{BoundingVolume, CentroidSummary};

pub const CENTROID_MARKER_ID: u32 = 0;
pub const VOLUME_MARKER_ID: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MarkerShape {
    Sphere,
    Cube,
}

/// A shape to draw in the sensor optical frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub id: u32,
    pub frame_id: String,
    pub shape: MarkerShape,
    pub position: [f64; 3],
    pub scale: [f64; 3],
    /// RGBA, each in [0, 1]
    pub color: [f32; 4],
}

/// Red sphere at the reported centroid, at the closest tracked depth.
pub fn centroid_marker(frame_id: &str, summary: &CentroidSummary) -> Marker {
    Marker {
        id: CENTROID_MARKER_ID,
        frame_id: frame_id.to_string(),
        shape: MarkerShape::Sphere,
        position: [summary.x, summary.y, summary.z_min],
        scale: [0.2, 0.2, 0.2],
        color: [1.0, 0.0, 0.0, 1.0],
    }
}

/// Translucent green box over the configured tracking volume.
///
/// The box starts at the sensor (z from 0 to max_z); the y center is
/// negated to land in the optical frame like the point test does.
pub fn volume_marker(frame_id: &str, volume: &BoundingVolume) -> Marker {
    let cx = (volume.min_x + volume.max_x) / 2.0;
    let cy = (volume.min_y + volume.max_y) / 2.0;
    let cz = volume.max_z / 2.0;

    Marker {
        id: VOLUME_MARKER_ID,
        frame_id: frame_id.to_string(),
        shape: MarkerShape::Cube,
        position: [cx, -cy, cz],
        scale: [
            (volume.max_x - cx) * 2.0,
            (volume.max_y - cy) * 2.0,
            (volume.max_z - cz) * 2.0,
        ],
        color: [0.0, 1.0, 0.0, 0.5],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingParams;

    #[test]
    fn volume_marker_spans_the_box() {
        let volume = BoundingVolume::from_params(&TrackingParams::default());
        let marker = volume_marker("frame", &volume);

        assert_eq!(marker.shape, MarkerShape::Cube);
        assert_eq!(marker.position, [0.0, -0.3, 0.4]);
        assert!((marker.scale[0] - 0.4).abs() < 1e-12);
        assert!((marker.scale[1] - 0.4).abs() < 1e-12);
        assert!((marker.scale[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn centroid_marker_sits_at_closest_depth() {
        let summary = CentroidSummary {
            x: 0.1,
            y: -0.2,
            z_min: 0.7,
            count: 5000,
        };
        let marker = centroid_marker("frame", &summary);

        assert_eq!(marker.shape, MarkerShape::Sphere);
        assert_eq!(marker.position, [0.1, -0.2, 0.7]);
    }
}
