//! Axis-aligned bounding boxes and orthographic camera fitting.

use serde::Deserialize;

/// Fraction of padding added around a fitted box on each axis (5%).
pub const FIT_PADDING: f64 = 0.05;

/// Minimum frame extent used when a box is degenerate (a point or a
/// zero-width strip), so the camera frustum never collapses.
const MIN_EXTENT: f64 = 1.0;

/// World-coordinate bounding box as reported by the semantic detectors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    #[serde(alias = "x_min", alias = "minX")]
    pub xmin: f64,
    #[serde(alias = "y_min", alias = "minY")]
    pub ymin: f64,
    #[serde(alias = "x_max", alias = "maxX")]
    pub xmax: f64,
    #[serde(alias = "y_max", alias = "maxY")]
    pub ymax: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }
}

/// Orthographic frustum that centers on and tightly fits a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl CameraFrame {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Fit an orthographic frame around `bbox` for a viewport of the given
/// pixel dimensions.
///
/// The box is padded by [`FIT_PADDING`] on both axes, then whichever
/// of width/height is the binding constraint for the viewport's aspect
/// ratio is kept and the other grows to preserve that ratio, so the
/// whole box is visible without distortion.
pub fn fit_frame(bbox: &BoundingBox, viewport_width: f64, viewport_height: f64) -> CameraFrame {
    let (cx, cy) = bbox.center();

    let padded_w = (bbox.width() * (1.0 + 2.0 * FIT_PADDING)).max(MIN_EXTENT);
    let padded_h = (bbox.height() * (1.0 + 2.0 * FIT_PADDING)).max(MIN_EXTENT);

    let aspect = if viewport_height > 0.0 {
        viewport_width / viewport_height
    } else {
        1.0
    };

    let (frame_w, frame_h) = if padded_w / padded_h > aspect {
        // Width binds: grow height to match the viewport ratio.
        (padded_w, padded_w / aspect)
    } else {
        // Height binds: grow width.
        (padded_h * aspect, padded_h)
    };

    CameraFrame {
        left: cx - frame_w / 2.0,
        right: cx + frame_w / 2.0,
        top: cy + frame_h / 2.0,
        bottom: cy - frame_h / 2.0,
        center_x: cx,
        center_y: cy,
    }
}
