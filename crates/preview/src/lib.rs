//! Preview composition over an externally supplied geometry renderer.
//!
//! The renderer is a third-party engine consumed through the narrow
//! trait family below: parse raw geometry text into a document, build
//! a viewer for a viewport, and expose the active camera through an
//! accessor so the composer can reframe it onto a bounding box. No
//! constructor interception: the camera the viewer actually uses is
//! the one [`Viewer::camera_mut`] hands out.
//!
//! Composition failures are user-facing inline messages, never job
//! state transitions and never panics.

use drawbridge_client::CadBackend;
use drawbridge_core::bbox::{fit_frame, BoundingBox};
use drawbridge_core::job::JobRecord;

/// Camera elevation above the drawing plane for the top-down preview.
const CAMERA_ELEVATION: f64 = 1000.0;

/// Target viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Error reported by the external parser/renderer.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Orthographic camera controls exposed by the renderer.
pub trait Camera {
    fn set_frustum(&mut self, left: f64, right: f64, top: f64, bottom: f64);
    fn set_position(&mut self, x: f64, y: f64, z: f64);
    fn set_look_at(&mut self, x: f64, y: f64, z: f64);
    fn update_projection_matrix(&mut self);
}

/// A live viewer instance for one document.
pub trait Viewer {
    type Camera: Camera;

    fn render(&mut self);
    fn resize(&mut self, width: f64, height: f64);
    /// The camera actually in use for the next render.
    fn camera_mut(&mut self) -> &mut Self::Camera;
}

/// The external parse/render engine.
pub trait GeometryRenderer {
    type Document;
    type Viewer: Viewer;

    fn parse(&self, raw: &str) -> Result<Self::Document, RenderError>;
    fn create_viewer(
        &self,
        document: Self::Document,
        viewport: Viewport,
    ) -> Result<Self::Viewer, RenderError>;
}

/// Inline message shown in place of a preview when composition fails.
///
/// Deliberately not an `Err` that propagates into the job state
/// machine: a broken preview leaves the job untouched.
#[derive(Debug, thiserror::Error)]
pub enum PreviewMessage {
    #[error("Preview renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Could not load geometry: {0}")]
    FetchFailed(String),

    #[error("Could not parse geometry: {0}")]
    ParseFailed(String),
}

/// Reframe a camera to center on and tightly fit `bbox`, padding by 5%
/// and preserving the viewport aspect ratio.
pub fn frame_camera<C: Camera>(camera: &mut C, bbox: &BoundingBox, viewport: Viewport) {
    let frame = fit_frame(bbox, viewport.width, viewport.height);
    camera.set_frustum(frame.left, frame.right, frame.top, frame.bottom);
    camera.set_position(frame.center_x, frame.center_y, CAMERA_ELEVATION);
    camera.set_look_at(frame.center_x, frame.center_y, 0.0);
    camera.update_projection_matrix();
}

/// Fetch a job's raw geometry, parse and render it, and (when a
/// bounding box is supplied) override the renderer's default framing
/// with a tight fit on that box.
pub async fn compose<R: GeometryRenderer>(
    backend: &dyn CadBackend,
    renderer: &R,
    job: &JobRecord,
    bbox: Option<BoundingBox>,
    viewport: Viewport,
) -> Result<R::Viewer, PreviewMessage> {
    let Some(remote_id) = job.remote_id() else {
        return Err(PreviewMessage::FetchFailed(
            "file was never uploaded".to_string(),
        ));
    };

    let raw = backend
        .download_geometry(remote_id)
        .await
        .map_err(|e| PreviewMessage::FetchFailed(e.to_string()))?;

    let document = renderer
        .parse(&raw)
        .map_err(|e| PreviewMessage::ParseFailed(e.to_string()))?;

    let mut viewer = renderer
        .create_viewer(document, viewport)
        .map_err(|e| PreviewMessage::RendererUnavailable(e.to_string()))?;

    if let Some(bbox) = bbox {
        frame_camera(viewer.camera_mut(), &bbox, viewport);
        tracing::debug!(
            remote_id,
            xmin = bbox.xmin,
            ymin = bbox.ymin,
            "Preview camera reframed onto bounding box",
        );
    }

    viewer.render();
    Ok(viewer)
}
