//! Still-image acquisition from camera or file
//!
//! The camera media handle is exclusively owned here; every stop request
//! funnels through [`DeviceCapture::release`], which is safe to call from any
//! of its trigger sites (explicit stop, successful capture, new-scan start,
//! teardown).

use std::path::PathBuf;

use async_trait::async_trait;

use crate::persona::CAMERA_ERROR;
use crate::{Error, Result};

/// Where the pipeline gets its image from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A user-selected file on disk
    File(PathBuf),
    /// A frame captured from the active camera session
    Camera,
}

/// An open camera stream that can produce still frames
#[async_trait]
pub trait CameraStream: Send {
    /// Grab one compressed frame from the stream
    ///
    /// # Errors
    ///
    /// Returns error if no frame can be produced
    async fn capture_frame(&mut self) -> Result<Vec<u8>>;

    /// Stop the underlying stream and release the device
    fn stop(&mut self);
}

/// A camera device that can be opened into a stream
///
/// Environment-facing where the platform offers a choice.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Open the camera
    ///
    /// # Errors
    ///
    /// Returns error if the device is missing or permission is denied
    async fn open(&self) -> Result<Box<dyn CameraStream>>;
}

/// A live camera session; exists only while the stream is open
pub struct CaptureSession {
    stream: Box<dyn CameraStream>,
}

impl CaptureSession {
    async fn capture_frame(&mut self) -> Result<Vec<u8>> {
        self.stream.capture_frame().await
    }
}

/// Acquires still images from a camera or a file
pub struct DeviceCapture {
    camera: Option<Box<dyn CameraDevice>>,
    session: Option<CaptureSession>,
}

impl DeviceCapture {
    /// Capture without camera hardware; only file sources will work
    #[must_use]
    pub const fn file_only() -> Self {
        Self {
            camera: None,
            session: None,
        }
    }

    /// Capture backed by the given camera device
    #[must_use]
    pub fn with_camera(camera: Box<dyn CameraDevice>) -> Self {
        Self {
            camera: Some(camera),
            session: None,
        }
    }

    /// Whether a camera stream is currently open
    #[must_use]
    pub const fn camera_active(&self) -> bool {
        self.session.is_some()
    }

    /// Open the camera stream so the preview is live
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if no camera is configured or it refuses to
    /// open
    pub async fn start_camera(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let Some(camera) = self.camera.as_ref() else {
            return Err(Error::Capture(CAMERA_ERROR.to_string()));
        };
        let stream = camera.open().await.map_err(|e| {
            tracing::warn!(error = %e, "camera open failed");
            Error::Capture(CAMERA_ERROR.to_string())
        })?;
        self.session = Some(CaptureSession { stream });
        tracing::debug!("camera session started");
        Ok(())
    }

    /// Release any open camera session
    ///
    /// The single release funnel: `take()` guarantees the stream is stopped
    /// at most once no matter how many trigger sites fire.
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stream.stop();
            tracing::debug!("camera session released");
        }
    }

    /// Acquire raw image bytes from the given source
    ///
    /// A camera source captures one frame and then releases the session; a
    /// file source reads the file. Either way no camera stream stays open
    /// past a completed capture.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] on any device, permission, or file-read
    /// failure
    pub async fn acquire(&mut self, source: ImageSource) -> Result<Vec<u8>> {
        match source {
            ImageSource::File(path) => tokio::fs::read(&path).await.map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "image read failed");
                Error::Capture(format!("could not read image: {e}"))
            }),
            ImageSource::Camera => {
                if self.session.is_none() {
                    self.start_camera().await?;
                }
                let session = self
                    .session
                    .as_mut()
                    .ok_or_else(|| Error::Capture(CAMERA_ERROR.to_string()))?;
                let frame = session.capture_frame().await;
                self.release();
                frame.map_err(|e| {
                    tracing::warn!(error = %e, "frame capture failed");
                    Error::Capture(CAMERA_ERROR.to_string())
                })
            }
        }
    }
}

impl Drop for DeviceCapture {
    fn drop(&mut self) {
        self.release();
    }
}
