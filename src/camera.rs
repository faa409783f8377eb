//! Camera Capture
//!
//! A [`CameraSession`] owns at most one live stream: starting again stops the
//! previous stream first, and dropping the session releases the device.

use crate::constants::{CAMERA_DEFAULT_HEIGHT, CAMERA_DEFAULT_QUALITY, CAMERA_DEFAULT_WIDTH};
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Why a camera could not be acquired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraErrorKind {
    PermissionDenied,
    NotFound,
    Busy,
    Unsupported,
    Other,
}

impl CameraErrorKind {
    /// Classify a media error by its DOM exception name
    pub fn from_error_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" => Self::NotFound,
            "NotReadableError" | "AbortError" => Self::Busy,
            "NotSupportedError" => Self::Unsupported,
            _ => Self::Other,
        }
    }

    /// Message suitable for showing to the user
    pub fn user_message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was denied; allow camera access in the browser settings"
            }
            Self::NotFound => "No camera device was found",
            Self::Busy => "The camera is in use by another application",
            Self::Unsupported => "This browser does not support the camera",
            Self::Other => "Camera initialization failed",
        }
    }
}

/// Failure reported by the media layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaError {
    pub name: String,
    pub message: String,
}

impl From<MediaError> for Error {
    fn from(e: MediaError) -> Self {
        let kind = CameraErrorKind::from_error_name(&e.name);
        let message = match kind {
            CameraErrorKind::Other if !e.message.is_empty() => {
                format!("{}: {}", kind.user_message(), e.message)
            }
            _ => kind.user_message().to_string(),
        };
        Error::Camera { kind, message }
    }
}

/// Capture settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Ideal frame width
    pub width: u32,
    /// Ideal frame height
    pub height: u32,
    /// JPEG quality in `0.0..=1.0`
    pub quality: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            width: CAMERA_DEFAULT_WIDTH,
            height: CAMERA_DEFAULT_HEIGHT,
            quality: CAMERA_DEFAULT_QUALITY,
        }
    }
}

/// An acquired video stream
pub trait MediaStream: Send + Sync {
    /// Stop every track
    fn stop(&mut self);

    /// Grab the current frame as a `data:image/jpeg;base64,...` URL
    fn capture_jpeg(&mut self, quality: f32) -> std::result::Result<String, MediaError>;
}

/// Access to camera devices
#[async_trait]
pub trait MediaDevices: Send + Sync {
    fn is_supported(&self) -> bool;

    async fn open_video(
        &self,
        width: u32,
        height: u32,
    ) -> std::result::Result<Box<dyn MediaStream>, MediaError>;
}

/// Exclusive owner of the active camera stream
pub struct CameraSession<D> {
    devices: D,
    defaults: CameraOptions,
    active: Option<(Box<dyn MediaStream>, CameraOptions)>,
    image: Option<String>,
}

impl<D: MediaDevices> CameraSession<D> {
    pub fn new(devices: D, defaults: CameraOptions) -> Self {
        Self {
            devices,
            defaults,
            active: None,
            image: None,
        }
    }

    /// Acquire the camera, stopping any stream already held
    pub async fn start(&mut self, options: Option<CameraOptions>) -> Result<()> {
        self.stop();

        if !self.devices.is_supported() {
            let kind = CameraErrorKind::Unsupported;
            return Err(Error::Camera {
                kind,
                message: kind.user_message().to_string(),
            });
        }

        let options = options.unwrap_or(self.defaults);
        let stream = self.devices.open_video(options.width, options.height).await?;
        tracing::debug!("camera started at {}x{}", options.width, options.height);
        self.active = Some((stream, options));
        Ok(())
    }

    /// Release the stream; no-op when idle
    pub fn stop(&mut self) {
        if let Some((mut stream, _)) = self.active.take() {
            stream.stop();
            tracing::debug!("camera stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Take a photo from the live stream
    pub fn capture(&mut self) -> Result<&str> {
        let Some((stream, options)) = self.active.as_mut() else {
            return Err(Error::invalid("Camera is not started"));
        };

        let data_url = stream.capture_jpeg(options.quality)?;
        Ok(self.image.insert(data_url).as_str())
    }

    /// Last captured photo
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn retake(&mut self) {
        self.image = None;
    }
}

impl<D> Drop for CameraSession<D> {
    fn drop(&mut self) {
        if let Some((mut stream, _)) = self.active.take() {
            stream.stop();
        }
    }
}

/// Split a base64 data URL into its MIME type and decoded bytes
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| Error::invalid("not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::invalid("data URL has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::invalid("data URL is not base64 encoded"))?;

    let bytes = STANDARD.decode(payload).map_err(|e| Error::Invalid {
        message: format!("Invalid base64 payload: {e}"),
    })?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeStream {
        stops: Arc<AtomicU32>,
    }

    impl MediaStream for FakeStream {
        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn capture_jpeg(&mut self, quality: f32) -> std::result::Result<String, MediaError> {
            Ok(format!(
                "data:image/jpeg;base64,{}",
                STANDARD.encode(format!("q={quality}"))
            ))
        }
    }

    struct FakeDevices {
        opened: AtomicU32,
        stops: Arc<AtomicU32>,
        fail_with: Option<&'static str>,
    }

    impl FakeDevices {
        fn new() -> Self {
            Self {
                opened: AtomicU32::new(0),
                stops: Arc::new(AtomicU32::new(0)),
                fail_with: None,
            }
        }
    }

    #[async_trait]
    impl MediaDevices for FakeDevices {
        fn is_supported(&self) -> bool {
            true
        }

        async fn open_video(
            &self,
            _width: u32,
            _height: u32,
        ) -> std::result::Result<Box<dyn MediaStream>, MediaError> {
            if let Some(name) = self.fail_with {
                return Err(MediaError {
                    name: name.to_string(),
                    message: "denied".to_string(),
                });
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeStream {
                stops: self.stops.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_restart_stops_previous_stream() {
        let devices = FakeDevices::new();
        let stops = devices.stops.clone();
        let mut session = CameraSession::new(devices, CameraOptions::default());

        session.start(None).await.expect("first");
        session.start(None).await.expect("second");
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        drop(session);
        assert_eq!(stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capture_and_decode() {
        let mut session = CameraSession::new(FakeDevices::new(), CameraOptions::default());
        assert!(session.capture().is_err());

        session.start(None).await.expect("start");
        let url = session.capture().expect("capture").to_string();
        let (mime, bytes) = decode_data_url(&url).expect("decode");

        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"q=0.8");
        session.retake();
        assert!(session.image().is_none());
    }

    #[tokio::test]
    async fn test_permission_error_classified() {
        let mut devices = FakeDevices::new();
        devices.fail_with = Some("NotAllowedError");
        let mut session = CameraSession::new(devices, CameraOptions::default());

        match session.start(None).await {
            Err(Error::Camera { kind, .. }) => assert_eq!(kind, CameraErrorKind::PermissionDenied),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!session.is_active());
    }

    #[test]
    fn test_error_names() {
        assert_eq!(CameraErrorKind::from_error_name("AbortError"), CameraErrorKind::Busy);
        assert_eq!(CameraErrorKind::from_error_name("NotFoundError"), CameraErrorKind::NotFound);
        assert_eq!(CameraErrorKind::from_error_name("TypeError"), CameraErrorKind::Other);
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("https://x/y.jpg").is_err());
    }
}
