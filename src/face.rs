//! Face Recognition
//!
//! Drives one recognition attempt over a [`CameraSession`]: the camera is
//! started, the user gets a countdown to position their face, then a frame is
//! captured every capture interval and handed to a [`FaceRecognizer`] until it
//! matches or the retry budget runs out. Progress is published on a
//! `tokio::sync::watch` channel for the hosting UI.

use crate::camera::{CameraErrorKind, CameraOptions, CameraSession, MediaDevices};
use crate::constants::{
    CAMERA_DEFAULT_QUALITY, FACE_CAPTURE_INTERVAL_MS, FACE_INITIAL_DELAY_MS, FACE_MAX_RETRY,
    FACE_VIDEO_HEIGHT, FACE_VIDEO_WIDTH,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Where the flow is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceStatus {
    Idle,
    Loading,
    Scanning,
    Success,
    Failed,
}

impl FaceStatus {
    /// Short label for the status indicator
    pub fn status_text(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Loading => "Initializing...",
            Self::Scanning => "Recognizing...",
            Self::Success => "Recognized",
            Self::Failed => "Recognition failed",
        }
    }

    /// Tip shown on entering the status
    pub fn default_tip(self) -> &'static str {
        match self {
            Self::Idle => "Place your face inside the circle",
            Self::Loading => "Starting the camera...",
            Self::Scanning => "Keep your face inside the frame, recognizing...",
            Self::Success => "Recognized!",
            Self::Failed => {
                "Verification failed, check the lighting or camera position and try again"
            }
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Tip for the capture about to run after `retry_count` misses
fn retry_tip(retry_count: u32) -> Option<&'static str> {
    match retry_count {
        0 => Some(FaceStatus::Scanning.default_tip()),
        1 => Some("Adjust your position slightly, trying again..."),
        2 => Some("Last attempt, make sure the lighting is good and you face the camera..."),
        _ => None,
    }
}

/// Matches a captured frame against the enrolled face
#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    /// `image` is a JPEG data URL
    async fn recognize(&self, image: &str) -> Result<bool>;
}

/// Timing and camera settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceConfig {
    /// Countdown before the first capture
    pub initial_delay: Duration,
    pub capture_interval: Duration,
    /// Misses allowed before the flow fails
    pub max_retry: u32,
    pub camera: CameraOptions,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(FACE_INITIAL_DELAY_MS),
            capture_interval: Duration::from_millis(FACE_CAPTURE_INTERVAL_MS),
            max_retry: FACE_MAX_RETRY,
            camera: CameraOptions {
                width: FACE_VIDEO_WIDTH,
                height: FACE_VIDEO_HEIGHT,
                quality: CAMERA_DEFAULT_QUALITY,
            },
        }
    }
}

/// Snapshot published on every change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceProgress {
    pub status: FaceStatus,
    pub tip: String,
    pub retry_count: u32,
}

/// One face recognition screen
pub struct FaceRecognition<D> {
    camera: CameraSession<D>,
    recognizer: Arc<dyn FaceRecognizer>,
    config: FaceConfig,
    progress: watch::Sender<FaceProgress>,
    captured: Vec<String>,
    error: Option<String>,
}

impl<D: MediaDevices> FaceRecognition<D> {
    pub fn new(camera: CameraSession<D>, recognizer: Arc<dyn FaceRecognizer>) -> Self {
        let (progress, _) = watch::channel(FaceProgress {
            status: FaceStatus::Idle,
            tip: FaceStatus::Idle.default_tip().to_string(),
            retry_count: 0,
        });
        Self {
            camera,
            recognizer,
            config: FaceConfig::default(),
            progress,
            captured: Vec::new(),
            error: None,
        }
    }

    pub fn with_config(mut self, config: FaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Follow status and tip changes
    pub fn subscribe(&self) -> watch::Receiver<FaceProgress> {
        self.progress.subscribe()
    }

    pub fn status(&self) -> FaceStatus {
        self.progress.borrow().status
    }

    pub fn tip(&self) -> String {
        self.progress.borrow().tip.clone()
    }

    pub fn retry_count(&self) -> u32 {
        self.progress.borrow().retry_count
    }

    /// Frames captured during the current attempt
    pub fn captured_images(&self) -> &[String] {
        &self.captured
    }

    /// Why the last attempt failed, when it failed on an error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera.is_active()
    }

    fn set_status(&self, status: FaceStatus, tip: impl Into<String>) {
        let tip = tip.into();
        self.progress.send_modify(|p| {
            p.status = status;
            p.tip = tip;
        });
    }

    fn set_tip(&self, tip: impl Into<String>) {
        let tip = tip.into();
        self.progress.send_modify(|p| p.tip = tip);
    }

    fn fail(&mut self, context: &str, e: &Error) {
        tracing::warn!("face recognition: {context}: {e}");
        self.error = Some(e.to_string());
        self.set_status(FaceStatus::Failed, format!("{context}, please try again"));
    }

    /// Start the camera and run until recognized or failed
    ///
    /// Dropping the future cancels the attempt; call [`stop`](Self::stop) to
    /// release the camera afterwards.
    pub async fn start(&mut self) -> FaceStatus {
        self.error = None;
        self.set_status(FaceStatus::Loading, FaceStatus::Loading.default_tip());

        if let Err(e) = self.camera.start(Some(self.config.camera)).await {
            if matches!(e, Error::Camera { kind: CameraErrorKind::Unsupported, .. }) {
                self.error = Some(e.to_string());
                self.set_status(
                    FaceStatus::Failed,
                    "Camera unavailable, check the permission or device connection",
                );
            } else {
                self.fail("Failed to start the camera", &e);
            }
            return self.status();
        }

        self.captured.clear();
        self.progress.send_modify(|p| {
            p.status = FaceStatus::Scanning;
            p.tip = "Place your face inside the circle, recognition is about to start...".into();
            p.retry_count = 0;
        });

        self.countdown().await;
        self.set_tip(FaceStatus::Scanning.default_tip());
        self.scan().await
    }

    async fn countdown(&self) {
        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.config.initial_delay {
                return;
            }
            let remaining = self.config.initial_delay - elapsed;
            let seconds = remaining.as_millis().div_ceil(1000);
            self.set_tip(format!(
                "Face the camera, recognition starts in {seconds}s..."
            ));

            // Wake when the displayed second changes
            let next = Duration::from_millis(((seconds - 1) * 1000) as u64);
            tokio::time::sleep(remaining.saturating_sub(next)).await;
        }
    }

    async fn scan(&mut self) -> FaceStatus {
        loop {
            let captured_at = Instant::now();
            if let Some(tip) = retry_tip(self.retry_count()) {
                self.set_tip(tip);
            }

            let image = match self.camera.capture().map(str::to_string) {
                Ok(image) => image,
                Err(e) => {
                    self.fail("Image capture failed", &e);
                    return FaceStatus::Failed;
                }
            };
            self.captured.push(image.clone());

            match self.recognizer.recognize(&image).await {
                Ok(true) => {
                    tracing::info!("face recognized after {} misses", self.retry_count());
                    self.set_status(FaceStatus::Success, FaceStatus::Success.default_tip());
                    return FaceStatus::Success;
                }
                Ok(false) => {
                    self.progress.send_modify(|p| p.retry_count += 1);
                    if self.retry_count() >= self.config.max_retry {
                        tracing::info!("face recognition failed after {} attempts", self.retry_count());
                        self.set_status(FaceStatus::Failed, FaceStatus::Failed.default_tip());
                        return FaceStatus::Failed;
                    }
                }
                Err(e) => {
                    self.fail("Recognition error", &e);
                    return FaceStatus::Failed;
                }
            }

            tokio::time::sleep_until(captured_at + self.config.capture_interval).await;
        }
    }

    /// Run again after a failure
    pub async fn retry(&mut self) -> Result<FaceStatus> {
        if self.status() != FaceStatus::Failed {
            return Err(Error::invalid("Face recognition can only be retried after a failure"));
        }
        Ok(self.start().await)
    }

    /// Release the camera and return to idle
    pub fn stop(&mut self) {
        self.camera.stop();
        self.set_status(FaceStatus::Idle, FaceStatus::Idle.default_tip());
    }
}

impl<D> std::fmt::Debug for FaceRecognition<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceRecognition")
            .field("progress", &*self.progress.borrow())
            .field("captured", &self.captured.len())
            .finish()
    }
}
