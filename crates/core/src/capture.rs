//! Camera capture session.
//!
//! A small state machine over a platform camera API:
//!
//! ```text
//!   Idle ──start──▶ Previewing ──capture──▶ Captured
//!    ▲                 │  │                    │
//!    └──cancel/error───┘  └──start (restart)   └──reset──▶ Idle
//! ```
//!
//! The platform side is abstracted by [`MediaDevices`] and [`MediaStream`].
//! The session owns the live stream and stops every track whenever it leaves
//! `Previewing`, including when the session itself is dropped, so outside
//! `Previewing` there are no active tracks.

use crate::types::{ImageError, IngredientImage};

/// Errors raised while acquiring or using the camera.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user (or platform policy) refused camera access.
    #[error("camera access was denied")]
    PermissionDenied,
    /// No camera, or the camera could not be opened.
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// A frame could not be grabbed from the stream.
    #[error("failed to capture frame: {0}")]
    Snapshot(String),
    /// `capture` was called without a live preview.
    #[error("camera is not previewing")]
    NotPreviewing,
    /// The grabbed frame was not a usable image.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Which camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Front camera.
    User,
    /// Rear camera.
    Environment,
}

/// Constraints passed to [`MediaDevices::get_user_media`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl VideoConstraints {
    /// Rear camera on mobile devices, front camera elsewhere; ideal 1280x720.
    #[must_use]
    pub const fn for_device(is_mobile: bool) -> Self {
        Self {
            facing_mode: if is_mobile {
                FacingMode::Environment
            } else {
                FacingMode::User
            },
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// A point on the preview the user tapped, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapPoint {
    pub x: f64,
    pub y: f64,
}

/// How a frame is grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
    /// Where to draw a marker on the captured frame, if anywhere.
    pub marker: Option<TapPoint>,
}

impl SnapshotOptions {
    pub const DEFAULT_QUALITY: f32 = 0.8;
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            quality: Self::DEFAULT_QUALITY,
            marker: None,
        }
    }
}

/// A live camera stream.
pub trait MediaStream {
    /// Encode the current frame as a JPEG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Snapshot`] if no frame could be read.
    fn snapshot(&mut self, options: &SnapshotOptions) -> Result<String, CaptureError>;

    /// Stop every track of the stream.
    fn stop_all_tracks(&mut self);

    /// Number of tracks still running.
    fn active_tracks(&self) -> usize;
}

/// Platform camera access.
pub trait MediaDevices {
    type Stream: MediaStream;

    /// Request a video stream.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::PermissionDenied`] or
    /// [`CaptureError::Unavailable`].
    fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Self::Stream, CaptureError>;
}

/// Observable state of a [`CaptureSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Previewing,
    Captured,
}

enum Inner<S> {
    Idle,
    Previewing(S),
    Captured(IngredientImage),
}

/// One camera capture flow.
pub struct CaptureSession<D: MediaDevices> {
    devices: D,
    constraints: VideoConstraints,
    state: Inner<D::Stream>,
}

impl<D: MediaDevices> CaptureSession<D> {
    #[must_use]
    pub const fn new(devices: D, is_mobile: bool) -> Self {
        Self {
            devices,
            constraints: VideoConstraints::for_device(is_mobile),
            state: Inner::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> CaptureState {
        match self.state {
            Inner::Idle => CaptureState::Idle,
            Inner::Previewing(_) => CaptureState::Previewing,
            Inner::Captured(_) => CaptureState::Captured,
        }
    }

    #[must_use]
    pub const fn constraints(&self) -> &VideoConstraints {
        &self.constraints
    }

    /// Tracks currently running; zero unless previewing.
    #[must_use]
    pub fn active_tracks(&self) -> usize {
        match &self.state {
            Inner::Previewing(stream) => stream.active_tracks(),
            _ => 0,
        }
    }

    /// The captured image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&IngredientImage> {
        match &self.state {
            Inner::Captured(image) => Some(image),
            _ => None,
        }
    }

    /// Open the camera and start previewing.
    ///
    /// Any existing stream is stopped first and any captured image dropped.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error; the session is left `Idle`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.stop();
        let stream = self.devices.get_user_media(&self.constraints)?;
        self.state = Inner::Previewing(stream);
        Ok(())
    }

    /// Grab a frame and stop the camera.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotPreviewing`] outside `Previewing`, or the
    /// snapshot/image error. On error the session is left `Idle`.
    pub fn capture(&mut self, marker: Option<TapPoint>) -> Result<&IngredientImage, CaptureError> {
        if !matches!(self.state, Inner::Previewing(_)) {
            return Err(CaptureError::NotPreviewing);
        }
        let Inner::Previewing(mut stream) = std::mem::replace(&mut self.state, Inner::Idle) else {
            return Err(CaptureError::NotPreviewing);
        };

        let options = SnapshotOptions {
            marker,
            ..SnapshotOptions::default()
        };
        let frame = stream.snapshot(&options);
        stream.stop_all_tracks();

        let image = IngredientImage::parse(&frame?)?;
        self.state = Inner::Captured(image);
        self.image().ok_or(CaptureError::NotPreviewing)
    }

    /// Stop previewing without capturing.
    pub fn cancel(&mut self) {
        if matches!(self.state, Inner::Previewing(_)) {
            self.stop();
        }
    }

    /// Back to `Idle`, dropping any captured image.
    pub fn reset(&mut self) {
        self.stop();
    }

    /// Take the captured image out, leaving the session `Idle`.
    pub fn take_image(&mut self) -> Option<IngredientImage> {
        match std::mem::replace(&mut self.state, Inner::Idle) {
            Inner::Captured(image) => Some(image),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn stop(&mut self) {
        if let Inner::Previewing(mut stream) = std::mem::replace(&mut self.state, Inner::Idle) {
            stream.stop_all_tracks();
        }
    }
}

impl<D: MediaDevices> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    const FRAME: &str = "data:image/jpeg;base64,/9j/4AAQ";

    struct FakeStream {
        live: Rc<Cell<usize>>,
        running: usize,
        frame: Result<String, CaptureError>,
    }

    impl MediaStream for FakeStream {
        fn snapshot(&mut self, _options: &SnapshotOptions) -> Result<String, CaptureError> {
            self.frame.clone()
        }

        fn stop_all_tracks(&mut self) {
            self.live.set(self.live.get() - self.running);
            self.running = 0;
        }

        fn active_tracks(&self) -> usize {
            self.running
        }
    }

    #[derive(Default)]
    struct FakeDevices {
        live: Rc<Cell<usize>>,
        deny: bool,
        broken_frame: bool,
        requested: Vec<VideoConstraints>,
    }

    impl MediaDevices for FakeDevices {
        type Stream = FakeStream;

        fn get_user_media(
            &mut self,
            constraints: &VideoConstraints,
        ) -> Result<FakeStream, CaptureError> {
            self.requested.push(*constraints);
            if self.deny {
                return Err(CaptureError::PermissionDenied);
            }
            self.live.set(self.live.get() + 2);
            Ok(FakeStream {
                live: Rc::clone(&self.live),
                running: 2,
                frame: if self.broken_frame {
                    Err(CaptureError::Snapshot("no frame".into()))
                } else {
                    Ok(FRAME.to_owned())
                },
            })
        }
    }

    fn session(devices: FakeDevices) -> (CaptureSession<FakeDevices>, Rc<Cell<usize>>) {
        let live = Rc::clone(&devices.live);
        (CaptureSession::new(devices, true), live)
    }

    #[test]
    fn test_constraints_follow_device() {
        assert_eq!(
            VideoConstraints::for_device(true).facing_mode,
            FacingMode::Environment
        );
        let desktop = VideoConstraints::for_device(false);
        assert_eq!(desktop.facing_mode, FacingMode::User);
        assert_eq!((desktop.ideal_width, desktop.ideal_height), (1280, 720));
    }

    #[test]
    fn test_capture_stops_tracks() {
        let (mut s, live) = session(FakeDevices::default());
        s.start().unwrap();
        assert_eq!(s.state(), CaptureState::Previewing);
        assert_eq!(live.get(), 2);

        let image = s.capture(None).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(s.state(), CaptureState::Captured);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_cancel_stops_tracks() {
        let (mut s, live) = session(FakeDevices::default());
        s.start().unwrap();
        s.cancel();
        assert_eq!(s.state(), CaptureState::Idle);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_failed_capture_stops_tracks() {
        let (mut s, live) = session(FakeDevices {
            broken_frame: true,
            ..FakeDevices::default()
        });
        s.start().unwrap();
        assert!(matches!(s.capture(None), Err(CaptureError::Snapshot(_))));
        assert_eq!(s.state(), CaptureState::Idle);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_restart_stops_previous_stream() {
        let (mut s, live) = session(FakeDevices::default());
        s.start().unwrap();
        s.start().unwrap();
        assert_eq!(live.get(), 2);
        assert_eq!(s.active_tracks(), 2);
    }

    #[test]
    fn test_drop_stops_tracks() {
        let (mut s, live) = session(FakeDevices::default());
        s.start().unwrap();
        drop(s);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_permission_denied_leaves_idle() {
        let (mut s, live) = session(FakeDevices {
            deny: true,
            ..FakeDevices::default()
        });
        assert_eq!(s.start(), Err(CaptureError::PermissionDenied));
        assert_eq!(s.state(), CaptureState::Idle);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_capture_requires_preview() {
        let (mut s, _) = session(FakeDevices::default());
        assert!(matches!(s.capture(None), Err(CaptureError::NotPreviewing)));

        s.start().unwrap();
        s.capture(None).unwrap();
        assert!(matches!(s.capture(None), Err(CaptureError::NotPreviewing)));
        assert!(s.image().is_some());
    }

    #[test]
    fn test_reset_and_take_image() {
        let (mut s, _) = session(FakeDevices::default());
        s.start().unwrap();
        s.capture(Some(TapPoint { x: 10.0, y: 20.0 })).unwrap();
        s.reset();
        assert!(s.image().is_none());
        assert_eq!(s.state(), CaptureState::Idle);

        s.start().unwrap();
        s.capture(None).unwrap();
        let image = s.take_image().unwrap();
        assert_eq!(image.to_data_url(), FRAME);
        assert_eq!(s.state(), CaptureState::Idle);
    }
}
