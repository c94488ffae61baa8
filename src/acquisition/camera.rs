use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::{EncodedImage, ImagePayload};

static MOBILE_USER_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)android|iphone|ipad|ipod|blackberry|iemobile|opera mini|mobile")
        .expect("valid mobile user-agent pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Open the device in-page and snapshot a frame on demand.
    LiveFeed,
    /// Hand off to the platform's own camera picker.
    NativePicker,
}

pub fn capture_mode_for(user_agent: &str) -> CaptureMode {
    if MOBILE_USER_AGENT.is_match(user_agent) {
        CaptureMode::NativePicker
    } else {
        CaptureMode::LiveFeed
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Unable to access camera: {0}")]
    Unavailable(String),
    #[error("Failed to capture frame: {0}")]
    Capture(String),
    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

pub trait FrameSource {
    /// Acquires the device and starts its tracks.
    fn start(&mut self) -> Result<(), CameraError>;

    fn grab_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Stops every track. Must be safe to call when nothing is running.
    fn stop(&mut self);

    fn active_tracks(&self) -> usize;
}

/// An open capture view. The source is stopped when the session captures,
/// is cancelled, or is dropped, whichever comes first.
pub struct CaptureSession<'a, S: FrameSource> {
    source: &'a mut S,
    released: bool,
}

impl<'a, S: FrameSource> CaptureSession<'a, S> {
    pub fn open(source: &'a mut S) -> Result<Self, CameraError> {
        if let Err(err) = source.start() {
            source.stop();
            return Err(err);
        }
        info!("Camera opened with {} active track(s)", source.active_tracks());
        Ok(Self {
            source,
            released: false,
        })
    }

    pub fn preview_frame(&mut self) -> Result<RgbImage, CameraError> {
        self.source.grab_frame()
    }

    /// Snapshots the current frame at its native size and releases the
    /// device before encoding.
    pub fn capture(mut self) -> Result<EncodedImage, CameraError> {
        let frame = self.source.grab_frame();
        self.release();
        encode_frame(&frame?)
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.source.stop();
        self.released = true;
        debug!(
            "Camera released; {} track(s) still active",
            self.source.active_tracks()
        );
    }
}

impl<S: FrameSource> Drop for CaptureSession<'_, S> {
    fn drop(&mut self) {
        self.release();
    }
}

pub fn encode_frame(frame: &RgbImage) -> Result<EncodedImage, CameraError> {
    let mut buffer = Cursor::new(Vec::new());
    frame
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|err| CameraError::Encode(err.to_string()))?;
    ImagePayload::new(buffer.into_inner(), "image/jpeg")
        .accept()
        .ok_or_else(|| CameraError::Encode("encoded frame was not an image".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use image::{GenericImageView, Rgb};

    struct FakeCamera {
        frame: RgbImage,
        tracks: usize,
        starts: usize,
        stops: usize,
        deny: bool,
        fail_grab: bool,
    }

    impl FakeCamera {
        fn new(width: u32, height: u32) -> Self {
            Self {
                frame: RgbImage::from_pixel(width, height, Rgb([200, 120, 40])),
                tracks: 0,
                starts: 0,
                stops: 0,
                deny: false,
                fail_grab: false,
            }
        }
    }

    impl FrameSource for FakeCamera {
        fn start(&mut self) -> Result<(), CameraError> {
            if self.deny {
                return Err(CameraError::Unavailable("permission denied".to_string()));
            }
            self.starts += 1;
            self.tracks = 2;
            Ok(())
        }

        fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
            if self.tracks == 0 {
                return Err(CameraError::Capture("stream is not running".to_string()));
            }
            if self.fail_grab {
                return Err(CameraError::Capture("device went away".to_string()));
            }
            Ok(self.frame.clone())
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.tracks = 0;
        }

        fn active_tracks(&self) -> usize {
            self.tracks
        }
    }

    #[test]
    fn capture_releases_tracks_and_keeps_frame_size() {
        let mut camera = FakeCamera::new(64, 48);
        let session = CaptureSession::open(&mut camera).unwrap();
        let encoded = session.capture().unwrap();
        assert_eq!(camera.active_tracks(), 0);
        assert_eq!(camera.stops, 1);

        assert!(!encoded.as_str().contains(','));
        let bytes = general_purpose::STANDARD.decode(encoded.as_str()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn cancel_releases_tracks() {
        let mut camera = FakeCamera::new(8, 8);
        let mut session = CaptureSession::open(&mut camera).unwrap();
        assert!(session.preview_frame().is_ok());
        session.cancel();
        assert_eq!(camera.active_tracks(), 0);
        assert_eq!(camera.stops, 1);
    }

    #[test]
    fn drop_releases_tracks_once() {
        let mut camera = FakeCamera::new(8, 8);
        {
            let _session = CaptureSession::open(&mut camera).unwrap();
        }
        assert_eq!(camera.active_tracks(), 0);
        assert_eq!(camera.stops, 1);
    }

    #[test]
    fn failed_grab_still_releases_tracks() {
        let mut camera = FakeCamera::new(8, 8);
        camera.fail_grab = true;
        let session = CaptureSession::open(&mut camera).unwrap();
        assert!(matches!(session.capture(), Err(CameraError::Capture(_))));
        assert_eq!(camera.active_tracks(), 0);
    }

    #[test]
    fn denied_device_surfaces_notice() {
        let mut camera = FakeCamera::new(8, 8);
        camera.deny = true;
        let err = CaptureSession::open(&mut camera).err().expect("open fails");
        assert_eq!(err.to_string(), "Unable to access camera: permission denied");
        assert_eq!(camera.active_tracks(), 0);
        assert_eq!(camera.starts, 0);
    }

    #[test]
    fn mobile_agents_use_native_picker() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        let pixel = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Mobile Safari/537.36";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";
        assert_eq!(capture_mode_for(iphone), CaptureMode::NativePicker);
        assert_eq!(capture_mode_for(pixel), CaptureMode::NativePicker);
        assert_eq!(capture_mode_for(desktop), CaptureMode::LiveFeed);
        assert_eq!(capture_mode_for(""), CaptureMode::LiveFeed);
    }
}
