use image::RgbImage;
use tracing::warn;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use super::camera::{CameraError, FrameSource};

/// Video4Linux capture device. The mmap stream is the only track; dropping it
/// turns streaming off.
pub struct V4lSource {
    path: String,
    stream: Option<Stream<'static>>,
    width: u32,
    height: u32,
    fourcc: FourCC,
}

impl V4lSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stream: None,
            width: 0,
            height: 0,
            fourcc: FourCC::new(b"RGB3"),
        }
    }
}

impl FrameSource for V4lSource {
    fn start(&mut self) -> Result<(), CameraError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let device = Device::with_path(&self.path)
            .map_err(|err| CameraError::Unavailable(format!("{}: {}", self.path, err)))?;
        let mut format = device
            .format()
            .map_err(|err| CameraError::Unavailable(err.to_string()))?;
        let rgb = Format::new(format.width, format.height, FourCC::new(b"RGB3"));
        format = device.set_format(&rgb).unwrap_or(format);
        if format.fourcc != FourCC::new(b"RGB3") {
            let yuyv = Format::new(format.width, format.height, FourCC::new(b"YUYV"));
            format = device.set_format(&yuyv).unwrap_or(format);
        }
        let stream = Stream::with_buffers(&device, Type::VideoCapture, 4)
            .map_err(|err| CameraError::Unavailable(err.to_string()))?;

        self.width = format.width;
        self.height = format.height;
        self.fourcc = format.fourcc;
        self.stream = Some(stream);
        Ok(())
    }

    fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CameraError::Capture("stream is not running".to_string()))?;
        let (data, _meta) = stream
            .next()
            .map_err(|err| CameraError::Capture(err.to_string()))?;

        let rgb = if self.fourcc == FourCC::new(b"RGB3") {
            data.to_vec()
        } else if self.fourcc == FourCC::new(b"YUYV") {
            yuyv_to_rgb(self.width, self.height, data)?
        } else {
            warn!("Unexpected pixel format {:?}; passing frame through", self.fourcc);
            data.to_vec()
        };

        let expected = (self.width * self.height * 3) as usize;
        if rgb.len() < expected {
            return Err(CameraError::Capture(format!(
                "short frame: got {} bytes, expected {}",
                rgb.len(),
                expected
            )));
        }
        let mut rgb = rgb;
        rgb.truncate(expected);
        RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| CameraError::Capture("failed to build frame buffer".to_string()))
    }

    fn stop(&mut self) {
        self.stream.take();
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.stream.is_some())
    }
}

fn yuyv_to_rgb(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, CameraError> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        return Err(CameraError::Capture("short YUYV buffer".to_string()));
    }
    let mut out = Vec::with_capacity((width * height * 3) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0] as f32, chunk[2] as f32] {
            out.push(clamp(y + 1.402 * v));
            out.push(clamp(y - 0.344136 * u - 0.714136 * v));
            out.push(clamp(y + 1.772 * u));
        }
    }
    Ok(out)
}

fn clamp(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}
