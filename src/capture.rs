//! PNG snapshots and GIF recordings of the field.

use crate::braille::{draw_frame, DotCanvas, DrawStyle};
use crate::camera::Camera;
use crate::color::{to_bytes, BACKGROUND};
use crate::error::CaptureError;
use crate::simulation::FrameView;
use glam::Vec2;
use image::{Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

pub const SNAPSHOT_SIZE: (u32, u32) = (1280, 720);
pub const RECORDING_SIZE: (u32, u32) = (480, 270);
/// Frames kept per recording (about ten seconds at the capture rate)
pub const MAX_RECORDING_FRAMES: usize = 150;
/// GIF frame delay in hundredths of a second
const FRAME_DELAY_CS: u16 = 7;

fn image_style(height: u32) -> DrawStyle {
    DrawStyle {
        particle_scale: 0.15,
        max_radius: (height as f32 / 90.0).max(1.0),
        show_stars: true,
    }
}

/// Rasterize a frame into an RGBA image of the given size
pub fn render_rgba(frame: &FrameView<'_>, camera: &Camera, stars: &[Vec2], width: u32, height: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    let mut camera = camera.clone();
    camera.set_aspect(width as f32 / height as f32);

    let mut canvas = DotCanvas::new(width as usize, height as usize);
    draw_frame(&mut canvas, frame, &camera, stars, image_style(height));

    let [r, g, b] = to_bytes(BACKGROUND);
    let mut image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if let Some((color, _)) = canvas.get(x as usize, y as usize) {
            let [r, g, b] = to_bytes(color);
            *pixel = Rgba([r, g, b, 255]);
        }
    }
    image
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), CaptureError> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Collects frames in memory and encodes them as a looping GIF
pub struct GifRecorder {
    width: u32,
    height: u32,
    frames: Vec<RgbaImage>,
    max_frames: usize,
}

impl GifRecorder {
    pub fn new(width: u32, height: u32, max_frames: usize) -> Self {
        Self {
            width: width.clamp(1, u16::MAX as u32),
            height: height.clamp(1, u16::MAX as u32),
            frames: Vec::new(),
            max_frames,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.max_frames
    }

    /// Add a frame. Frames of the wrong size or past the cap are dropped.
    /// Returns true if the frame was kept.
    pub fn push(&mut self, frame: RgbaImage) -> bool {
        if self.is_full() || frame.width() != self.width || frame.height() != self.height {
            return false;
        }
        self.frames.push(frame);
        true
    }

    /// Encode every collected frame to `path`. Returns the frame count.
    pub fn finish(self, path: &Path) -> Result<usize, CaptureError> {
        if self.frames.is_empty() {
            return Err(CaptureError::Empty);
        }
        let (w, h) = (self.width as u16, self.height as u16);
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = gif::Encoder::new(file, w, h, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        let count = self.frames.len();
        for image in self.frames {
            let mut pixels = image.into_raw();
            let mut frame = gif::Frame::from_rgba_speed(w, h, &mut pixels, 10);
            frame.delay = FRAME_DELAY_CS;
            encoder.write_frame(&frame)?;
        }
        info!(path = %path.display(), frames = count, "recording saved");
        Ok(count)
    }
}
