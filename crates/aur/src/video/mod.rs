//! Video capture driver contract
//!
//! The engine doesn't know how frames are captured or decoded. Everything it needs from a capture
//! device is expressed by the [`VideoDriver`] trait: the camera's intrinsic parameters, a "new
//! frame available" flag and a way to take the latest decoded frame.
//!
//! Drivers are shared between threads. The scene thread talks to them once, when a
//! [`crate::screen::VideoScreen`] is attached, while the render thread polls them every frame.

use crate::scene::SceneHandle;
use aur_utils::math::Degrees;
use glam::UVec2;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[doc(inline)]
pub use test_pattern::*;
mod test_pattern;

/// Pixel layout of decoded frames. Both layouts are 8 bits per channel, 4 channels, packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Bgra8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> u32 {
        4
    }
}

/// Intrinsic parameters of the physical camera behind a driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// Resolution of produced frames, in pixels.
    pub resolution: UVec2,
    /// Horizontal field of view.
    pub fov_horizontal: Degrees,
    /// Width to height ratio of the camera's view. It doesn't have to match the resolution's
    /// ratio, cameras with non-square pixels exist.
    pub aspect_ratio: f32,
    pub pixel_format: PixelFormat,
}

impl CameraIntrinsics {
    /// Amount of bytes in a single row of a frame.
    #[inline]
    pub fn row_pitch(&self) -> u32 {
        self.resolution.x * self.pixel_format.bytes_per_pixel()
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame buffer holds {actual} bytes, {expected} expected for a {width}x{height} frame")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A single decoded frame. Frames are immutable once created and are handed out by drivers as
/// [`Arc`]s, so a driver can keep its own reference while the renderer copies the pixels out.
pub struct VideoFrame {
    size: UVec2,
    format: PixelFormat,
    sequence: u64,
    data: Box<[u8]>,
}

impl VideoFrame {
    /// Wraps a packed pixel buffer. Rows must be exactly `width * 4` bytes long, no padding.
    pub fn new(
        size: UVec2,
        format: PixelFormat,
        sequence: u64,
        data: impl Into<Box<[u8]>>,
    ) -> Result<Self, FrameError> {
        let data = data.into();
        let expected = size.x as usize * size.y as usize * format.bytes_per_pixel() as usize;

        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                width: size.x,
                height: size.y,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            size,
            format,
            sequence,
            data,
        })
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Index of this frame within the driver's stream.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Length of a single row in bytes.
    #[inline]
    pub fn pitch(&self) -> u32 {
        self.size.x * self.format.bytes_per_pixel()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Capture driver contract.
///
/// ## Threading
///  * [`Self::set_scene`] and [`Self::intrinsics`] are called from the scene thread.
///  * [`Self::has_new_frame`] and [`Self::acquire_frame`] are called from the render thread,
///    possibly while the driver's own capture thread is producing frames.
pub trait VideoDriver: Send + Sync {
    /// Informs the driver about the scene it is displayed in. Called once per attach.
    fn set_scene(&self, scene: &SceneHandle);

    /// Returns the camera's intrinsic parameters. Must not change while the driver is attached.
    fn intrinsics(&self) -> CameraIntrinsics;

    /// Whether a frame that hasn't been acquired yet is available.
    fn has_new_frame(&self) -> bool;

    /// Takes the latest frame and clears the availability flag, so that the same frame isn't
    /// uploaded twice. Returns [`None`] once the driver has been shut down.
    fn acquire_frame(&self) -> Option<Arc<VideoFrame>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_is_validated() {
        let ok = VideoFrame::new(UVec2::new(4, 2), PixelFormat::Rgba8, 7, vec![0u8; 32]).unwrap();
        assert_eq!(ok.pitch(), 16);
        assert_eq!(ok.sequence(), 7);

        let err = VideoFrame::new(UVec2::new(4, 2), PixelFormat::Bgra8, 0, vec![0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SizeMismatch {
                expected: 32,
                actual: 31,
                ..
            }
        ));
    }

    #[test]
    fn intrinsics_pitch() {
        let intrinsics = CameraIntrinsics {
            resolution: UVec2::new(640, 480),
            fov_horizontal: Degrees(60.0),
            aspect_ratio: 4.0 / 3.0,
            pixel_format: PixelFormat::Bgra8,
        };
        assert_eq!(intrinsics.row_pitch(), 2560);
    }
}
