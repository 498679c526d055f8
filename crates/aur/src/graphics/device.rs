use crate::video::PixelFormat;
use glam::UVec2;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("texture `{name}` has a zero sized dimension ({}x{})", .size.x, .size.y)]
    EmptyTexture { name: String, size: UVec2 },
    #[error(
        "texture `{name}` is too large ({}x{}, the device allows up to {max}x{max})",
        .size.x,
        .size.y
    )]
    TextureTooLarge { name: String, size: UVec2, max: u32 },
    #[error(
        "out of texture memory while allocating `{name}` \
         ({requested} bytes requested, {available} available)"
    )]
    OutOfMemory {
        name: String,
        requested: u64,
        available: u64,
    },
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("couldn't open the graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Describes a 2D texture to be allocated.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub name: String,
    pub size: UVec2,
    pub mip_levels: u32,
    pub format: PixelFormat,
}

impl TextureDescriptor {
    /// A single mip texture whose contents are never persisted, like a video frame target.
    pub fn transient(name: impl Into<String>, size: UVec2, format: PixelFormat) -> Self {
        Self {
            name: name.into(),
            size,
            mip_levels: 1,
            format,
        }
    }

    /// Size of the texture's mip 0 in bytes.
    pub fn byte_size(&self) -> u64 {
        self.size.x as u64 * self.size.y as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// A rectangular texture update window. The source origin addresses the uploaded buffer, the
/// destination origin addresses the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRegion {
    pub src_x: u32,
    pub src_y: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextureRegion {
    /// A region covering `[0, size.x) × [0, size.y)`, both origins at `(0, 0)`.
    pub fn whole(size: UVec2) -> Self {
        Self {
            src_x: 0,
            src_y: 0,
            dst_x: 0,
            dst_y: 0,
            width: size.x,
            height: size.y,
        }
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// A graphics backend, capable of allocating textures.
///
/// Devices are shared between the logic thread (allocations) and the render thread (updates).
pub trait GpuDevice: Send + Sync {
    fn label(&self) -> &str;

    fn create_texture_2d(
        &self,
        desc: &TextureDescriptor,
    ) -> Result<Arc<dyn GpuTexture>, GraphicsError>;

    /// Submits texture updates recorded since the last flush. Called by the render thread once
    /// per frame, after all render commands ran. Backends that write immediately can ignore it.
    fn flush(&self) {}
}

/// Backend side of a texture. Only the render thread is supposed to call
/// [`GpuTexture::update_region_2d`].
pub trait GpuTexture: Send + Sync {
    /// Index of the most detailed mip level currently resident in memory. Backends that stream
    /// mips in may report a value larger than 0 until the top mip is loaded.
    fn first_resident_mip(&self) -> u32;

    /// Copies `region` of `data` into the given mip level. `source_pitch` is the length of a single
    /// row of `data` in bytes.
    fn update_region_2d(
        &self,
        mip_level: u32,
        region: &TextureRegion,
        source_pitch: u32,
        data: &[u8],
    );
}

/// Checks that an update stays within both the source buffer and the destination texture.
pub(super) fn region_fits(
    texture_size: UVec2,
    region: &TextureRegion,
    source_pitch: u32,
    bytes_per_pixel: u32,
    data_len: usize,
) -> bool {
    if region.width == 0 || region.height == 0 {
        return true;
    }

    let dst_fits = region.dst_x as u64 + region.width as u64 <= texture_size.x as u64
        && region.dst_y as u64 + region.height as u64 <= texture_size.y as u64;

    let row_bytes = (region.src_x as u64 + region.width as u64) * bytes_per_pixel as u64;
    let last_row = (region.src_y as u64 + region.height as u64 - 1) * source_pitch as u64;
    let src_fits = row_bytes <= source_pitch as u64 && last_row + row_bytes <= data_len as u64;

    dst_fits && src_fits
}
