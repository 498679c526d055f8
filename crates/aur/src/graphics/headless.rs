use super::{
    device::region_fits, GpuDevice, GpuTexture, GraphicsError, TextureDescriptor, TextureRegion,
};
use crate::video::PixelFormat;
use glam::UVec2;
use log::*;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU32, AtomicUsize, Ordering},
    Arc, Weak,
};

/// Largest texture dimension accepted by [`HeadlessDevice`], same as wgpu's default limit.
pub const HEADLESS_MAX_DIMENSION: u32 = 8192;

/// A [`GpuDevice`] that keeps textures in system memory.
///
/// Besides being a fallback for machines without a usable adapter, it lets tests inspect what the
/// render thread did: how many textures were allocated, how many updates each one received, and
/// what pixels it ended up with.
pub struct HeadlessDevice {
    /// Upper bound on the combined size of live textures, in bytes.
    memory_budget: Option<u64>,
    allocations: AtomicUsize,
    flushes: AtomicUsize,
    textures: Mutex<Vec<Weak<HeadlessTexture>>>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            memory_budget: None,
            allocations: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            textures: Mutex::new(Vec::new()),
        }
    }

    /// Creates a device that fails allocations going over `bytes` of live texture memory.
    pub fn with_memory_budget(bytes: u64) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::new()
        }
    }

    /// Amount of successful allocations made so far, including already freed textures.
    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Acquire)
    }

    /// Amount of [`GpuDevice::flush`] calls so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }

    /// All textures that are still alive, in order of allocation.
    pub fn textures(&self) -> Vec<Arc<HeadlessTexture>> {
        self.textures
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Bytes taken by live textures.
    pub fn memory_in_use(&self) -> u64 {
        self.textures().iter().map(|t| t.byte_size()).sum()
    }
}

impl GpuDevice for HeadlessDevice {
    fn label(&self) -> &str {
        "Headless"
    }

    fn create_texture_2d(
        &self,
        desc: &TextureDescriptor,
    ) -> Result<Arc<dyn GpuTexture>, GraphicsError> {
        if desc.size.x == 0 || desc.size.y == 0 {
            return Err(GraphicsError::EmptyTexture {
                name: desc.name.clone(),
                size: desc.size,
            });
        }

        if desc.size.max_element() > HEADLESS_MAX_DIMENSION {
            return Err(GraphicsError::TextureTooLarge {
                name: desc.name.clone(),
                size: desc.size,
                max: HEADLESS_MAX_DIMENSION,
            });
        }

        let mut textures = self.textures.lock();
        textures.retain(|t| t.strong_count() > 0);

        if let Some(budget) = self.memory_budget {
            let in_use: u64 = textures
                .iter()
                .filter_map(Weak::upgrade)
                .map(|t| t.byte_size())
                .sum();
            let available = budget.saturating_sub(in_use);

            if desc.byte_size() > available {
                return Err(GraphicsError::OutOfMemory {
                    name: desc.name.clone(),
                    requested: desc.byte_size(),
                    available,
                });
            }
        }

        let texture = Arc::new(HeadlessTexture {
            name: desc.name.clone(),
            size: desc.size,
            format: desc.format,
            first_resident_mip: AtomicU32::new(0),
            uploads: AtomicUsize::new(0),
            last_update: Mutex::new(None),
            pixels: Mutex::new(vec![0; desc.byte_size() as usize]),
        });

        textures.push(Arc::downgrade(&texture));
        self.allocations.fetch_add(1, Ordering::AcqRel);
        Ok(texture)
    }

    fn flush(&self) {
        // Updates are applied right away, there's nothing to submit
        self.flushes.fetch_add(1, Ordering::AcqRel);
    }
}

/// A texture living in system memory. Only mip 0 is stored.
pub struct HeadlessTexture {
    name: String,
    size: UVec2,
    format: PixelFormat,
    first_resident_mip: AtomicU32,
    uploads: AtomicUsize,
    last_update: Mutex<Option<(TextureRegion, u32)>>,
    pixels: Mutex<Vec<u8>>,
}

impl HeadlessTexture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn byte_size(&self) -> u64 {
        self.size.x as u64 * self.size.y as u64 * self.format.bytes_per_pixel() as u64
    }

    /// Amount of applied region updates.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::Acquire)
    }

    /// The region and source pitch of the most recent update.
    pub fn last_update(&self) -> Option<(TextureRegion, u32)> {
        *self.last_update.lock()
    }

    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.lock().clone()
    }

    /// Simulates mip streaming, see [`GpuTexture::first_resident_mip`].
    pub fn set_first_resident_mip(&self, mip: u32) {
        self.first_resident_mip.store(mip, Ordering::Release);
    }
}

impl GpuTexture for HeadlessTexture {
    fn first_resident_mip(&self) -> u32 {
        self.first_resident_mip.load(Ordering::Acquire)
    }

    fn update_region_2d(
        &self,
        mip_level: u32,
        region: &TextureRegion,
        source_pitch: u32,
        data: &[u8],
    ) {
        if mip_level != 0 {
            warn!(
                "Headless texture `{}` only stores mip 0, ignoring update of mip {mip_level}",
                self.name
            );
            return;
        }

        let bpp = self.format.bytes_per_pixel();
        if !region_fits(self.size, region, source_pitch, bpp, data.len()) {
            error!(
                "Out of bounds update of headless texture `{}`: {region:?}",
                self.name
            );
            return;
        }

        let mut pixels = self.pixels.lock();
        let row_len = (region.width * bpp) as usize;
        for row in 0..region.height {
            let src = ((region.src_y + row) * source_pitch + region.src_x * bpp) as usize;
            let dst = (((region.dst_y + row) * self.size.x + region.dst_x) * bpp) as usize;
            pixels[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
        }

        *self.last_update.lock() = Some((*region, source_pitch));
        self.uploads.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, w: u32, h: u32) -> TextureDescriptor {
        TextureDescriptor::transient(name, UVec2::new(w, h), PixelFormat::Rgba8)
    }

    #[test]
    fn rejects_bad_sizes() {
        let device = HeadlessDevice::new();
        assert!(matches!(
            device.create_texture_2d(&desc("empty", 0, 4)),
            Err(GraphicsError::EmptyTexture { .. })
        ));
        assert!(matches!(
            device.create_texture_2d(&desc("huge", 16384, 4)),
            Err(GraphicsError::TextureTooLarge { max: 8192, .. })
        ));
        assert_eq!(device.allocation_count(), 0);
    }

    #[test]
    fn budget_counts_live_textures() {
        let device = HeadlessDevice::with_memory_budget(64);

        let first = device.create_texture_2d(&desc("a", 4, 4)).unwrap();
        assert_eq!(device.memory_in_use(), 64);
        assert!(matches!(
            device.create_texture_2d(&desc("b", 1, 1)),
            Err(GraphicsError::OutOfMemory {
                requested: 4,
                available: 0,
                ..
            })
        ));

        drop(first);
        assert!(device.create_texture_2d(&desc("c", 4, 4)).is_ok());
        assert_eq!(device.allocation_count(), 2);
    }

    #[test]
    fn partial_update_lands_in_place() {
        let device = HeadlessDevice::new();
        let _raw = device.create_texture_2d(&desc("tex", 4, 2)).unwrap();
        let texture = device.textures().pop().unwrap();
        assert_eq!(texture.name(), "tex");
        assert_eq!(texture.size(), UVec2::new(4, 2));

        // 2x1 source row, written at (1, 1)
        let region = TextureRegion {
            src_x: 0,
            src_y: 0,
            dst_x: 1,
            dst_y: 1,
            width: 2,
            height: 1,
        };
        texture.update_region_2d(0, &region, 8, &[1, 1, 1, 1, 2, 2, 2, 2]);

        let pixels = texture.pixels();
        assert_eq!(&pixels[16..20], &[0, 0, 0, 0]);
        assert_eq!(&pixels[20..28], &[1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(texture.upload_count(), 1);
        assert_eq!(texture.last_update(), Some((region, 8)));
    }

    #[test]
    fn out_of_bounds_updates_are_dropped() {
        let device = HeadlessDevice::new();
        let _raw = device.create_texture_2d(&desc("tex", 2, 2)).unwrap();
        let texture = device.textures().pop().unwrap();

        texture.update_region_2d(0, &TextureRegion::whole(UVec2::new(2, 2)), 8, &[0; 12]);
        texture.update_region_2d(1, &TextureRegion::whole(UVec2::new(1, 1)), 4, &[0; 4]);
        assert_eq!(texture.upload_count(), 0);
    }
}
