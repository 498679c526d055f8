use super::{
    device::region_fits, GpuDevice, GpuTexture, GraphicsError, TextureDescriptor, TextureRegion,
};
use crate::video::PixelFormat;
use glam::UVec2;
use log::*;
use pollster::FutureExt;
use std::sync::Arc;
use wgpu::{Features, Limits};

/// The device context contains public information regarding the current [`wgpu`] instance,
/// including the device, queue and adapter.
///
/// There's no surface, video textures are sampled by whatever draws the scene, so all that's
/// needed here is a device capable of creating and updating them.
pub struct DeviceContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
}

impl DeviceContext {
    /// Creates a new [`wgpu`] instance and initializes a whole device context based from that.
    pub fn create_headless() -> Result<Arc<Self>, GraphicsError> {
        info!("Creating a device context...");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .block_on()
            .ok_or(GraphicsError::NoAdapter)?;

        info!("Using adapter: {}", adapter.get_info().name);
        info!("Using backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("AUR device"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                },
                None,
            )
            .block_on()?;

        // Allocation errors are caught with error scopes, anything else is a bug in our usage of
        // the API. It's logged instead of panicking, a broken video screen isn't worth a crash.
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            error!("An error has been reported by wgpu!");
            error!("{error}");
        }));

        Ok(Arc::new(Self {
            device,
            queue,
            instance,
            adapter,
        }))
    }
}

/// A [`GpuDevice`] backed by [`wgpu`].
pub struct WgpuDevice {
    dc: Arc<DeviceContext>,
    label: String,
}

impl WgpuDevice {
    pub fn new(dc: Arc<DeviceContext>) -> Self {
        let label = format!("wgpu ({})", dc.adapter.get_info().name);
        Self { dc, label }
    }
}

impl GpuDevice for WgpuDevice {
    fn label(&self) -> &str {
        &self.label
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

        // Validation errors are reported asynchronously by wgpu, so limits are checked up front
        let max = self.dc.device.limits().max_texture_dimension_2d;
        if desc.size.max_element() > max {
            return Err(GraphicsError::TextureTooLarge {
                name: desc.name.clone(),
                size: desc.size,
                max,
            });
        }

        self.dc.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.dc.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.name),
            size: extent(desc.size),
            mip_level_count: desc.mip_levels.max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if let Some(error) = self.dc.device.pop_error_scope().block_on() {
            warn!("Allocation of `{}` failed: {error}", desc.name);
            return Err(GraphicsError::OutOfMemory {
                name: desc.name.clone(),
                requested: desc.byte_size(),
                available: 0,
            });
        }

        Ok(Arc::new(WgpuTexture {
            dc: self.dc.clone(),
            view: texture.create_view(&Default::default()),
            texture,
            size: desc.size,
            format: desc.format,
        }))
    }

    fn flush(&self) {
        // `write_texture` only stages its data, it's copied over on the next submission
        self.dc.queue.submit(std::iter::empty());
        self.dc.device.poll(wgpu::Maintain::Poll);
    }
}

pub struct WgpuTexture {
    dc: Arc<DeviceContext>,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    size: UVec2,
    format: PixelFormat,
}

impl GpuTexture for WgpuTexture {
    fn first_resident_mip(&self) -> u32 {
        // wgpu textures are always fully resident
        0
    }

    fn update_region_2d(
        &self,
        mip_level: u32,
        region: &TextureRegion,
        source_pitch: u32,
        data: &[u8],
    ) {
        let bpp = self.format.bytes_per_pixel();
        let mip_size = UVec2::new(
            (self.size.x >> mip_level).max(1),
            (self.size.y >> mip_level).max(1),
        );

        if !region_fits(mip_size, region, source_pitch, bpp, data.len()) {
            error!("Out of bounds update of a texture: {region:?}");
            return;
        }

        self.dc.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level,
                origin: wgpu::Origin3d {
                    x: region.dst_x,
                    y: region.dst_y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: region.src_y as u64 * source_pitch as u64
                    + region.src_x as u64 * bpp as u64,
                bytes_per_row: Some(source_pitch),
                rows_per_image: None,
            },
            extent(region.size()),
        );
    }
}

fn extent(size: UVec2) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.x,
        height: size.y,
        depth_or_array_layers: 1,
    }
}

fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}
