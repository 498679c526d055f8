use super::{GpuDevice, GpuTexture, GraphicsError, RenderCommand, RenderCommandQueue, TextureDescriptor};
use crate::video::PixelFormat;
use glam::UVec2;
use log::*;
use std::sync::Arc;

/// The renderer interface, used to create and manage GPU resources.
///
/// Stored in the global state, see [`super::RenderSystem`].
pub struct Renderer {
    device: Arc<dyn GpuDevice>,
    commands: RenderCommandQueue,
}

impl Renderer {
    pub fn new(device: Arc<dyn GpuDevice>, commands: RenderCommandQueue) -> Self {
        Self { device, commands }
    }

    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.device
    }

    /// Allocates a new 2D texture. Its contents are undefined until the first update.
    pub fn create_texture(&self, desc: &TextureDescriptor) -> Result<TextureHandle, GraphicsError> {
        let raw = self.device.create_texture_2d(desc)?;
        trace!(
            "Created texture `{}` ({}x{}, {:?}) on `{}`",
            desc.name,
            desc.size.x,
            desc.size.y,
            desc.format,
            self.device.label()
        );

        Ok(TextureHandle(Arc::new(TextureResource {
            label: desc.name.clone(),
            size: desc.size,
            format: desc.format,
            raw,
        })))
    }

    /// Queues a command for the render thread. Never blocks.
    pub fn enqueue(&self, command: impl RenderCommand) {
        self.commands.enqueue(command);
    }

    pub fn commands(&self) -> &RenderCommandQueue {
        &self.commands
    }
}

/// Renderer side state of a texture.
pub struct TextureResource {
    pub label: String,
    pub size: UVec2,
    pub format: PixelFormat,
    pub raw: Arc<dyn GpuTexture>,
}

/// A shared handle to a texture. The texture is freed once all handles are gone, including the
/// ones captured by queued render commands.
#[derive(Clone)]
pub struct TextureHandle(pub(super) Arc<TextureResource>);

impl TextureHandle {
    #[inline]
    pub fn resource(&self) -> &TextureResource {
        &self.0
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.0.size
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.0.label
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TextureHandle {}

impl std::fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextureHandle").field(&self.0.label).finish()
    }
}
