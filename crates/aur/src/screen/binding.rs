use crate::{
    graphics::{GraphicsError, Renderer, TextureDescriptor, TextureHandle, TextureRegion},
    scene::{MaterialInstance, MaterialRef, MeshComponent},
    video::VideoDriver,
    LOG_TARGET,
};
use log::*;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

/// Name of the material parameter that receives the video texture.
pub const VIDEO_TEXTURE_PARAMETER: &str = "VideoTexture";

#[derive(Debug, Error)]
pub enum BindError {
    #[error("mesh `{mesh}` has no material with a `VideoTexture` parameter")]
    NoSuitableMaterial { mesh: String },
    #[error("couldn't allocate the video texture")]
    TextureAllocation(#[source] GraphicsError),
}

/// Everything an upload needs, bundled so it can be shared with the render thread.
///
/// Built once per bind and never modified afterwards. Upload commands hold their own [`Arc`] of
/// it, so the texture and driver outlive every queued command.
pub struct TextureUpdateParameters {
    pub texture: TextureHandle,
    pub region: TextureRegion,
    pub source_pitch: u32,
    pub driver: Arc<dyn VideoDriver>,
}

/// Result of a successful bind.
pub struct VideoBinding {
    /// Index of the mesh material slot holding [`VideoBinding::material`].
    pub slot: usize,
    pub material: Arc<RwLock<MaterialInstance>>,
    pub parameters: Arc<TextureUpdateParameters>,
}

impl VideoBinding {
    pub fn texture(&self) -> &TextureHandle {
        &self.parameters.texture
    }

    /// Unbinds the texture from the material. The instance itself stays in the mesh.
    pub fn release(self) {
        self.material
            .write()
            .clear_texture_parameter(VIDEO_TEXTURE_PARAMETER);
    }
}

/// Index of the first material slot whose material declares [`VIDEO_TEXTURE_PARAMETER`].
pub fn find_video_material(mesh: &MeshComponent) -> Option<usize> {
    mesh.materials
        .iter()
        .position(|m| m.find_texture_parameter(VIDEO_TEXTURE_PARAMETER).is_some())
}

/// Wires a new video texture into `mesh`.
///
/// The chosen slot's material is replaced with a [`MaterialInstance`] of itself, unless it already
/// is one, in which case it's reused. Then a texture matching the driver's resolution is
/// allocated and bound to the instance's `VideoTexture` parameter.
pub fn bind_video_texture(
    mesh: &mut MeshComponent,
    driver: &Arc<dyn VideoDriver>,
    renderer: &Renderer,
) -> Result<VideoBinding, BindError> {
    let slot = find_video_material(mesh).ok_or_else(|| BindError::NoSuitableMaterial {
        mesh: mesh.label.clone(),
    })?;

    let material = match &mesh.materials[slot] {
        MaterialRef::Instance(instance) => instance.clone(),
        MaterialRef::Shared(shared) => {
            let instance = Arc::new(RwLock::new(MaterialInstance::new(shared.clone())));
            mesh.set_material(slot, MaterialRef::Instance(instance.clone()));
            trace!(target: LOG_TARGET, "Promoted material slot {slot} of `{}` to an instance", mesh.label);
            instance
        }
    };

    let intrinsics = driver.intrinsics();
    let texture = renderer
        .create_texture(&TextureDescriptor::transient(
            format!("{} video", mesh.label),
            intrinsics.resolution,
            intrinsics.pixel_format,
        ))
        .map_err(BindError::TextureAllocation)?;

    // The slot was chosen because this parameter exists, so this can't fail
    material
        .write()
        .set_texture_parameter(VIDEO_TEXTURE_PARAMETER, texture.clone());

    Ok(VideoBinding {
        slot,
        material,
        parameters: Arc::new(TextureUpdateParameters {
            region: TextureRegion::whole(intrinsics.resolution),
            source_pitch: intrinsics.row_pitch(),
            texture,
            driver: driver.clone(),
        }),
    })
}
