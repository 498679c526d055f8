//! Video screens
//!
//! A [`VideoScreen`] is a quad in a scene that displays the live feed of a [`VideoDriver`]. Once
//! attached to a driver, it:
//!  1. finds the material slot of its mesh that consumes the video (see [`bind_video_texture`]),
//!  2. allocates a texture matching the camera's resolution and binds it to that material,
//!  3. optionally scales itself to cover the camera's view frustum (see [`ScreenSize`]),
//!  4. queues an [`UploadTextureCommand`] on every tick, which copies the latest frame into the
//!     texture on the render thread.
//!
//! ## Failure handling
//! Nothing here returns errors to the caller. Every failure is logged on the `AUR` channel, and
//! shows up as a screen that doesn't update.
//!
//! ## Threading
//! Upload commands run one frame behind the tick that queued them. They only share immutable data
//! with the screen (see [`TextureUpdateParameters`]), so a screen can be detached or dropped while
//! its commands are still queued.

use crate::{
    graphics::{Renderer, TextureHandle},
    scene::{AttachContext, MeshComponent, SceneComponent, TickContext, TransformComponent},
    video::VideoDriver,
    LOG_TARGET,
};
use log::*;
use serde::Deserialize;
use std::{any::Any, sync::Arc};

#[doc(inline)]
pub use binding::*;
mod binding;

#[doc(inline)]
pub use sizing::*;
mod sizing;

#[doc(inline)]
pub use upload::*;
mod upload;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Unbound,
    /// Only observable from within [`VideoScreen::attach`].
    Binding,
    Active,
    /// The last attach attempt failed. Attaching again retries it.
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Scale the screen to cover the camera's view when attached.
    pub auto_size: bool,
    /// Edge length of the quad geometry, see [`DEFAULT_QUAD_UNIT`].
    pub quad_unit: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            auto_size: true,
            quad_unit: DEFAULT_QUAD_UNIT,
        }
    }
}

pub struct VideoScreen {
    pub label: String,
    /// Relative to the camera the video comes from.
    pub transform: TransformComponent,
    pub mesh: MeshComponent,
    pub config: ScreenConfig,
    /// Inactive screens keep their binding, but don't upload new frames.
    pub active: bool,

    state: ScreenState,
    driver: Option<Arc<dyn VideoDriver>>,
    binding: Option<VideoBinding>,
}

impl VideoScreen {
    pub fn new(label: impl Into<String>, mesh: MeshComponent, config: ScreenConfig) -> Self {
        Self {
            label: label.into(),
            transform: TransformComponent::default(),
            mesh,
            config,
            active: true,
            state: ScreenState::Unbound,
            driver: None,
            binding: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformComponent) -> Self {
        self.transform = transform;
        self
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn driver(&self) -> Option<&Arc<dyn VideoDriver>> {
        self.driver.as_ref()
    }

    pub fn binding(&self) -> Option<&VideoBinding> {
        self.binding.as_ref()
    }

    /// The texture frames are uploaded into, if bound.
    pub fn texture(&self) -> Option<&TextureHandle> {
        self.binding.as_ref().map(VideoBinding::texture)
    }

    /// Connects the screen to a driver. Attaching an already bound screen releases the previous
    /// binding first, which is how a screen picks up changed camera intrinsics.
    pub fn attach(&mut self, driver: Option<Arc<dyn VideoDriver>>, ctx: &AttachContext) {
        let Some(driver) = driver else {
            error!(target: LOG_TARGET, "Screen `{}`: attached without a video driver", self.label);
            return;
        };

        if self.state != ScreenState::Unbound {
            self.detach();
        }

        self.state = ScreenState::Binding;
        self.driver = Some(driver.clone());

        match ctx.scene {
            Some(scene) => driver.set_scene(scene),
            None => error!(
                target: LOG_TARGET,
                "Screen `{}`: not placed in a scene, the driver can't be told where it's displayed",
                self.label
            ),
        }

        match bind_video_texture(&mut self.mesh, &driver, ctx.renderer) {
            Ok(binding) => {
                self.binding = Some(binding);
                self.state = ScreenState::Active;
            }
            Err(BindError::TextureAllocation(source)) => {
                error!(
                    target: LOG_TARGET,
                    "Screen `{}`: couldn't allocate the video texture: {source}",
                    self.label
                );
                // Later ticks must not touch a half initialized binding
                self.driver = None;
                self.state = ScreenState::Failed;
                return;
            }
            Err(err) => {
                error!(target: LOG_TARGET, "Screen `{}`: {err}", self.label);
                self.state = ScreenState::Failed;
                return;
            }
        }

        if self.config.auto_size {
            self.fit_to_frustum();
        }

        let resolution = driver.intrinsics().resolution;
        info!(
            target: LOG_TARGET,
            "Screen `{}` attached to a {}x{} video driver",
            self.label,
            resolution.x,
            resolution.y
        );
    }

    /// Scales the screen to cover the camera's view at its current distance. Returns the new size,
    /// or [`None`] if no driver is bound.
    pub fn fit_to_frustum(&mut self) -> Option<ScreenSize> {
        let intrinsics = self.driver.as_ref()?.intrinsics();
        let size = ScreenSize::from_frustum(&intrinsics, self.transform.distance_from_parent());

        self.transform.scale = size.local_scale(self.config.quad_unit);
        info!(
            target: LOG_TARGET,
            "Screen `{}` size: {} x {}",
            self.label,
            size.width,
            size.height
        );
        Some(size)
    }

    /// Queues an upload of the latest frame. Returns whether a command was queued.
    pub fn on_tick(&mut self, renderer: &Renderer) -> bool {
        if !self.active || self.driver.is_none() {
            return false;
        }
        let Some(binding) = &self.binding else {
            return false;
        };

        renderer.enqueue(UploadTextureCommand::new(binding.parameters.clone()));
        true
    }

    /// Releases the texture and material binding and forgets the driver.
    pub fn detach(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.release();
        }
        self.driver = None;
        self.state = ScreenState::Unbound;
    }
}

impl SceneComponent for VideoScreen {
    fn tick(&mut self, ctx: &TickContext) {
        self.on_tick(ctx.renderer);
    }

    fn detach(&mut self) {
        VideoScreen::detach(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
