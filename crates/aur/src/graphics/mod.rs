//! AUR graphics renderer
//!
//! The renderer only concerns itself with what video screens need from the GPU: creating 2D
//! textures, and updating their contents from the render thread.
//!
//! The module is split into three main components, described below.
//!
//! ## [`RenderSystem`]
//! The render system is an engine [`crate::engine::System`]. At the beginning of every frame it
//! executes all [`RenderCommand`]s queued during the previous frame, which is where texture uploads
//! actually happen.
//!
//! ## [`Renderer`]
//! The renderer is the API entrypoint, stored in the global state. Logic code uses it to allocate
//! textures and to queue render commands. Textures are accessed via [`TextureHandle`]s, which
//! point to a shared reference count. Once the last handle is dropped, the texture is freed.
//!
//! ## [`GpuDevice`]
//! Backend seam. [`WgpuDevice`] talks to an actual GPU via [`wgpu`], while [`HeadlessDevice`] keeps
//! textures in system memory, which is used whenever no adapter is available and in tests.
//!

#[doc(inline)]
pub use commands::*;
mod commands;

#[doc(inline)]
pub use device::*;
mod device;

#[doc(inline)]
pub use headless::*;
mod headless;

#[doc(inline)]
pub use interface::*;
mod interface;

#[doc(inline)]
pub use system::*;
mod system;

#[doc(inline)]
pub use wgpu_device::*;
mod wgpu_device;
