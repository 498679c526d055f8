//! # AUR
//! Live camera video, displayed on screens inside real-time 3D scenes.
//!
//! Frames come from a [`video::VideoDriver`], get uploaded into GPU textures by the
//! [`graphics::RenderSystem`], and are shown on [`screen::VideoScreen`]s ticked by the
//! [`scene::SceneSystem`]. The systems are scheduled by the multithreaded [`engine`].

pub mod cli;
pub mod config;
pub mod engine;
pub mod graphics;
pub mod scene;
pub mod screen;
pub mod video;

#[cfg(test)]
mod testing;

/// Log target of everything related to video screens.
pub const LOG_TARGET: &str = "AUR";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
