use super::TextureUpdateParameters;
use crate::{
    graphics::{RenderCommand, RenderContext},
    LOG_TARGET,
};
use log::*;
use std::sync::Arc;

/// Copies the driver's latest frame into a screen's texture. Executed on the render thread.
pub struct UploadTextureCommand {
    parameters: Arc<TextureUpdateParameters>,
}

impl UploadTextureCommand {
    pub fn new(parameters: Arc<TextureUpdateParameters>) -> Self {
        Self { parameters }
    }
}

impl RenderCommand for UploadTextureCommand {
    fn label(&self) -> &'static str {
        "Upload Video Texture"
    }

    fn execute(self: Box<Self>, _ctx: &RenderContext) {
        let outcome = update_texture(&self.parameters);
        trace!(
            target: LOG_TARGET,
            "Upload into `{}`: {outcome:?}",
            self.parameters.texture.label()
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { sequence: u64 },
    /// The texture's top mip isn't in memory yet.
    NotResident,
    NoNewFrame,
    /// The driver returned no frame, which means it has been shut down.
    DriverShutdown,
    /// The frame doesn't match the texture it's supposed to go into.
    FrameMismatch,
}

/// Performs a single upload attempt. Doesn't modify anything but the texture.
pub fn update_texture(parameters: &TextureUpdateParameters) -> UploadOutcome {
    let texture = parameters.texture.resource();

    if texture.raw.first_resident_mip() > 0 {
        return UploadOutcome::NotResident;
    }

    // Drivers clear the flag on acquire, which is what keeps late commands from uploading the
    // same frame twice
    if !parameters.driver.has_new_frame() {
        return UploadOutcome::NoNewFrame;
    }

    let Some(frame) = parameters.driver.acquire_frame() else {
        error!(target: LOG_TARGET, "Video driver returned null frame");
        return UploadOutcome::DriverShutdown;
    };

    if frame.size() != texture.size || frame.format() != texture.format {
        error!(
            target: LOG_TARGET,
            "Frame #{} ({}x{}, {:?}) doesn't fit texture `{}` ({}x{}, {:?})",
            frame.sequence(),
            frame.size().x,
            frame.size().y,
            frame.format(),
            texture.label,
            texture.size.x,
            texture.size.y,
            texture.format
        );
        return UploadOutcome::FrameMismatch;
    }

    texture.raw.update_region_2d(
        0,
        &parameters.region,
        parameters.source_pitch,
        frame.data(),
    );

    UploadOutcome::Uploaded {
        sequence: frame.sequence(),
    }
}
