use super::{EngineContext, GlobalState, System};
use log::*;
use std::{
    thread,
    time::{Duration, Instant},
};

/// Stops the engine after a fixed amount of frames, and optionally caps the frame rate.
///
/// Without a cap the engine runs frames back to back, which queues far more texture uploads than
/// any camera produces frames.
pub struct FrameLimiter {
    frames: u64,
    frame_time: Option<Duration>,
    frame_start: Option<Instant>,
}

impl FrameLimiter {
    /// Limits the engine to `frames` frames, at most `frame_rate` per second. A frame rate of 0
    /// disables pacing.
    pub fn new(frames: u64, frame_rate: f32) -> Self {
        Self {
            frames,
            frame_time: (frame_rate > 0.0).then(|| Duration::from_secs_f32(1.0 / frame_rate)),
            frame_start: None,
        }
    }
}

impl System for FrameLimiter {
    fn label(&self) -> &'static str {
        "Frame Limiter"
    }

    fn frame_initialization(&mut self, _ec: &EngineContext) {
        self.frame_start = Some(Instant::now());
    }

    fn main_process(&mut self, ec: &EngineContext, _gs: &GlobalState) {
        // The current frame still finishes, so the request goes out during the last one
        if ec.frame_count() + 1 >= self.frames {
            debug!("Frame limit of {} reached", self.frames);
            ec.request_shutdown();
        }
    }

    fn post_process(&mut self, _ec: &EngineContext) {
        if let (Some(frame_time), Some(start)) = (self.frame_time, self.frame_start) {
            let elapsed = start.elapsed();
            if elapsed < frame_time {
                thread::sleep(frame_time - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    #[test]
    fn stops_on_the_exact_frame() {
        let (ec, handle) = engine::start(|builder| {
            builder.with_system(FrameLimiter::new(25, 0.0));
        });
        handle.join().unwrap();
        assert_eq!(ec.frame_count(), 25);
    }

    #[test]
    fn frames_are_paced() {
        let start = Instant::now();
        let (ec, handle) = engine::start(|builder| {
            builder.with_system(FrameLimiter::new(5, 100.0));
        });
        handle.join().unwrap();

        assert_eq!(ec.frame_count(), 5);
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
