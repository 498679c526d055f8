use super::{CameraIntrinsics, PixelFormat, VideoDriver, VideoFrame};
use crate::{scene::SceneHandle, LOG_TARGET};
use aur_utils::math::Degrees;
use glam::UVec2;
use log::*;
use parking_lot::Mutex;
use serde::Deserialize;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// Settings of the synthetic camera.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub width: u32,
    pub height: u32,
    /// Horizontal field of view.
    pub fov: Degrees,
    /// Defaults to `width / height` if not set.
    pub aspect_ratio: Option<f32>,
    pub pixel_format: PixelFormat,
    /// Frames produced per second by the capture thread.
    pub frame_rate: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov: Degrees(60.0),
            aspect_ratio: None,
            pixel_format: PixelFormat::Bgra8,
            frame_rate: 30.0,
        }
    }
}

impl DriverConfig {
    pub fn intrinsics(&self) -> CameraIntrinsics {
        CameraIntrinsics {
            resolution: UVec2::new(self.width, self.height),
            fov_horizontal: self.fov,
            aspect_ratio: self
                .aspect_ratio
                .unwrap_or(self.width as f32 / self.height.max(1) as f32),
            pixel_format: self.pixel_format,
        }
    }
}

/// A [`VideoDriver`] that doesn't need a camera. It produces a scrolling color gradient, either on
/// its own capture thread ([`TestPatternDriver::start`]) or whenever
/// [`TestPatternDriver::produce_frame`] is called ([`TestPatternDriver::manual`]).
pub struct TestPatternDriver {
    shared: Arc<DriverShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct DriverShared {
    intrinsics: CameraIntrinsics,
    running: AtomicBool,
    new_frame: AtomicBool,
    produced: AtomicU64,
    latest: Mutex<Option<Arc<VideoFrame>>>,
    scene: Mutex<Option<SceneHandle>>,
}

impl TestPatternDriver {
    /// Creates a driver without a capture thread. Frames only appear after calls to
    /// [`Self::produce_frame`].
    pub fn manual(intrinsics: CameraIntrinsics) -> Self {
        Self {
            shared: Arc::new(DriverShared {
                intrinsics,
                running: AtomicBool::new(true),
                new_frame: AtomicBool::new(false),
                produced: AtomicU64::new(0),
                latest: Mutex::new(None),
                scene: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Creates a driver and starts its capture thread.
    pub fn start(config: &DriverConfig) -> Self {
        let driver = Self::manual(config.intrinsics());
        let interval = Duration::from_secs_f32(1.0 / config.frame_rate.max(0.1));

        let shared = driver.shared.clone();
        let handle = thread::Builder::new()
            .name(String::from("Test Pattern Capture"))
            .spawn(move || {
                while shared.running.load(Ordering::Acquire) {
                    shared.produce();
                    // Parked instead of slept, so that shutdown can wake the thread right away
                    thread::park_timeout(interval);
                }
            })
            .expect("couldn't spawn the capture thread");
        *driver.worker.lock() = Some(handle);

        info!(
            target: LOG_TARGET,
            "Test pattern driver started: {}x{} @ {} fps",
            config.width,
            config.height,
            config.frame_rate
        );
        driver
    }

    /// Captures a new frame and marks it as available. Returns [`None`] if the driver has already
    /// been shut down.
    pub fn produce_frame(&self) -> Option<Arc<VideoFrame>> {
        if !self.is_running() {
            return None;
        }
        Some(self.shared.produce())
    }

    /// Stops frame production. From now on [`VideoDriver::acquire_frame`] returns [`None`].
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(handle) = self.worker.lock().take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                error!(target: LOG_TARGET, "Test pattern capture thread panicked");
            }
        }

        let mut latest = self.shared.latest.lock();
        self.shared.new_frame.store(false, Ordering::Release);
        *latest = None;
        drop(latest);
        info!(
            target: LOG_TARGET,
            "Test pattern driver shut down after {} frames",
            self.frames_produced()
        );
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// The scene this driver was last attached to.
    pub fn scene(&self) -> Option<SceneHandle> {
        self.shared.scene.lock().clone()
    }

    pub fn frames_produced(&self) -> u64 {
        self.shared.produced.load(Ordering::Acquire)
    }
}

impl Drop for TestPatternDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl DriverShared {
    fn produce(&self) -> Arc<VideoFrame> {
        let sequence = self.produced.fetch_add(1, Ordering::AcqRel);
        let frame = Arc::new(gradient_frame(&self.intrinsics, sequence));

        // The flag only changes with `latest` locked, so an acquire never takes a frame without
        // also consuming its flag
        let mut latest = self.latest.lock();
        *latest = Some(frame.clone());
        self.new_frame.store(true, Ordering::Release);
        frame
    }
}

impl VideoDriver for TestPatternDriver {
    fn set_scene(&self, scene: &SceneHandle) {
        debug!(target: LOG_TARGET, "Test pattern driver now displayed in {scene}");
        *self.shared.scene.lock() = Some(scene.clone());
    }

    fn intrinsics(&self) -> CameraIntrinsics {
        self.shared.intrinsics
    }

    fn has_new_frame(&self) -> bool {
        self.shared.new_frame.load(Ordering::Acquire)
    }

    fn acquire_frame(&self) -> Option<Arc<VideoFrame>> {
        if !self.is_running() {
            return None;
        }
        let latest = self.shared.latest.lock();
        self.shared.new_frame.store(false, Ordering::Release);
        latest.clone()
    }
}

/// Generates a gradient that scrolls diagonally as the sequence number grows.
fn gradient_frame(intrinsics: &CameraIntrinsics, sequence: u64) -> VideoFrame {
    let UVec2 { x: width, y: height } = intrinsics.resolution;
    let shift = (sequence % 256) as u32;

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x + shift * 4) % 256) as u8;
            let g = ((y + shift * 2) % 256) as u8;
            let b = shift as u8;

            match intrinsics.pixel_format {
                PixelFormat::Bgra8 => data.extend_from_slice(&[b, g, r, 255]),
                PixelFormat::Rgba8 => data.extend_from_slice(&[r, g, b, 255]),
            }
        }
    }

    VideoFrame::new(intrinsics.resolution, intrinsics.pixel_format, sequence, data)
        .expect("gradient frame generated with a wrong size")
}
