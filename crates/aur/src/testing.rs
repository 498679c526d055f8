//! Test helpers: a log capturing logger and a scripted video driver.

use crate::{
    scene::SceneHandle,
    video::{CameraIntrinsics, PixelFormat, VideoDriver, VideoFrame},
    LOG_TARGET,
};
use aur_utils::math::Degrees;
use glam::UVec2;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
};

#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub thread: ThreadId,
    pub level: Level,
    pub target: String,
    pub message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<CapturedRecord>>,
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: parking_lot::const_mutex(Vec::new()),
};

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().push(CapturedRecord {
            thread: thread::current().id(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

/// View of the log records emitted by the current thread. Tests run on their own threads, so
/// records of concurrently running tests don't mix.
pub struct LogCapture {
    thread: ThreadId,
    start: usize,
}

/// Installs the capturing logger (once per test binary) and starts capturing.
pub fn capture_logs() -> LogCapture {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }

    LogCapture {
        thread: thread::current().id(),
        start: LOGGER.records.lock().len(),
    }
}

impl LogCapture {
    pub fn records(&self) -> Vec<CapturedRecord> {
        LOGGER.records.lock()[self.start..]
            .iter()
            .filter(|r| r.thread == self.thread)
            .cloned()
            .collect()
    }

    /// Errors reported on the `AUR` channel.
    pub fn errors(&self) -> Vec<CapturedRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == Level::Error && r.target == LOG_TARGET)
            .collect()
    }
}

pub fn intrinsics(width: u32, height: u32, fov: f32, aspect_ratio: f32) -> CameraIntrinsics {
    CameraIntrinsics {
        resolution: UVec2::new(width, height),
        fov_horizontal: Degrees(fov),
        aspect_ratio,
        pixel_format: PixelFormat::Bgra8,
    }
}

/// A frame where every byte of pixel `i` equals `i % 251`.
pub fn numbered_frame(intrinsics: &CameraIntrinsics, sequence: u64) -> Arc<VideoFrame> {
    let UVec2 { x, y } = intrinsics.resolution;
    let data: Vec<u8> = (0..x * y)
        .flat_map(|i| [(i % 251) as u8; 4])
        .collect();
    Arc::new(VideoFrame::new(intrinsics.resolution, intrinsics.pixel_format, sequence, data).unwrap())
}

/// A [`VideoDriver`] whose frame arrivals are scripted by the test.
///
/// Like a real driver, it keeps a new-frame flag that is set when a frame arrives and cleared by
/// [`VideoDriver::acquire_frame`]. Every [`VideoDriver::has_new_frame`] call first consumes one
/// entry of the arrival script, where `true` means a frame arrived since the previous poll.
pub struct ScriptedDriver {
    intrinsics: CameraIntrinsics,
    arrivals: Mutex<VecDeque<bool>>,
    new_frame: AtomicBool,
    frame: Mutex<Option<Arc<VideoFrame>>>,
    shut_down: AtomicBool,
    scenes: Mutex<Vec<SceneHandle>>,
    acquires: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new(intrinsics: CameraIntrinsics) -> Arc<Self> {
        Arc::new(Self {
            intrinsics,
            arrivals: Mutex::new(VecDeque::new()),
            new_frame: AtomicBool::new(false),
            frame: Mutex::new(Some(numbered_frame(&intrinsics, 0))),
            shut_down: AtomicBool::new(false),
            scenes: Mutex::new(Vec::new()),
            acquires: AtomicUsize::new(0),
        })
    }

    pub fn script(&self, arrivals: impl IntoIterator<Item = bool>) {
        self.arrivals.lock().extend(arrivals);
    }

    /// A frame arrives right now.
    pub fn deliver(&self) {
        self.new_frame.store(true, Ordering::Release);
    }

    pub fn set_frame(&self, frame: Arc<VideoFrame>) {
        *self.frame.lock() = Some(frame);
    }

    /// From now on, acquired frames are [`None`].
    pub fn shut_down(&self) {
        self.shut_down.store(true, Ordering::Release);
    }

    /// Scenes passed to [`VideoDriver::set_scene`], in order.
    pub fn scenes(&self) -> Vec<SceneHandle> {
        self.scenes.lock().clone()
    }

    pub fn acquire_count(&self) -> usize {
        self.acquires.load(Ordering::Acquire)
    }
}

impl VideoDriver for ScriptedDriver {
    fn set_scene(&self, scene: &SceneHandle) {
        self.scenes.lock().push(scene.clone());
    }

    fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    fn has_new_frame(&self) -> bool {
        if self.arrivals.lock().pop_front() == Some(true) {
            self.deliver();
        }
        self.new_frame.load(Ordering::Acquire)
    }

    fn acquire_frame(&self) -> Option<Arc<VideoFrame>> {
        self.acquires.fetch_add(1, Ordering::AcqRel);
        self.new_frame.store(false, Ordering::Release);
        if self.shut_down.load(Ordering::Acquire) {
            return None;
        }
        self.frame.lock().clone()
    }
}
