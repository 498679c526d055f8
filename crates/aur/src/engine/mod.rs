//! The core engine scheduling
//!
//! The engine runs each top level module on its own thread. This keeps scene logic and rendering
//! running in parallel, with the render thread working one frame behind the logic thread.
//!
//! Each one of those top level modules implements a trait called [`System`], and is futher referred
//! to as a system. They are synchronized and managed by the Engine Controller thread. During each
//! frame, processing of all systems is split into the following stages:
//!  * Frame Initialization
//!  * Main Processing
//!  * Post Processing
//!
//! Each of these stages is a barrier, so for example, post processing only begins once all systems
//! have finished their main processing.
//!
//! ## Notes for implementing systems
//!  * Try to not assume that each system executes in parallel. A singlethreaded mode may be
//!    implemented some day, in which systems are executed sequentially for each phase.
//!  * [`System::shutdown`] runs on the system's own thread, after the last frame. Systems are
//!    shut down in parallel, so don't rely on the order either.
//!

use ahash::AHashMap;
use log::*;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::{
    any::{Any, TypeId},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    thread,
};

#[doc(inline)]
pub use limiter::*;
#[doc(inline)]
pub use runner::*;
mod limiter;
mod runner;

/// Global immutable engine data.
pub struct EngineContext {
    /// See: [`Self::request_shutdown`]
    should_run: AtomicBool,
    /// Flag which determines whether the engine controller is still running.
    ///
    /// This should only be modified by the controller thread. Other code can freely load this value,
    /// though.
    pub is_running: AtomicBool,
    /// Amount of fully finished frames. Only the controller thread increments it.
    frames: AtomicU64,
    /// See: [`GlobalState`]
    pub globals: RwLock<GlobalState>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self {
            should_run: AtomicBool::new(true),
            is_running: AtomicBool::new(true),
            frames: AtomicU64::new(0),
            globals: RwLock::new(GlobalState::default()),
        }
    }
}

impl EngineContext {
    /// Tells the engine controller to break out of its loop at the end of the current frame.
    pub fn request_shutdown(&self) {
        trace!(
            "Thread `{}` requesting shutdown",
            thread::current().name().unwrap_or("(no name)")
        );
        self.should_run.store(false, Ordering::Release);
    }

    /// Returns the amount of frames the engine has fully processed so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub(in crate::engine) fn finish_frame(&self) {
        self.frames.fetch_add(1, Ordering::AcqRel);
    }

    pub(in crate::engine) fn should_run(&self) -> bool {
        self.should_run.load(Ordering::Acquire)
    }
}

/// The [`GlobalState`] contains data that may require mutability, or isn't related to
/// the engine's core execution.
///
/// Available in the [`EngineContext`] as a read-write locked resource. During main processing,
/// it is provided as an immutable reference, but systems are allowed to briefly write lock it in
/// other stages of execution.
#[derive(Default)]
pub struct GlobalState {
    pub data: AHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl GlobalState {
    pub fn add_any(&mut self, t: impl Any + Send + Sync) {
        self.data.insert(t.type_id(), Box::new(t));
    }

    pub fn exists<T: Any + Send + Sync>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: Any + Send + Sync>(&self) -> &T {
        self.try_get().expect("global resource not found")
    }

    pub fn try_get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .map(|any| any.downcast_ref::<T>().expect("corrupted global state mapping"))
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> &mut T {
        self.data
            .get_mut(&TypeId::of::<T>())
            .expect("global resource not found")
            .downcast_mut::<T>()
            .expect("corrupted global state mapping")
    }

    pub fn add_rw_lockable<T: Any + Send + Sync>(&mut self, t: T) {
        self.data
            .insert(TypeId::of::<RwLock<T>>(), Box::new(RwLock::new(t)));
    }

    pub fn read<T: Any + Send + Sync>(&self) -> RwLockReadGuard<T> {
        self.data
            .get(&TypeId::of::<RwLock<T>>())
            .expect("rw-lockable global resource not found")
            .downcast_ref::<RwLock<T>>()
            .expect("corrupted global state type mapping")
            .read()
    }

    pub fn write<T: Any + Send + Sync>(&self) -> RwLockWriteGuard<T> {
        self.data
            .get(&TypeId::of::<RwLock<T>>())
            .expect("rw-lockable global resource not found")
            .downcast_ref::<RwLock<T>>()
            .expect("corrupted global state type mapping")
            .write()
    }
}

/// Trait implemented by engine systems, see module docs for details.
pub trait System: Any + Send {
    /// The system's label, primarily used to identify individual worker threads.
    /// It must be a constant.
    fn label(&self) -> &'static str;

    /// An initialization function called exactly once for each system.
    ///
    /// It is called **inside the engine thread**, sequentially for each system, in order of
    /// registration. This is the only time a system may also take a mutable reference to
    /// the [`EngineContext`].
    fn init(&mut self, ec: &mut EngineContext) {
        let _ = ec;
    }

    /// Called before the first frame initialization stage. This is different from [`System::init`]
    /// in that it's actually called during a frame's processing.
    fn first_frame(&mut self, ec: &EngineContext) {
        let _ = ec;
    }

    /// System frame stage 1.
    fn frame_initialization(&mut self, ec: &EngineContext) {
        let _ = ec;
    }

    /// System frame stage 2.
    fn main_process(&mut self, ec: &EngineContext, gs: &GlobalState) {
        let _ = (ec, gs);
    }

    /// System frame stage 3.
    fn post_process(&mut self, ec: &EngineContext) {
        let _ = ec;
    }

    /// Called once on the system's thread, after the engine loop finished.
    fn shutdown(&mut self, ec: &EngineContext) {
        let _ = ec;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u32);

    #[test]
    fn global_state_lookups() {
        let mut gs = GlobalState::default();
        gs.add_any(Marker(5));
        gs.add_rw_lockable(String::from("scene"));

        assert!(gs.exists::<Marker>());
        assert!(!gs.exists::<u64>());
        assert!(gs.try_get::<u64>().is_none());
        assert_eq!(gs.get::<Marker>().0, 5);

        gs.get_mut::<Marker>().0 = 6;
        assert_eq!(gs.get::<Marker>().0, 6);

        gs.write::<String>().push_str(" graph");
        assert_eq!(gs.read::<String>().as_str(), "scene graph");
    }
}
