use super::{EngineContext, GlobalState, System};
use log::*;
use once_cell::sync::OnceCell;
use std::{
    sync::{atomic::Ordering, Arc, Barrier},
    thread::{self, JoinHandle},
};

/// Starts the core engine in its own dedicated thread.
///
/// The provided parameter is a closure, which will receive an [`EngineBuilder`], capable of spawning
/// systems and their threads. This closure is executed inside the engine thread.
///
/// This function will block until the engine thread finishes early initialization and provides
/// an [`Arc`] of [`EngineContext`] that is eventually returned by this function. This context struct
/// is used by the caller to observe the engine and to request its shutdown.
pub fn start(
    f: impl FnOnce(&mut EngineBuilder) + Send + 'static,
) -> (Arc<EngineContext>, JoinHandle<()>) {
    // Because the engine thread has to initialize the context, the sync::OnceCell is used
    // as the synchronization primitive. After spawning the thread, this function will
    // await the setup of this cell.
    let ec_cell1: Arc<OnceCell<Arc<EngineContext>>> = Arc::new(OnceCell::new());
    let ec_cell2 = ec_cell1.clone();

    let join_handle = thread::Builder::new()
        .name(String::from("Engine Controller"))
        .spawn(move || {
            // Similarly to the ec_cell, this cell is observed by all system worker threads.
            // Once all system threads are in place, this value is constructed and provided to
            // all system threads.
            let input_cell: OnceCell<SystemThreadInputs> = OnceCell::new();

            // Because of lifetime requirements, these values are stored here.
            // They are properly initialized in the scope itself, so over here meaningless valid
            // defaults are provided.
            let mut engine_context = Default::default();
            let mut stage_barrier = Barrier::new(0);

            thread::scope(|scope| {
                // Early initialization
                // ----------------------------------------------------------------
                let mut raw_ec = EngineContext::default();
                let mut total_threads = 0;

                f(&mut EngineBuilder {
                    scope,

                    total_threads: &mut total_threads,
                    engine_context: &mut raw_ec,

                    input_cell: &input_cell,
                });

                engine_context = Arc::new(raw_ec);
                stage_barrier = Barrier::new(total_threads + 1);

                // Send engine readiness notifications and associated data
                // ----------------------------------------------------------------
                // (note, using get_or_init, as it allows insertions that don't return
                // Result<(), T>, which requires T: Debug, like is the case with set)
                ec_cell2.get_or_init(|| engine_context.clone());
                input_cell.get_or_init(|| SystemThreadInputs {
                    stage_barrier: &stage_barrier,
                    engine_context: &engine_context,
                });

                // Begin the engine loop proper
                // ----------------------------------------------------------------
                trace!("Starting the engine controller loop");
                let ec = &engine_context;
                loop {
                    stage_barrier.wait(); // Frame initialization
                    stage_barrier.wait(); // Main processing
                    stage_barrier.wait(); // Post processing

                    ec.finish_frame();

                    if !ec.should_run() {
                        trace!("Shutting down the engine controller loop");
                        ec.is_running.store(false, Ordering::Release);
                        stage_barrier.wait(); // End of frame
                        break;
                    }

                    stage_barrier.wait(); // End of frame
                }
                trace!("Engine controller loop finished");
            })
        })
        .expect("couldn't spawn the engine controller thread");

    (ec_cell1.wait().clone(), join_handle)
}

/// Input data sent to all system threads via a dedicated cell.
#[derive(Clone, Copy)]
struct SystemThreadInputs<'a> {
    stage_barrier: &'a Barrier,
    engine_context: &'a EngineContext,
}

/// Engine builder, given to the closure provided in [`start`]. Provides functionality for setting
/// up initial engine state.
///
/// ## Internal lifetimes
///  * `'init` - encompasses the scope of [`EngineContext`] creation
///  * `'scope` - encompasses the [`thread::scope`] scope
///  * `'env` - encompasses the engine thread data from outside the [`thread::scope`]
///
/// System threads can only reference `'env` data.
pub struct EngineBuilder<'init, 'scope, 'env> {
    scope: &'scope thread::Scope<'scope, 'env>,

    total_threads: &'init mut usize,
    engine_context: &'init mut EngineContext,

    input_cell: &'env OnceCell<SystemThreadInputs<'env>>,
}

impl EngineBuilder<'_, '_, '_> {
    pub fn global_state(&mut self) -> &mut GlobalState {
        self.engine_context.globals.get_mut()
    }

    /// Registers a system: runs its [`System::init`] right away and spawns its worker thread,
    /// which idles until the engine loop begins.
    pub fn with_system<S: System>(&mut self, mut system: S) -> &mut Self {
        let input_cell = self.input_cell;

        system.init(self.engine_context);

        trace!("Starting worker thread for system `{}`", system.label());
        thread::Builder::new()
            .name(system.label().to_string())
            .spawn_scoped(self.scope, move || {
                let mut first_frame_called = false;

                let SystemThreadInputs {
                    stage_barrier,
                    engine_context,
                } = *input_cell.wait();

                loop {
                    if !first_frame_called {
                        first_frame_called = true;
                        system.first_frame(engine_context);
                    }
                    system.frame_initialization(engine_context);
                    stage_barrier.wait(); // Frame initialization

                    let gs = engine_context.globals.read();
                    system.main_process(engine_context, &gs);
                    drop(gs);
                    stage_barrier.wait(); // Main processing

                    system.post_process(engine_context);
                    stage_barrier.wait(); // Post processing

                    stage_barrier.wait(); // End of frame

                    if !engine_context.is_running.load(Ordering::Acquire) {
                        break;
                    }
                }

                trace!("Shutting down system `{}`", system.label());
                system.shutdown(engine_context);
            })
            .expect("couldn't spawn a system worker thread");

        *self.total_threads += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct StageLog {
        entries: Mutex<Vec<&'static str>>,
        shutdowns: AtomicU32,
    }

    struct RecordingSystem {
        log: Arc<StageLog>,
    }

    impl System for RecordingSystem {
        fn label(&self) -> &'static str {
            "Recording System"
        }

        fn init(&mut self, ec: &mut EngineContext) {
            ec.globals.get_mut().add_any(String::from("initialized"));
        }

        fn first_frame(&mut self, _ec: &EngineContext) {
            self.log.entries.lock().push("first");
        }

        fn main_process(&mut self, ec: &EngineContext, gs: &GlobalState) {
            assert_eq!(gs.get::<String>(), "initialized");
            self.log.entries.lock().push("main");
            if ec.frame_count() == 2 {
                ec.request_shutdown();
            }
        }

        fn shutdown(&mut self, _ec: &EngineContext) {
            self.log.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn runs_until_shutdown_is_requested() {
        let log = Arc::new(StageLog::default());
        let system_log = log.clone();

        let (ec, handle) = start(move |builder| {
            builder.with_system(RecordingSystem { log: system_log });
        });
        handle.join().unwrap();

        assert!(!ec.is_running.load(Ordering::Acquire));
        // Shutdown was requested during the third frame, which still finishes
        assert_eq!(ec.frame_count(), 3);
        assert_eq!(
            *log.entries.lock(),
            vec!["first", "main", "main", "main"]
        );
        assert_eq!(log.shutdowns.load(Ordering::SeqCst), 1);
    }
}
