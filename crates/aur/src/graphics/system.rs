use super::{GpuDevice, RenderCommandQueue, RenderContext, Renderer};
use crate::engine::{EngineContext, System};
use log::*;
use std::sync::Arc;

/// Executes render commands on its own thread.
///
/// Commands queued during frame N's main processing are executed during frame N+1's frame
/// initialization, which gives scene logic a one frame head start over the renderer.
pub struct RenderSystem {
    device: Arc<dyn GpuDevice>,
    commands: RenderCommandQueue,
    executed: u64,
}

impl RenderSystem {
    pub fn new(device: Arc<dyn GpuDevice>) -> Self {
        info!("Starting up the renderer on `{}`...", device.label());
        Self {
            device,
            commands: RenderCommandQueue::new(),
            executed: 0,
        }
    }
}

impl System for RenderSystem {
    fn label(&self) -> &'static str {
        "Render System"
    }

    fn init(&mut self, ec: &mut EngineContext) {
        trace!("Initializing the global renderer...");
        ec.globals
            .get_mut()
            .add_any(Renderer::new(self.device.clone(), self.commands.clone()));
    }

    fn frame_initialization(&mut self, _ec: &EngineContext) {
        let ctx = RenderContext {
            device: self.device.as_ref(),
        };
        self.executed += self.commands.execute_pending(&ctx) as u64;
        self.device.flush();
    }

    fn shutdown(&mut self, _ec: &EngineContext) {
        let discarded = self.commands.discard_pending();
        if discarded > 0 {
            debug!("Discarded {discarded} render commands queued after the last frame");
        }
        info!("Renderer shut down, {} commands executed", self.executed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine,
        graphics::{HeadlessDevice, RenderCommand},
    };
    use parking_lot::Mutex;

    struct Record(Arc<Mutex<Vec<u64>>>, u64);

    impl RenderCommand for Record {
        fn label(&self) -> &'static str {
            "Record"
        }

        fn execute(self: Box<Self>, _ctx: &RenderContext) {
            self.0.lock().push(self.1);
        }
    }

    /// Queues one command per frame from a logic system.
    struct Producer(Arc<Mutex<Vec<u64>>>);

    impl System for Producer {
        fn label(&self) -> &'static str {
            "Producer"
        }

        fn main_process(&mut self, ec: &EngineContext, gs: &engine::GlobalState) {
            let frame = ec.frame_count();
            gs.get::<Renderer>().enqueue(Record(self.0.clone(), frame));
            if frame == 3 {
                ec.request_shutdown();
            }
        }
    }

    #[test]
    fn commands_execute_one_frame_later() {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let producer = Producer(executed.clone());

        let (_ec, handle) = engine::start(move |builder| {
            builder
                .with_system(RenderSystem::new(Arc::new(HeadlessDevice::new())))
                .with_system(producer);
        });
        handle.join().unwrap();

        // The command of the last frame is discarded at shutdown
        assert_eq!(*executed.lock(), vec![0, 1, 2]);
        assert_eq!(Arc::strong_count(&executed), 1);
    }

    #[test]
    fn device_is_flushed_once_per_frame() {
        let device = Arc::new(HeadlessDevice::new());
        let producer = Producer(Arc::new(Mutex::new(Vec::new())));

        let render_device: Arc<dyn GpuDevice> = device.clone();
        let (ec, handle) = engine::start(move |builder| {
            builder
                .with_system(RenderSystem::new(render_device))
                .with_system(producer);
        });
        handle.join().unwrap();

        // Frames 0 to 3, shutdown was requested during the last one
        assert_eq!(ec.frame_count(), 4);
        assert_eq!(device.flush_count(), 4);
    }
}
