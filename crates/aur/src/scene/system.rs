use super::World;
use crate::{
    engine::{EngineContext, GlobalState, System},
    graphics::Renderer,
};
use log::*;
use parking_lot::RwLock;
use std::time::Instant;

/// Ticks every scene of the [`World`] once per frame.
pub struct SceneSystem {
    last_tick: Option<Instant>,
}

impl SceneSystem {
    pub fn new() -> Self {
        Self { last_tick: None }
    }
}

impl Default for SceneSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SceneSystem {
    fn label(&self) -> &'static str {
        "Scene System"
    }

    fn init(&mut self, ec: &mut EngineContext) {
        let gs = ec.globals.get_mut();
        if !gs.exists::<RwLock<World>>() {
            gs.add_rw_lockable(World::default());
        }
    }

    fn main_process(&mut self, _ec: &EngineContext, gs: &GlobalState) {
        let now = Instant::now();
        let delta = self
            .last_tick
            .replace(now)
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);

        let Some(renderer) = gs.try_get::<Renderer>() else {
            trace!("No renderer registered, skipping scene ticks");
            return;
        };

        for scene in gs.write::<World>().scenes.iter_mut() {
            scene.tick(renderer, delta);
        }
    }

    fn shutdown(&mut self, ec: &EngineContext) {
        let gs = ec.globals.read();
        let mut world = gs.write::<World>();
        for scene in world.scenes.iter_mut() {
            debug!("Tearing down {}", scene.handle());
            scene.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine,
        graphics::{HeadlessDevice, RenderSystem},
        scene::{Scene, SceneComponent, TickContext},
    };
    use std::{
        any::Any,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
    };

    #[derive(Default)]
    struct Probe {
        ticks: Arc<AtomicU32>,
        detaches: Arc<AtomicU32>,
    }

    impl SceneComponent for Probe {
        fn tick(&mut self, ctx: &TickContext) {
            assert!(ctx.delta >= 0.0);
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn detach(&mut self) {
            self.detaches.fetch_add(1, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Ends the engine after a fixed amount of frames.
    struct Stopper(u64);

    impl System for Stopper {
        fn label(&self) -> &'static str {
            "Stopper"
        }

        fn main_process(&mut self, ec: &EngineContext, _gs: &GlobalState) {
            if ec.frame_count() + 1 == self.0 {
                ec.request_shutdown();
            }
        }
    }

    #[test]
    fn scenes_tick_every_frame_and_detach_at_shutdown() {
        let probe = Probe::default();
        let ticks = probe.ticks.clone();
        let detaches = probe.detaches.clone();

        let (_ec, handle) = engine::start(move |builder| {
            let mut scene = Scene::new("probe");
            scene.add(probe);

            let mut world = World::default();
            world.add_scene(scene);
            builder.global_state().add_rw_lockable(world);

            builder
                .with_system(RenderSystem::new(Arc::new(HeadlessDevice::new())))
                .with_system(SceneSystem::new())
                .with_system(Stopper(4));
        });
        handle.join().unwrap();

        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert_eq!(detaches.load(Ordering::SeqCst), 1);
    }
}
