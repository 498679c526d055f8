//! # The scene host
//! Scenes own their components and tick them once per frame on the scene thread. Components are
//! stored in a generational [`Pool`], so handles to removed components are detected instead of
//! silently pointing at whatever took their slot.
//!
//! Materials and meshes only model what video screens need to know about them: ordered material
//! slots, and named texture parameters that can be overridden per instance.

use crate::graphics::Renderer;
use aur_utils::{Pool, PoolHandle};
use std::{
    any::Any,
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

#[doc(inline)]
pub use material::*;
mod material;

#[doc(inline)]
pub use mesh::*;
mod mesh;

#[doc(inline)]
pub use system::*;
mod system;

#[doc(inline)]
pub use transform::*;
mod transform;

/// Identifies a scene. Cheap to clone, handed to drivers so they know where they're displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneHandle {
    id: u32,
    label: Arc<str>,
}

impl SceneHandle {
    pub fn new(label: &str) -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene `{}` (#{})", self.label, self.id)
    }
}

/// Passed to [`SceneComponent::tick`].
pub struct TickContext<'a> {
    pub scene: &'a SceneHandle,
    pub renderer: &'a Renderer,
    /// Time since the previous tick, in seconds.
    pub delta: f32,
}

/// Passed to components when they get connected to external resources.
pub struct AttachContext<'a> {
    /// The containing scene, if the component is already placed in one.
    pub scene: Option<&'a SceneHandle>,
    pub renderer: &'a Renderer,
}

/// Anything that lives inside a [`Scene`].
pub trait SceneComponent: Any + Send + Sync {
    /// Called once per frame, on the scene thread.
    fn tick(&mut self, ctx: &TickContext) {
        let _ = ctx;
    }

    /// Called when the component is removed from its scene, or the scene is torn down.
    /// Must release every external resource the component holds.
    fn detach(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Typed handle to a component stored in a [`Scene`].
pub struct ComponentHandle<T> {
    raw: PoolHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentHandle<T> {
    pub fn raw(&self) -> PoolHandle {
        self.raw
    }
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentHandle<T> {}

impl<T> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle").field(&self.raw).finish()
    }
}

pub struct Scene {
    handle: SceneHandle,
    components: Pool<Box<dyn SceneComponent>>,
}

impl Scene {
    pub fn new(label: &str) -> Self {
        Self {
            handle: SceneHandle::new(label),
            components: Pool::new(),
        }
    }

    pub fn handle(&self) -> &SceneHandle {
        &self.handle
    }

    pub fn add<T: SceneComponent>(&mut self, component: T) -> ComponentHandle<T> {
        ComponentHandle {
            raw: self.components.allocate(Box::new(component)),
            _marker: PhantomData,
        }
    }

    pub fn get<T: SceneComponent>(&self, handle: ComponentHandle<T>) -> Option<&T> {
        self.components
            .try_get(handle.raw)
            .and_then(|c| c.as_any().downcast_ref())
    }

    pub fn get_mut<T: SceneComponent>(&mut self, handle: ComponentHandle<T>) -> Option<&mut T> {
        self.components
            .try_get_mut(handle.raw)
            .and_then(|c| c.as_any_mut().downcast_mut())
    }

    /// Like [`Scene::get_mut`], but also gives out the scene's handle, which is needed to attach
    /// components.
    pub fn get_with_handle<T: SceneComponent>(
        &mut self,
        handle: ComponentHandle<T>,
    ) -> Option<(&mut T, &SceneHandle)> {
        let component = self
            .components
            .try_get_mut(handle.raw)
            .and_then(|c| c.as_any_mut().downcast_mut())?;
        Some((component, &self.handle))
    }

    /// Detaches and drops a component. Returns `false` if the handle was stale.
    pub fn remove<T: SceneComponent>(&mut self, handle: ComponentHandle<T>) -> bool {
        if self.get::<T>(handle).is_none() {
            return false;
        }

        match self.components.deallocate(handle.raw) {
            Some(mut component) => {
                component.detach();
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, renderer: &Renderer, delta: f32) {
        let ctx = TickContext {
            scene: &self.handle,
            renderer,
            delta,
        };
        for component in self.components.iter_mut() {
            component.tick(&ctx);
        }
    }

    /// Detaches and drops every component.
    pub fn clear(&mut self) {
        for mut component in self.components.drain() {
            component.detach();
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// All scenes, stored in the global state as a read-write lockable resource.
#[derive(Default)]
pub struct World {
    pub scenes: Vec<Scene>,
}

impl World {
    pub fn add_scene(&mut self, scene: Scene) -> SceneHandle {
        let handle = scene.handle.clone();
        self.scenes.push(scene);
        handle
    }

    pub fn scene_mut(&mut self, handle: &SceneHandle) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.handle == *handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::{HeadlessDevice, RenderCommandQueue};
    use std::sync::atomic::AtomicBool;

    #[derive(Default)]
    struct Counter {
        ticks: u32,
        last_scene: Option<SceneHandle>,
        detached: Arc<AtomicBool>,
    }

    impl SceneComponent for Counter {
        fn tick(&mut self, ctx: &TickContext) {
            self.ticks += 1;
            self.last_scene = Some(ctx.scene.clone());
        }

        fn detach(&mut self) {
            self.detached.store(true, Ordering::Release);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Other;

    impl SceneComponent for Other {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(Arc::new(HeadlessDevice::new()), RenderCommandQueue::new())
    }

    #[test]
    fn scene_handles_are_unique() {
        let a = SceneHandle::new("same");
        let b = SceneHandle::new("same");
        assert_ne!(a, b);
        assert_eq!(a.label(), b.label());
    }

    #[test]
    fn ticks_reach_components() {
        let renderer = renderer();
        let mut scene = Scene::new("ticks");
        let counter = scene.add(Counter::default());
        scene.add(Other);

        scene.tick(&renderer, 0.016);
        scene.tick(&renderer, 0.016);

        let counter = scene.get(counter).unwrap();
        assert_eq!(counter.ticks, 2);
        assert_eq!(counter.last_scene.as_ref(), Some(scene.handle()));
    }

    #[test]
    fn removal_detaches() {
        let mut scene = Scene::new("removal");
        let detached = Arc::new(AtomicBool::new(false));
        let handle = scene.add(Counter {
            detached: detached.clone(),
            ..Default::default()
        });

        assert!(scene.remove(handle));
        assert!(detached.load(Ordering::Acquire));
        assert!(scene.get(handle).is_none());
        assert!(!scene.remove(handle));
        assert!(scene.is_empty());
    }

    #[test]
    fn handles_are_typed() {
        let mut scene = Scene::new("typed");
        let other = scene.add(Other);
        let wrong = ComponentHandle::<Counter> {
            raw: other.raw(),
            _marker: PhantomData,
        };

        assert!(scene.get(wrong).is_none());
        assert!(!scene.remove(wrong));
        assert_eq!(scene.len(), 1);
    }
}
