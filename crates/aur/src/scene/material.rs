use crate::graphics::TextureHandle;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Index of a texture parameter within the material that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureParameterSlot(pub usize);

/// Read access to a material's parameters.
///
/// Lookup is by name, since the name is the only thing a mesh's material and the code wanting to
/// feed it data can agree on.
pub trait Material: Send + Sync {
    fn label(&self) -> &str;

    /// Looks up a texture parameter declared by this material, or inherited from its parent.
    fn find_texture_parameter(&self, name: &str) -> Option<TextureParameterSlot>;

    /// Current value of a texture parameter. [`None`] means nothing is bound.
    fn texture_parameter(&self, slot: TextureParameterSlot) -> Option<TextureHandle>;
}

struct TextureParameter {
    name: String,
    default: Option<TextureHandle>,
}

/// A shared, immutable material.
pub struct MaterialAsset {
    label: String,
    texture_parameters: Vec<TextureParameter>,
}

impl MaterialAsset {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            texture_parameters: Vec::new(),
        }
    }

    /// Declares a texture parameter with an optional default value.
    pub fn with_texture_parameter(
        mut self,
        name: impl Into<String>,
        default: Option<TextureHandle>,
    ) -> Self {
        self.texture_parameters.push(TextureParameter {
            name: name.into(),
            default,
        });
        self
    }

    pub fn build(self) -> Arc<dyn Material> {
        Arc::new(self)
    }
}

impl Material for MaterialAsset {
    fn label(&self) -> &str {
        &self.label
    }

    fn find_texture_parameter(&self, name: &str) -> Option<TextureParameterSlot> {
        self.texture_parameters
            .iter()
            .position(|p| p.name == name)
            .map(TextureParameterSlot)
    }

    fn texture_parameter(&self, slot: TextureParameterSlot) -> Option<TextureHandle> {
        self.texture_parameters.get(slot.0)?.default.clone()
    }
}

/// A mutable child of another material. Parameters can be overridden without affecting other
/// users of the parent.
pub struct MaterialInstance {
    label: String,
    parent: Arc<dyn Material>,
    overrides: AHashMap<TextureParameterSlot, TextureHandle>,
}

impl MaterialInstance {
    pub fn new(parent: Arc<dyn Material>) -> Self {
        Self {
            label: format!("{} (instance)", parent.label()),
            parent,
            overrides: AHashMap::new(),
        }
    }

    /// Overrides the value of a parameter declared by the parent. Returns `false` if no parameter
    /// of that name exists.
    pub fn set_texture_parameter(&mut self, name: &str, texture: TextureHandle) -> bool {
        match self.parent.find_texture_parameter(name) {
            Some(slot) => {
                self.overrides.insert(slot, texture);
                true
            }
            None => false,
        }
    }

    /// Reverts a parameter back to the parent's value.
    pub fn clear_texture_parameter(&mut self, name: &str) {
        if let Some(slot) = self.parent.find_texture_parameter(name) {
            self.overrides.remove(&slot);
        }
    }
}

impl Material for MaterialInstance {
    fn label(&self) -> &str {
        &self.label
    }

    fn find_texture_parameter(&self, name: &str) -> Option<TextureParameterSlot> {
        self.parent.find_texture_parameter(name)
    }

    fn texture_parameter(&self, slot: TextureParameterSlot) -> Option<TextureHandle> {
        self.overrides
            .get(&slot)
            .cloned()
            .or_else(|| self.parent.texture_parameter(slot))
    }
}

/// What a mesh's material slot points at.
#[derive(Clone)]
pub enum MaterialRef {
    Shared(Arc<dyn Material>),
    /// A per-object instance. The lock is there because the render thread may read parameters
    /// while the scene thread rebinds them.
    Instance(Arc<RwLock<MaterialInstance>>),
}

impl MaterialRef {
    pub fn is_instance(&self) -> bool {
        matches!(self, MaterialRef::Instance(_))
    }

    pub fn as_instance(&self) -> Option<&Arc<RwLock<MaterialInstance>>> {
        match self {
            MaterialRef::Instance(instance) => Some(instance),
            MaterialRef::Shared(_) => None,
        }
    }

    pub fn find_texture_parameter(&self, name: &str) -> Option<TextureParameterSlot> {
        match self {
            MaterialRef::Shared(material) => material.find_texture_parameter(name),
            MaterialRef::Instance(instance) => instance.read().find_texture_parameter(name),
        }
    }

    /// Current value of a named texture parameter.
    pub fn texture_parameter(&self, name: &str) -> Option<TextureHandle> {
        match self {
            MaterialRef::Shared(material) => {
                material.texture_parameter(material.find_texture_parameter(name)?)
            }
            MaterialRef::Instance(instance) => {
                let instance = instance.read();
                instance.texture_parameter(instance.find_texture_parameter(name)?)
            }
        }
    }
}
