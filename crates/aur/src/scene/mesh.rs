use super::MaterialRef;
use smallvec::SmallVec;

/// A renderable mesh. Only its material slots matter here, the geometry is owned by whatever
/// draws the scene.
#[derive(Clone)]
pub struct MeshComponent {
    pub label: String,
    /// Materials in slot order.
    pub materials: SmallVec<[MaterialRef; 2]>,
}

impl MeshComponent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            materials: SmallVec::new(),
        }
    }

    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.materials.push(material);
        self
    }

    pub fn material(&self, slot: usize) -> Option<&MaterialRef> {
        self.materials.get(slot)
    }

    /// Replaces the material in a slot, returning the previous one.
    pub fn set_material(&mut self, slot: usize, material: MaterialRef) -> Option<MaterialRef> {
        self.materials
            .get_mut(slot)
            .map(|current| std::mem::replace(current, material))
    }
}
