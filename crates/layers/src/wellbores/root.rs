use foundation::math::Vec2;
use gpu::{MeshHandle, MeshStore, UniformValue, Uniforms};

use super::data::WellboreData;
use super::group::Group;
use super::label::{LabelLayout, at_root};

pub const ROOT_RADIUS: &str = "rootRadius";
pub const ROOT_ACTIVE: &str = "active";
pub const ROOT_SELECTED: &str = "selected";

pub fn root_uniforms(radius: f64) -> Uniforms {
    let mut u = Uniforms::new();
    u.insert(ROOT_RADIUS, UniformValue::Float(radius as f32));
    u.insert(ROOT_ACTIVE, UniformValue::Bool(true));
    u.insert(ROOT_SELECTED, UniformValue::Bool(false));
    u
}

/// Shared origin of one or more wellbores.
#[derive(Debug, Clone, PartialEq)]
pub struct RootData {
    pub position: Vec2,
    /// Indices into the module's wellbore list.
    pub wellbores: Vec<usize>,
    pub mesh: Option<MeshHandle>,
    active: bool,
    selected: bool,
}

impl RootData {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            wellbores: Vec::new(),
            mesh: None,
            active: true,
            selected: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Re-derives the aggregate state from the members and restacks the
    /// root-attached labels when it changed or when `force` is set.
    pub fn recalculate(
        &mut self,
        store: &mut MeshStore,
        wellbores: &[WellboreData],
        groups: &[Group],
        layout: &LabelLayout,
        force: bool,
    ) -> bool {
        let members = || self.wellbores.iter().filter_map(|&i| wellbores.get(i));
        let active = members().any(|w| groups.get(w.group).is_some_and(|g| w.is_active(g)));
        let selected = members().any(WellboreData::is_selected);
        let changed = active != self.active || selected != self.selected;
        self.active = active;
        self.selected = selected;

        if let Some(mesh) = self.mesh {
            store.set_uniform(mesh, ROOT_ACTIVE, UniformValue::Bool(active));
            store.set_uniform(mesh, ROOT_SELECTED, UniformValue::Bool(selected));
        }
        if changed || force {
            self.stack_labels(store, wellbores, layout);
        }
        changed
    }

    /// Places visible root-attached labels in member order.
    pub fn stack_labels(&self, store: &mut MeshStore, wellbores: &[WellboreData], layout: &LabelLayout) {
        let mut index = 0;
        for w in self.wellbores.iter().filter_map(|&i| wellbores.get(i)) {
            let Some(handle) = w.label.handle else {
                continue;
            };
            if !w.label.attach_to_root || !w.label_visible(store) {
                continue;
            }
            at_root(self.position, index, layout).apply(store, handle, layout.scale);
            index += 1;
        }
    }
}
