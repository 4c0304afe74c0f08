use std::collections::BTreeMap;

use geometry::mesh::Sprite;

use crate::renderer::{
    Geometry, LayerId, MeshHandle, OutlineFilter, RenderCommand, RenderFrame, ShaderKind,
    TextHandle, TextItem, UniformValue, Uniforms,
};

#[derive(Debug, Clone, PartialEq)]
enum EntryKind {
    Mesh(ShaderKind),
    Sprite,
}

/// Retained copy of what the renderer was last told about one mesh.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    kind: EntryKind,
    uniforms: Uniforms,
    z_index: i64,
    visible: bool,
    outline: Option<OutlineFilter>,
    vertex_count: usize,
}

impl Entry {
    fn new(kind: EntryKind, uniforms: Uniforms, z_index: i64, vertex_count: usize) -> Self {
        Self {
            kind,
            uniforms,
            z_index,
            visible: true,
            outline: None,
            vertex_count,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Mesh or sprite submissions and replacements.
    pub topology_submissions: u64,
    pub uniform_updates: u64,
    /// `set_uniform` calls that matched the retained value.
    pub skipped_uniform_updates: u64,
}

/// Authoritative owner of submitted meshes, uniforms and text.
///
/// Every mutation is recorded both in the retained state and as a queued
/// [`RenderCommand`]; the host drains the queue into a [`RenderFrame`].
/// Writes that would not change retained state queue nothing.
#[derive(Debug)]
pub struct MeshStore {
    layer: LayerId,
    visible: bool,
    next_mesh: u32,
    next_text: u32,
    meshes: BTreeMap<MeshHandle, Entry>,
    texts: BTreeMap<TextHandle, TextItem>,
    queue: Vec<RenderCommand>,
    stats: StoreStats,
}

impl MeshStore {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            visible: true,
            next_mesh: 0,
            next_text: 0,
            meshes: BTreeMap::new(),
            texts: BTreeMap::new(),
            queue: Vec::new(),
            stats: StoreStats::default(),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn is_layer_visible(&self) -> bool {
        self.visible
    }

    /// Returns true if the layer visibility changed.
    pub fn set_layer_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        self.queue.push(RenderCommand::SetLayerVisible {
            layer: self.layer,
            visible,
        });
        true
    }

    fn next_mesh_handle(&mut self) -> MeshHandle {
        let handle = MeshHandle::new(self.layer, self.next_mesh);
        self.next_mesh += 1;
        handle
    }

    pub fn submit(
        &mut self,
        shader: ShaderKind,
        geometry: Geometry,
        uniforms: Uniforms,
        z_index: i64,
    ) -> MeshHandle {
        let handle = self.next_mesh_handle();
        let entry = Entry::new(
            EntryKind::Mesh(shader),
            uniforms.clone(),
            z_index,
            geometry.vertex_count(),
        );
        self.meshes.insert(handle, entry);
        self.stats.topology_submissions += 1;
        self.queue.push(RenderCommand::SubmitMesh {
            handle,
            shader,
            geometry,
            uniforms,
            z_index,
        });
        handle
    }

    pub fn submit_sprite(&mut self, sprite: Sprite, z_index: i64) -> MeshHandle {
        let handle = self.next_mesh_handle();
        self.meshes
            .insert(handle, Entry::new(EntryKind::Sprite, Uniforms::new(), z_index, 4));
        self.stats.topology_submissions += 1;
        self.queue.push(RenderCommand::SubmitSprite {
            handle,
            sprite,
            z_index,
        });
        handle
    }

    /// Swaps the topology of a live mesh, keeping its uniforms and z-order.
    pub fn replace_mesh(&mut self, handle: MeshHandle, geometry: Geometry) -> bool {
        let Some(entry) = self.meshes.get_mut(&handle) else {
            return false;
        };
        entry.vertex_count = geometry.vertex_count();
        self.stats.topology_submissions += 1;
        self.queue
            .push(RenderCommand::ReplaceMesh { handle, geometry });
        true
    }

    /// Returns true when the value changed and an update was queued.
    pub fn set_uniform(&mut self, handle: MeshHandle, key: &'static str, value: UniformValue) -> bool {
        let Some(entry) = self.meshes.get_mut(&handle) else {
            return false;
        };
        if entry.uniforms.get(key) == Some(&value) {
            self.stats.skipped_uniform_updates += 1;
            return false;
        }
        entry.uniforms.insert(key, value);
        self.stats.uniform_updates += 1;
        self.queue
            .push(RenderCommand::UpdateUniform { handle, key, value });
        true
    }

    pub fn uniform(&self, handle: MeshHandle, key: &str) -> Option<UniformValue> {
        self.meshes.get(&handle)?.uniforms.get(key).copied()
    }

    /// Copy of the retained uniforms; callers snapshot from here.
    pub fn uniforms(&self, handle: MeshHandle) -> Option<&Uniforms> {
        self.meshes.get(&handle).map(|e| &e.uniforms)
    }

    pub fn z_index(&self, handle: MeshHandle) -> Option<i64> {
        self.meshes.get(&handle).map(|e| e.z_index)
    }

    pub fn set_z_index(&mut self, handle: MeshHandle, z_index: i64) -> bool {
        let Some(entry) = self.meshes.get_mut(&handle) else {
            return false;
        };
        if entry.z_index == z_index {
            return false;
        }
        entry.z_index = z_index;
        self.queue.push(RenderCommand::SetZIndex { handle, z_index });
        true
    }

    pub fn is_visible(&self, handle: MeshHandle) -> Option<bool> {
        self.meshes.get(&handle).map(|e| e.visible)
    }

    pub fn set_visible(&mut self, handle: MeshHandle, visible: bool) -> bool {
        let Some(entry) = self.meshes.get_mut(&handle) else {
            return false;
        };
        if entry.visible == visible {
            return false;
        }
        entry.visible = visible;
        self.queue.push(RenderCommand::SetVisible { handle, visible });
        true
    }

    pub fn outline_filter(&self, handle: MeshHandle) -> Option<OutlineFilter> {
        self.meshes.get(&handle)?.outline
    }

    pub fn set_outline_filter(&mut self, handle: MeshHandle, filter: Option<OutlineFilter>) -> bool {
        let Some(entry) = self.meshes.get_mut(&handle) else {
            return false;
        };
        if entry.kind != EntryKind::Sprite || entry.outline == filter {
            return false;
        }
        entry.outline = filter;
        self.queue
            .push(RenderCommand::SetOutlineFilter { handle, filter });
        true
    }

    pub fn shader(&self, handle: MeshHandle) -> Option<ShaderKind> {
        match self.meshes.get(&handle)?.kind {
            EntryKind::Mesh(shader) => Some(shader),
            EntryKind::Sprite => None,
        }
    }

    pub fn vertex_count(&self, handle: MeshHandle) -> Option<usize> {
        self.meshes.get(&handle).map(|e| e.vertex_count)
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: MeshHandle) -> bool {
        if self.meshes.remove(&handle).is_none() {
            return false;
        }
        self.queue.push(RenderCommand::RemoveMesh { handle });
        true
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Live mesh and sprite handles in submission order.
    pub fn handles(&self) -> impl Iterator<Item = MeshHandle> + '_ {
        self.meshes.keys().copied()
    }

    pub fn submit_text(&mut self, item: TextItem) -> TextHandle {
        let handle = TextHandle::new(self.layer, self.next_text);
        self.next_text += 1;
        self.texts.insert(handle, item.clone());
        self.queue.push(RenderCommand::SubmitText { handle, item });
        handle
    }

    pub fn text(&self, handle: TextHandle) -> Option<&TextItem> {
        self.texts.get(&handle)
    }

    /// Applies `edit` to the retained item and queues an update if it changed.
    pub fn update_text(&mut self, handle: TextHandle, edit: impl FnOnce(&mut TextItem)) -> bool {
        let Some(item) = self.texts.get_mut(&handle) else {
            return false;
        };
        let before = item.clone();
        edit(item);
        if *item == before {
            return false;
        }
        self.queue.push(RenderCommand::UpdateText {
            handle,
            item: item.clone(),
        });
        true
    }

    pub fn remove_text(&mut self, handle: TextHandle) -> bool {
        if self.texts.remove(&handle).is_none() {
            return false;
        }
        self.queue.push(RenderCommand::RemoveText { handle });
        true
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    pub fn request_redraw(&mut self) {
        self.queue.push(RenderCommand::RequestRedraw);
    }

    /// Removes every mesh and text item. Handles are not reused.
    pub fn clear(&mut self) {
        let meshes = std::mem::take(&mut self.meshes);
        for handle in meshes.into_keys() {
            self.queue.push(RenderCommand::RemoveMesh { handle });
        }
        let texts = std::mem::take(&mut self.texts);
        for handle in texts.into_keys() {
            self.queue.push(RenderCommand::RemoveText { handle });
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn drain(&mut self) -> RenderFrame {
        RenderFrame {
            commands: std::mem::take(&mut self.queue),
        }
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::{MeshStore, StoreStats};
    use crate::renderer::{
        Geometry, LayerId, OutlineFilter, RenderCommand, ShaderKind, TextItem, UniformValue,
        Uniforms,
    };
    use foundation::math::Vec2;
    use geometry::mesh::{MeshData, Sprite};
    use pretty_assertions::assert_eq;

    fn quad() -> Geometry {
        Geometry::Plain(MeshData {
            vertices: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            triangles: vec![0, 1, 2, 0, 2, 3],
        })
    }

    fn status(value: i32) -> Uniforms {
        let mut u = Uniforms::new();
        u.insert("status", UniformValue::Int(value));
        u
    }

    #[test]
    fn unchanged_uniform_queues_nothing() {
        let mut store = MeshStore::new(LayerId(7));
        let h = store.submit(ShaderKind::Fill, quad(), status(0), 5);
        store.drain();

        assert!(!store.set_uniform(h, "status", UniformValue::Int(0)));
        assert_eq!(store.pending(), 0);
        assert!(store.set_uniform(h, "status", UniformValue::Int(2)));
        assert_eq!(store.uniform(h, "status"), Some(UniformValue::Int(2)));

        let frame = store.drain();
        assert_eq!(
            frame.commands,
            vec![RenderCommand::UpdateUniform {
                handle: h,
                key: "status",
                value: UniformValue::Int(2),
            }]
        );
        assert_eq!(
            store.stats(),
            StoreStats {
                topology_submissions: 1,
                uniform_updates: 1,
                skipped_uniform_updates: 1,
            }
        );
    }

    #[test]
    fn replace_keeps_uniforms_and_counts_topology() {
        let mut store = MeshStore::new(LayerId(7));
        let h = store.submit(ShaderKind::Marker, quad(), status(1), 0);
        assert!(store.replace_mesh(h, quad()));
        assert_eq!(store.uniform(h, "status"), Some(UniformValue::Int(1)));
        assert_eq!(store.stats().topology_submissions, 2);
        assert_eq!(store.vertex_count(h), Some(4));
    }

    #[test]
    fn unknown_handles_are_ignored() {
        let mut store = MeshStore::new(LayerId(7));
        let h = store.submit(ShaderKind::Fill, quad(), Uniforms::new(), 0);
        assert!(store.remove(h));
        assert!(!store.remove(h));
        assert!(!store.set_uniform(h, "status", UniformValue::Int(1)));
        assert!(!store.set_z_index(h, 3));
        assert_eq!(store.z_index(h), None);
    }

    #[test]
    fn z_index_and_visibility_are_retained() {
        let mut store = MeshStore::new(LayerId(7));
        let h = store.submit(ShaderKind::Outline, quad(), Uniforms::new(), 10);
        assert!(!store.set_z_index(h, 10));
        assert!(store.set_z_index(h, 10010));
        assert_eq!(store.z_index(h), Some(10010));
        assert!(store.set_visible(h, false));
        assert!(!store.set_visible(h, false));
        assert_eq!(store.is_visible(h), Some(false));
    }

    #[test]
    fn outline_filter_applies_to_sprites_only() {
        let mut store = MeshStore::new(LayerId(7));
        let mesh = store.submit(ShaderKind::Marker, quad(), Uniforms::new(), 0);
        let sprite = store.submit_sprite(
            Sprite {
                image: "pin.png".to_string(),
                position: Vec2::new(1.0, 1.0),
                scale: 1.0,
            },
            0,
        );
        let filter = OutlineFilter {
            color: [0.0, 1.0, 1.0, 1.0],
            thickness: 4.0,
        };
        assert!(!store.set_outline_filter(mesh, Some(filter)));
        assert!(store.set_outline_filter(sprite, Some(filter)));
        assert_eq!(store.outline_filter(sprite), Some(filter));
        assert_eq!(store.shader(sprite), None);
        assert_eq!(store.shader(mesh), Some(ShaderKind::Marker));
    }

    #[test]
    fn text_updates_only_when_changed() {
        let mut store = MeshStore::new(LayerId(7));
        let t = store.submit_text(TextItem::new("A-1", Vec2::new(0.0, 0.0)));
        store.drain();

        assert!(!store.update_text(t, |item| item.visible = true));
        assert!(store.update_text(t, |item| item.scale = 0.5));
        assert_eq!(store.text(t).map(|i| i.scale), Some(0.5));
        assert_eq!(store.drain().len(), 1);
    }

    #[test]
    fn layer_visibility_is_one_command() {
        let mut store = MeshStore::new(LayerId(3));
        store.submit(ShaderKind::Fill, quad(), Uniforms::new(), 0);
        store.drain();
        assert!(store.set_layer_visible(false));
        assert!(!store.set_layer_visible(false));
        assert_eq!(
            store.drain().commands,
            vec![RenderCommand::SetLayerVisible {
                layer: LayerId(3),
                visible: false,
            }]
        );
        assert!(!store.is_layer_visible());
    }

    #[test]
    fn clear_removes_everything() {
        let mut store = MeshStore::new(LayerId(7));
        store.submit(ShaderKind::Fill, quad(), Uniforms::new(), 0);
        store.submit(ShaderKind::Fill, quad(), Uniforms::new(), 1);
        store.submit_text(TextItem::new("x", Vec2::ZERO));
        store.drain();

        store.clear();
        assert_eq!(store.mesh_count(), 0);
        assert_eq!(store.text_count(), 0);
        assert_eq!(store.drain().len(), 3);

        let h = store.submit(ShaderKind::Fill, quad(), Uniforms::new(), 0);
        assert_eq!(h.index, 2);
        assert_eq!(h.layer, LayerId(7));
    }
}
