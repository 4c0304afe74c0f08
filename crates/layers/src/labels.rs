//! Feature labels.
//!
//! Each logical feature registers one or more candidate anchors (one per
//! polygon part) weighted by mass. The baseline draws a single label at the
//! heaviest candidate. With decluttering enabled every candidate gets a text
//! item and `resize` reveals candidates that sit far enough from the heavier
//! ones already shown, so multi-part features gain labels as the map zooms in.

use std::collections::HashMap;

use foundation::math::Vec2;
use foundation::math::stable_total_cmp_f64;
use gpu::{MeshStore, TextHandle, TextItem};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layer::MapView;
use crate::symbology::LabelLocation;

pub const LABEL_Z_INDEX: i64 = 100_000;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelCandidate {
    pub position: Vec2,
    pub mass: f64,
}

impl LabelCandidate {
    pub fn new(position: Vec2, mass: f64) -> Self {
        Self { position, mass }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelOptions {
    /// Text scale when the resize curve yields 1.
    pub base_scale: f64,
    pub z_index: i64,
    pub color: [f32; 4],
    /// Minimum distance between labels of one feature, in label units. The
    /// distance in projected units is this times the current scale.
    pub declutter: Option<f64>,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            base_scale: 1.0,
            z_index: LABEL_Z_INDEX,
            color: [0.27, 0.27, 0.27, 1.0],
            declutter: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    /// Heaviest first; ties keep insertion order.
    candidates: Vec<LabelCandidate>,
    location: LabelLocation,
    handles: Vec<TextHandle>,
    /// Drawn anchor of each handle, after the location override.
    anchors: Vec<Vec2>,
}

#[derive(Debug, Clone)]
pub struct LabelManager {
    options: LabelOptions,
    entries: Vec<Entry>,
    scale: f64,
    drawn: bool,
    visible: bool,
}

impl LabelManager {
    pub fn new(options: LabelOptions) -> Self {
        Self {
            options,
            entries: Vec::new(),
            scale: 1.0,
            drawn: false,
            visible: true,
        }
    }

    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    pub fn set_base_scale(&mut self, base_scale: f64) {
        self.options.base_scale = base_scale;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Registers a feature label. Features without candidates are ignored.
    pub fn add_label(
        &mut self,
        name: impl Into<String>,
        mut candidates: Vec<LabelCandidate>,
        location: LabelLocation,
    ) {
        if candidates.is_empty() {
            return;
        }
        candidates.sort_by(|a, b| stable_total_cmp_f64(b.mass, a.mass));
        self.entries.push(Entry {
            name: name.into(),
            candidates,
            location,
            handles: Vec::new(),
            anchors: Vec::new(),
        });
    }

    /// Anchor of the label drawn for feature `index` in the baseline layout.
    pub fn primary_position(&self, index: usize) -> Option<Vec2> {
        self.entries
            .get(index)
            .and_then(|e| e.candidates.first())
            .map(|c| c.position)
    }

    /// Submits text items for every registered label, replacing earlier ones.
    pub fn draw(&mut self, store: &mut MeshStore, view: &dyn MapView, scale: f64) {
        self.remove_texts(store);
        let text_scale = self.text_scale(scale);
        let per_entry = if self.options.declutter.is_some() {
            usize::MAX
        } else {
            1
        };

        for entry in &mut self.entries {
            let rotation = entry.location.angle.unwrap_or(0.0).to_radians();
            for candidate in entry.candidates.iter().take(per_entry) {
                let position = resolve_position(view, candidate.position, &entry.location);
                let mut item = TextItem::new(entry.name.clone(), position);
                item.rotation = rotation;
                item.scale = text_scale;
                item.color = self.options.color;
                item.z_index = self.options.z_index;
                item.visible = self.visible;
                entry.handles.push(store.submit_text(item));
                entry.anchors.push(position);
            }
        }
        self.drawn = true;
        self.apply_declutter(store, scale);
    }

    pub fn resize(&mut self, store: &mut MeshStore, scale: f64) {
        if !self.drawn {
            return;
        }
        let text_scale = self.text_scale(scale);
        trace!(scale, text_scale, "label resize");
        for entry in &self.entries {
            for handle in &entry.handles {
                store.update_text(*handle, |t| t.scale = text_scale);
            }
        }
        self.apply_declutter(store, scale);
    }

    pub fn show_labels(&mut self, store: &mut MeshStore) {
        self.visible = true;
        if self.options.declutter.is_some() {
            let scale = self.scale;
            self.apply_declutter(store, scale);
            return;
        }
        self.set_all_visible(store, true);
    }

    pub fn hide_labels(&mut self, store: &mut MeshStore) {
        self.visible = false;
        self.set_all_visible(store, false);
    }

    pub fn clear(&mut self, store: &mut MeshStore) {
        self.remove_texts(store);
        self.entries.clear();
        self.drawn = false;
    }

    /// Number of text items currently shown.
    pub fn visible_count(&self, store: &MeshStore) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.handles.iter())
            .filter(|h| store.text(**h).is_some_and(|t| t.visible))
            .count()
    }

    fn text_scale(&mut self, scale: f64) -> f64 {
        self.scale = scale;
        scale * self.options.base_scale * 0.5
    }

    fn set_all_visible(&self, store: &mut MeshStore, visible: bool) {
        for entry in &self.entries {
            for handle in &entry.handles {
                store.update_text(*handle, |t| t.visible = visible);
            }
        }
    }

    fn remove_texts(&mut self, store: &mut MeshStore) {
        for entry in &mut self.entries {
            for handle in entry.handles.drain(..) {
                store.remove_text(handle);
            }
            entry.anchors.clear();
        }
    }

    fn apply_declutter(&self, store: &mut MeshStore, scale: f64) {
        let Some(separation) = self.options.declutter else {
            return;
        };
        let min_distance = separation * scale;
        for entry in &self.entries {
            let mut placed = Placement::new(min_distance);
            for (anchor, handle) in entry.anchors.iter().zip(&entry.handles) {
                let accepted = placed.try_place(*anchor);
                let visible = accepted && self.visible;
                store.update_text(*handle, |t| t.visible = visible);
            }
        }
    }
}

fn resolve_position(view: &dyn MapView, position: Vec2, location: &LabelLocation) -> Vec2 {
    if !location.moves_anchor() {
        return position;
    }
    let (lat, lng) = view.unproject(position);
    view.project(
        lat + location.lat.unwrap_or(0.0),
        lng + location.lng.unwrap_or(0.0),
    )
}

/// Grid of accepted anchors with cells as wide as the minimum distance, so a
/// conflict can only sit in the 3x3 block around a candidate.
struct Placement {
    min_distance: f64,
    cells: HashMap<(i64, i64), Vec<Vec2>>,
}

impl Placement {
    fn new(min_distance: f64) -> Self {
        Self {
            min_distance,
            cells: HashMap::new(),
        }
    }

    fn try_place(&mut self, p: Vec2) -> bool {
        if self.min_distance.is_nan() || self.min_distance <= 0.0 {
            return true;
        }
        let (cx, cy) = self.cell_of(p);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(points) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                if points.iter().any(|q| q.distance(p) <= self.min_distance) {
                    return false;
                }
            }
        }
        self.cells.entry((cx, cy)).or_default().push(p);
        true
    }

    fn cell_of(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x / self.min_distance).floor() as i64,
            (p.y / self.min_distance).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelCandidate, LabelManager, LabelOptions};
    use crate::layer::{FlatView, MapView};
    use crate::symbology::LabelLocation;
    use foundation::math::Vec2;
    use gpu::{LayerId, MeshStore, RenderCommand};
    use pretty_assertions::assert_eq;

    fn parts() -> Vec<LabelCandidate> {
        vec![
            LabelCandidate::new(Vec2::new(0.0, 0.0), 1.0),
            LabelCandidate::new(Vec2::new(10.0, 0.0), 5.0),
            LabelCandidate::new(Vec2::new(10.5, 0.0), 2.0),
        ]
    }

    #[test]
    fn baseline_draws_heaviest_part_only() {
        let mut store = MeshStore::new(LayerId(1));
        let view = FlatView::new(1.0, 10.0);
        let mut labels = LabelManager::new(LabelOptions {
            base_scale: 0.15,
            ..LabelOptions::default()
        });
        labels.add_label("Troll", parts(), LabelLocation::default());
        labels.add_label("Empty", Vec::new(), LabelLocation::default());
        assert_eq!(labels.len(), 1);

        labels.draw(&mut store, &view, 1.0);
        assert_eq!(store.text_count(), 1);
        assert_eq!(labels.primary_position(0), Some(Vec2::new(10.0, 0.0)));

        let frame = store.drain();
        let Some(RenderCommand::SubmitText { item, .. }) = frame.commands.first() else {
            panic!("expected a text submission");
        };
        assert_eq!(item.text, "Troll");
        assert_eq!(item.position, Vec2::new(10.0, 0.0));
        assert!((item.scale - 0.075).abs() < 1e-12);
        assert_eq!(item.z_index, super::LABEL_Z_INDEX);
    }

    #[test]
    fn location_override_shifts_and_rotates() {
        let mut store = MeshStore::new(LayerId(1));
        let view = FlatView::new(100.0, 10.0);
        let mut labels = LabelManager::new(LabelOptions::default());
        labels.add_label(
            "A",
            vec![LabelCandidate::new(Vec2::new(100.0, -200.0), 1.0)],
            LabelLocation {
                lat: Some(1.0),
                lng: Some(-0.5),
                angle: Some(90.0),
            },
        );
        labels.draw(&mut store, &view, 1.0);
        let frame = store.drain();
        let Some(RenderCommand::SubmitText { item, .. }) = frame.commands.first() else {
            panic!("expected a text submission");
        };
        assert!(item.position.distance(Vec2::new(50.0, -300.0)) < 1e-9);
        assert!((item.rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn resize_updates_scale_without_resubmitting() {
        let mut store = MeshStore::new(LayerId(1));
        let view = FlatView::new(1.0, 10.0);
        let mut labels = LabelManager::new(LabelOptions::default());
        labels.resize(&mut store, 2.0);
        assert_eq!(store.pending(), 0);

        labels.add_label("A", parts(), LabelLocation::default());
        labels.draw(&mut store, &view, 1.0);
        store.drain();
        labels.resize(&mut store, 2.0);
        let frame = store.drain();
        assert_eq!(frame.len(), 1);
        assert!(matches!(frame.commands[0], RenderCommand::UpdateText { .. }));
    }

    #[test]
    fn hide_and_show_toggle_every_label() {
        let mut store = MeshStore::new(LayerId(1));
        let view = FlatView::new(1.0, 10.0);
        let mut labels = LabelManager::new(LabelOptions::default());
        labels.add_label("A", parts(), LabelLocation::default());
        labels.add_label("B", parts(), LabelLocation::default());
        labels.draw(&mut store, &view, 1.0);
        assert_eq!(labels.visible_count(&store), 2);
        labels.hide_labels(&mut store);
        assert_eq!(labels.visible_count(&store), 0);
        labels.show_labels(&mut store);
        assert_eq!(labels.visible_count(&store), 2);
        labels.clear(&mut store);
        assert_eq!(store.text_count(), 0);
        assert!(!labels.is_drawn());
    }

    #[test]
    fn declutter_reveals_parts_as_scale_shrinks() {
        let mut store = MeshStore::new(LayerId(1));
        let view = FlatView::new(1.0, 10.0);
        let mut labels = LabelManager::new(LabelOptions {
            declutter: Some(20.0),
            ..LabelOptions::default()
        });
        labels.add_label("Multi", parts(), LabelLocation::default());

        // Separation 20: only the heaviest part fits.
        labels.draw(&mut store, &view, 1.0);
        assert_eq!(store.text_count(), 3);
        assert_eq!(labels.visible_count(&store), 1);

        // Separation 2: the part 10 units away appears, the one 0.5 away does not.
        labels.resize(&mut store, 0.1);
        assert_eq!(labels.visible_count(&store), 2);

        // Separation 0.2: all three.
        labels.resize(&mut store, 0.01);
        assert_eq!(labels.visible_count(&store), 3);

        labels.hide_labels(&mut store);
        assert_eq!(labels.visible_count(&store), 0);
        labels.show_labels(&mut store);
        assert_eq!(labels.visible_count(&store), 3);
    }

    /// Longitude spacing grows with latitude, so an anchor offset changes
    /// the distance between parts.
    struct WideningView;

    impl MapView for WideningView {
        fn project(&self, lat: f64, lng: f64) -> Vec2 {
            Vec2::new(lng * (1.0 + lat), -lat)
        }

        fn unproject(&self, point: Vec2) -> (f64, f64) {
            let lat = -point.y;
            (lat, point.x / (1.0 + lat))
        }

        fn current_zoom(&self) -> f64 {
            10.0
        }
    }

    #[test]
    fn declutter_measures_the_moved_anchors() {
        let mut store = MeshStore::new(LayerId(1));
        let mut labels = LabelManager::new(LabelOptions {
            declutter: Some(15.0),
            ..LabelOptions::default()
        });
        let pair = vec![
            LabelCandidate::new(Vec2::new(0.0, 0.0), 2.0),
            LabelCandidate::new(Vec2::new(10.0, 0.0), 1.0),
        ];
        labels.add_label("Near", pair.clone(), LabelLocation::default());
        let moved = LabelLocation {
            lat: Some(1.0),
            ..LabelLocation::default()
        };
        labels.add_label("Moved", pair, moved);

        // Parts sit 10 apart as given and 20 apart once moved north.
        labels.draw(&mut store, &WideningView, 1.0);
        assert_eq!(labels.visible_count(&store), 3);
        let moved_anchor = store
            .text(labels.entries[1].handles[1])
            .map(|t| t.position);
        assert_eq!(moved_anchor, Some(Vec2::new(20.0, -1.0)));
    }
}
