use std::rc::Rc;

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{TickConfig, WellboreMeshBuilder, root_quad};
use geometry::{Interval, PathInterpolator, process_intervals, reduce};
use gpu::{
    Geometry, LayerId, MeshStore, RenderFrame, ShaderKind, TextItem, UniformValue,
};
use runtime::DebugSink;
use scene::{EmphasisTarget, Highlighter, LineDictionary, PointDictionary, SelectionSet};
use tracing::{debug, trace, warn};

use crate::colors::{ColorError, hex_rgba};
use crate::layer::{
    DragState, FeatureHit, Layer, MapView, PointerEvent, PointerKind, PointerOutcome,
};

use super::config::WellboreConfig;
use super::data::{
    COLOR_BY_LOG, COMPLETION_VISIBLE, FilterStatus, HIDE_PATH_WITHOUT_INTERVAL, SHADE_WELLBORE,
    SourceData, WELLBORE_VISIBLE, WellboreData, WellboreStatus,
};
use super::group::{ActiveFilter, Filter, FilterMode, Group, GroupOptions, GroupState};
use super::label::{LabelLayout, along_path};
use super::root::{ROOT_RADIUS, RootData, root_uniforms};

pub const WELLBORES: &str = "wellbores";

/// Cell size of the root lookup tiers, projected units.
const ROOT_DICT_CELLS: (f64, f64, usize) = (0.5, 8.0, 4);
const PATH_DICT_CELL: f64 = 2.0;

/// One wellbore under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct WellboreEventData {
    pub group: String,
    pub data: Rc<SourceData>,
    /// Relative position along the path closest to the pointer.
    pub relative: Option<f64>,
    /// Completion interval at that position.
    pub interval: Option<Interval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightEvent {
    /// False when the pointer stayed on the same wellbores.
    pub changed: bool,
    pub event_data: Vec<WellboreEventData>,
}

impl HighlightEvent {
    pub fn count(&self) -> usize {
        self.event_data.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WellboreEvent {
    HighlightOn(HighlightEvent),
    HighlightOff,
}

/// Emphasized set: one root and the wellbores hit under it.
#[derive(Debug, Clone, PartialEq)]
struct HighlightKey {
    root: usize,
    wellbores: Vec<usize>,
}

struct WellboreTarget<'a> {
    store: &'a mut MeshStore,
    wellbores: &'a mut [WellboreData],
    groups: &'a [Group],
}

impl EmphasisTarget for WellboreTarget<'_> {
    type Key = HighlightKey;
    type Snapshot = Vec<WellboreStatus>;

    fn capture(&self, key: &HighlightKey) -> Option<Vec<WellboreStatus>> {
        if key.wellbores.is_empty() {
            return None;
        }
        key.wellbores
            .iter()
            .map(|&i| {
                let w = self.wellbores.get(i)?;
                let group = self.groups.get(w.group)?;
                w.is_interactable(group).then(|| w.status())
            })
            .collect()
    }

    fn emphasize(&mut self, key: &HighlightKey) {
        let multiple = key.wellbores.len() > 1;
        for &i in &key.wellbores {
            let Some(w) = self.wellbores.get_mut(i) else {
                continue;
            };
            if let Some(group) = self.groups.get(w.group) {
                w.set_highlight(self.store, group, true, multiple);
            }
        }
    }

    fn restore(&mut self, key: &HighlightKey, snapshot: Vec<WellboreStatus>) {
        for (&i, status) in key.wellbores.iter().zip(snapshot) {
            let Some(w) = self.wellbores.get_mut(i) else {
                continue;
            };
            if w.is_selected() {
                continue;
            }
            if let Some(group) = self.groups.get(w.group) {
                w.restore_status(self.store, group, status);
            }
        }
    }
}

/// What a pointer position resolved to.
struct PositionHit {
    root: usize,
    wellbores: Vec<usize>,
    relative: Option<f64>,
}

/// Wellbore facade: groups, roots, path meshes, labels, filters, highlight
/// and selection over one [`MeshStore`].
pub struct WellboreModule {
    config: WellboreConfig,
    store: MeshStore,
    debug: DebugSink,
    groups: Vec<Group>,
    wellbores: Vec<WellboreData>,
    roots: Vec<RootData>,
    root_dict: PointDictionary<usize>,
    path_dict: LineDictionary<usize>,
    highlight: Highlighter<HighlightKey, Vec<WellboreStatus>>,
    selected: SelectionSet,
    drag: DragState,
    zoom: Option<f64>,
    labels_visible: bool,
    events: Vec<WellboreEvent>,
}

impl WellboreModule {
    pub fn new(layer: LayerId, config: WellboreConfig, debug: DebugSink) -> Self {
        let (min_cell, max_cell, tiers) = ROOT_DICT_CELLS;
        Self {
            config,
            store: MeshStore::new(layer),
            debug,
            groups: Vec::new(),
            wellbores: Vec::new(),
            roots: Vec::new(),
            root_dict: PointDictionary::new(min_cell, max_cell, tiers),
            path_dict: LineDictionary::new(PATH_DICT_CELL),
            highlight: Highlighter::new(),
            selected: SelectionSet::new(),
            drag: DragState::default(),
            zoom: None,
            labels_visible: false,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &WellboreConfig {
        &self.config
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn wellbores(&self) -> &[WellboreData] {
        &self.wellbores
    }

    pub fn roots(&self) -> &[RootData] {
        &self.roots
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.wellbores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wellbores.is_empty()
    }

    pub fn group(&self, key: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn group_mut(&mut self, key: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.key == key)
    }

    fn group_index(&self, key: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.key == key)
    }

    /// Creates the group if it does not exist yet; existing groups keep
    /// their options.
    pub fn register_group(&mut self, key: &str, options: GroupOptions) -> &mut Group {
        let index = match self.group_index(key) {
            Some(index) => index,
            None => {
                self.groups.push(Group::new(key, options));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    /// Host-side colormap texture of a group.
    pub fn log_colormap(&self, key: &str) -> Option<Result<Vec<u8>, ColorError>> {
        self.group(key).map(Group::colormap_texture)
    }

    fn layout(&self) -> LabelLayout {
        LabelLayout {
            scale: self.label_scale(),
            config: self.config.label,
        }
    }

    fn label_scale(&self) -> f64 {
        let resize = &self.config.label_resize;
        self.zoom.map_or(resize.min.scale, |z| resize.radius(z))
    }

    fn root_radius(&self) -> f64 {
        self.zoom
            .map_or(self.config.root_radius, |z| self.config.root_resize.radius(z))
    }

    fn wellbore_width(&self, group: &Group) -> f64 {
        group.wellbore_width.unwrap_or(self.config.wellbore_width)
    }

    fn wellbore_radius(&self, group: &Group) -> f64 {
        let resize = group.wellbore_resize.unwrap_or(self.config.wellbore_resize);
        match self.zoom {
            Some(z) => resize.radius(z),
            None => self.wellbore_width(group),
        }
    }

    /// Appends wellbores to `group_key`. Wellbores with an empty or
    /// non-finite path are skipped. Returns how many were plotted.
    pub fn set(&mut self, view: &dyn MapView, data: Vec<SourceData>, group_key: &str) -> usize {
        let group_index = match self.group_index(group_key) {
            Some(index) => index,
            None => {
                self.groups.push(Group::new(group_key, GroupOptions::default()));
                self.groups.len() - 1
            }
        };
        let mut touched_roots = Vec::new();
        let mut skipped = 0usize;
        let total = data.len();

        for source in data {
            let mut coords: Vec<Vec2> = source
                .path
                .iter()
                .map(|[lat, lng]| view.project(*lat, *lng))
                .collect();
            if let Some(r) = self.config.reduction {
                coords = reduce(&coords, r.max_deviation, r.distance_weight);
            }
            let interpolator = match PathInterpolator::new(&coords, self.config.point_threshold) {
                Ok(interp) => interp,
                Err(err) => {
                    warn!(id = source.id, label = %source.label, %err, "skipping wellbore");
                    skipped += 1;
                    continue;
                }
            };
            let root = self.root_for(interpolator.first());
            let index = self.push_wellbore(Rc::new(source), group_index, root, interpolator);
            if !touched_roots.contains(&root) {
                touched_roots.push(root);
            }
            self.roots[root].wellbores.push(index);
        }

        let layout = self.layout();
        for root in touched_roots {
            self.roots[root].recalculate(&mut self.store, &self.wellbores, &self.groups, &layout, true);
        }
        self.store.request_redraw();

        let plotted = total - skipped;
        debug!(group = group_key, plotted, skipped, "wellbores set");
        self.debug.emit(
            WELLBORES,
            "set",
            format!("{plotted} wellbores added to {group_key}"),
        );
        self.debug.count(WELLBORES, "plotted", plotted as u64);
        plotted
    }

    fn root_for(&mut self, position: Vec2) -> usize {
        if let Some(hit) = self
            .root_dict
            .get_closest_under(position, self.config.root_merge_distance)
        {
            return *hit.value;
        }
        let index = self.roots.len();
        let mut root = RootData::new(position);
        root.mesh = Some(self.store.submit(
            ShaderKind::Root,
            Geometry::Quad(root_quad(position, self.config.root_radius)),
            root_uniforms(self.root_radius()),
            0,
        ));
        self.roots.push(root);
        self.root_dict.add(position, index);
        index
    }

    fn push_wellbore(
        &mut self,
        data: Rc<SourceData>,
        group_index: usize,
        root: usize,
        interpolator: PathInterpolator,
    ) -> usize {
        let index = self.wellbores.len();
        let group = &self.groups[group_index];
        let width = self.wellbore_width(group);
        let radius = self.wellbore_radius(group);
        let z_index = group.next_z_index(&data, &self.config.sidetrack_group);
        let mut wellbore = WellboreData::new(data, group_index, root, interpolator);

        if !wellbore.interpolator.is_single_point() {
            if let Some(color) = group.base_color(&wellbore.data) {
                let intervals = process_intervals(&wellbore.data.intervals);
                let tick = TickConfig {
                    width: self.config.tick.width,
                    height: width * self.config.tick.height,
                };
                let mesh = WellboreMeshBuilder::new(&wellbore.interpolator, width, tick)
                    .generate(&intervals);
                let uniforms = wellbore.initial_uniforms(group, color, radius);
                wellbore.mesh = Some(self.store.submit(
                    ShaderKind::Wellbore,
                    Geometry::Wellbore(mesh),
                    uniforms.to_uniforms(),
                    z_index,
                ));
            }
            self.path_dict.add(wellbore.interpolator.points(), index);
        }

        let mut item = TextItem::new(wellbore.label.text.clone(), wellbore.interpolator.first());
        item.color = hex_rgba(group.colors.font_color);
        item.scale = self.label_scale();
        item.visible = false;
        item.z_index = 1;
        if !wellbore.label.attach_to_root {
            let placement = along_path(&wellbore.interpolator, width);
            item.position = placement.position;
            item.anchor = placement.anchor;
            item.rotation = placement.rotation;
        }
        wellbore.label.handle = Some(self.store.submit_text(item));

        wellbore.set_z_index(&mut self.store, z_index);
        let filter = group.active_filter().map(|f| f.status_for(&wellbore.data));
        let group = &mut self.groups[group_index];
        group.push_member(index);
        let group = &self.groups[group_index];
        if let Some(status) = filter {
            wellbore.set_filter(&mut self.store, group, status);
        }
        wellbore.update(&mut self.store, group, !group.state.labels_visible);
        self.wellbores.push(wellbore);
        index
    }

    fn groups_matching(&self, key: Option<&str>) -> Vec<usize> {
        (0..self.groups.len())
            .filter(|&i| key.is_none_or(|k| self.groups[i].key == k))
            .collect()
    }

    fn recalculate_roots(&mut self, groups: &[usize], force: bool) {
        let mut roots: Vec<usize> = groups
            .iter()
            .flat_map(|&g| self.groups[g].members().iter().map(|&w| self.wellbores[w].root))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        let layout = self.layout();
        for root in roots {
            self.roots[root].recalculate(&mut self.store, &self.wellbores, &self.groups, &layout, force);
        }
    }

    /// Replaces the filter of the matching groups (all when `group` is
    /// `None`). Returns how many wellbores changed status.
    fn apply_filter(&mut self, group: Option<&str>, filter: Option<ActiveFilter>) -> usize {
        let targets = self.groups_matching(group);
        let mut changed = 0;
        for &g in &targets {
            self.groups[g].set_filter(filter.clone());
            let group = &self.groups[g];
            for &w in group.members() {
                let wellbore = &mut self.wellbores[w];
                let status = filter
                    .as_ref()
                    .map_or(FilterStatus::None, |f| f.status_for(&wellbore.data));
                if wellbore.set_filter(&mut self.store, group, status) {
                    changed += 1;
                }
            }
        }
        let force = filter.is_some() || self.labels_visible;
        self.recalculate_roots(&targets, force);
        if changed > 0 {
            self.store.request_redraw();
        }
        self.debug.count(WELLBORES, "filter_changes", changed as u64);
        debug!(changed, "wellbore filter applied");
        changed
    }

    /// Grays out wellbores failing `filter`; they stay hoverable.
    pub fn soft_filter(&mut self, group: Option<&str>, filter: Filter) -> usize {
        self.apply_filter(
            group,
            Some(ActiveFilter {
                predicate: filter,
                mode: FilterMode::Soft,
            }),
        )
    }

    /// Ghosts wellbores failing `filter`.
    pub fn hard_filter(&mut self, group: Option<&str>, filter: Filter) -> usize {
        self.apply_filter(
            group,
            Some(ActiveFilter {
                predicate: filter,
                mode: FilterMode::Hard,
            }),
        )
    }

    pub fn clear_filter(&mut self, group: Option<&str>) -> usize {
        self.apply_filter(group, None)
    }

    /// Returns true if the group exists and its state changed.
    pub fn set_group_active(&mut self, key: &str, active: bool) -> bool {
        let Some(g) = self.group_index(key) else {
            return false;
        };
        if self.groups[g].active == active {
            return false;
        }
        self.groups[g].active = active;
        let group = &self.groups[g];
        for &w in group.members() {
            self.wellbores[w].update(&mut self.store, group, !group.state.labels_visible);
        }
        self.recalculate_roots(&[g], true);
        self.store.request_redraw();
        true
    }

    fn set_flag(
        &mut self,
        group: Option<&str>,
        key: &'static str,
        value: bool,
        field: fn(&mut GroupState) -> &mut bool,
    ) {
        for g in self.groups_matching(group) {
            *field(&mut self.groups[g].state) = value;
            for &w in self.groups[g].members() {
                self.wellbores[w].set_flag(&mut self.store, key, value);
            }
        }
        self.store.request_redraw();
    }

    pub fn set_completion_visibility(&mut self, group: Option<&str>, visible: bool) {
        self.set_flag(group, COMPLETION_VISIBLE, visible, |s| &mut s.completion_visible);
    }

    pub fn set_wellbore_visibility(&mut self, group: Option<&str>, visible: bool) {
        self.set_flag(group, WELLBORE_VISIBLE, visible, |s| &mut s.wellbore_visible);
    }

    pub fn set_color_by_log(&mut self, group: Option<&str>, enabled: bool) {
        self.set_flag(group, COLOR_BY_LOG, enabled, |s| &mut s.color_by_log);
    }

    pub fn set_hide_path_without_interval(&mut self, group: Option<&str>, hide: bool) {
        self.set_flag(group, HIDE_PATH_WITHOUT_INTERVAL, hide, |s| {
            &mut s.hide_path_without_interval
        });
    }

    pub fn set_shade_wellbore(&mut self, group: Option<&str>, shade: bool) {
        self.set_flag(group, SHADE_WELLBORE, shade, |s| &mut s.shade_wellbore);
    }

    pub fn labels_visible(&self) -> bool {
        self.labels_visible
    }

    pub fn set_label_visibility(&mut self, visible: bool) {
        self.labels_visible = visible;
        for group in &mut self.groups {
            group.state.labels_visible = visible;
        }
        for wellbore in &self.wellbores {
            if let Some(group) = self.groups.get(wellbore.group) {
                wellbore.update(&mut self.store, group, !visible);
            }
        }
        let layout = self.layout();
        for root in &self.roots {
            root.stack_labels(&mut self.store, &self.wellbores, &layout);
        }
        self.store.request_redraw();
    }

    pub fn highlighted(&self) -> Vec<FeatureId> {
        self.highlight
            .current()
            .map(|k| k.wellbores.iter().map(|&i| FeatureId::from_index(i)).collect())
            .unwrap_or_default()
    }

    fn find(&self, label_or_id: &str, group: Option<&str>) -> Option<usize> {
        self.wellbores.iter().position(|w| {
            let in_group = group.is_none_or(|k| self.groups[w.group].key == k);
            in_group && (w.data.label == label_or_id || w.data.id.to_string() == label_or_id)
        })
    }

    fn emphasize(&mut self, key: HighlightKey) -> bool {
        if self.highlight.current() == Some(&key) {
            return false;
        }
        let mut target = WellboreTarget {
            store: &mut self.store,
            wellbores: &mut self.wellbores,
            groups: &self.groups,
        };
        let had_emphasis = self.highlight.is_active();
        let changed = self.highlight.highlight(&mut target, key);
        if !changed && had_emphasis {
            self.events.push(WellboreEvent::HighlightOff);
        }
        if changed || had_emphasis {
            self.store.request_redraw();
        }
        changed
    }

    /// Highlights one wellbore by label or id. Returns true if the emphasis
    /// changed.
    pub fn set_highlight(&mut self, label_or_id: &str, group: Option<&str>) -> bool {
        let Some(index) = self.find(label_or_id, group) else {
            return false;
        };
        let root = self.wellbores[index].root;
        self.emphasize(HighlightKey {
            root,
            wellbores: vec![index],
        })
    }

    pub fn clear_highlight(&mut self) -> bool {
        let mut target = WellboreTarget {
            store: &mut self.store,
            wellbores: &mut self.wellbores,
            groups: &self.groups,
        };
        if !self.highlight.revert(&mut target) {
            return false;
        }
        self.events.push(WellboreEvent::HighlightOff);
        self.store.request_redraw();
        true
    }

    pub fn selected(&self) -> &SelectionSet {
        &self.selected
    }

    /// Selects wellbores by id; every other wellbore is deselected.
    /// Returns how many wellbores changed.
    pub fn set_selected(&mut self, ids: &[u64]) -> usize {
        self.clear_highlight();
        let next = SelectionSet::from_ids(
            self.wellbores
                .iter()
                .enumerate()
                .filter(|(_, w)| ids.contains(&w.data.id))
                .map(|(i, _)| FeatureId::from_index(i)),
        );
        let removed = self.selected.diff(&next);
        let added = next.diff(&self.selected);
        let mut roots = Vec::new();
        for (set, selected) in [(&removed, false), (&added, true)] {
            for id in set.iter() {
                let wellbore = &mut self.wellbores[id.index()];
                wellbore.set_selected(&mut self.store, &self.groups[wellbore.group], selected);
                roots.push(wellbore.root);
            }
        }
        roots.sort_unstable();
        roots.dedup();
        let layout = self.layout();
        for root in roots {
            self.roots[root].recalculate(&mut self.store, &self.wellbores, &self.groups, &layout, false);
        }
        let changed = removed.len() + added.len();
        self.selected = next;
        if changed > 0 {
            self.store.request_redraw();
        }
        changed
    }

    /// Root first, then paths.
    fn test_position(&self, position: Vec2) -> Option<PositionHit> {
        if let Some(hit) = self.root_dict.get_closest_under(position, self.root_radius()) {
            let root = *hit.value;
            let wellbores: Vec<usize> = self.roots[root]
                .wellbores
                .iter()
                .copied()
                .filter(|&w| self.wellbores[w].is_interactable(&self.groups[self.wellbores[w].group]))
                .collect();
            if !wellbores.is_empty() {
                return Some(PositionHit {
                    root,
                    wellbores,
                    relative: None,
                });
            }
        }

        let hit = self.path_dict.get_closest(position, self.config.hit_distance)?;
        let index = *hit.value;
        let wellbore = &self.wellbores[index];
        if !wellbore.is_interactable(&self.groups[wellbore.group]) {
            return None;
        }
        let (relative, _) = wellbore.interpolator.project(position);
        Some(PositionHit {
            root: wellbore.root,
            wellbores: vec![index],
            relative: Some(relative),
        })
    }

    fn event_data(&self, hit: &PositionHit) -> Vec<WellboreEventData> {
        hit.wellbores
            .iter()
            .map(|&i| {
                let w = &self.wellbores[i];
                WellboreEventData {
                    group: self.groups[w.group].key.clone(),
                    data: Rc::clone(&w.data),
                    relative: hit.relative,
                    interval: hit.relative.and_then(|t| w.data.interval_at(t).copied()),
                }
            })
            .collect()
    }

    fn feature_hits(&self, hit: &PositionHit) -> Vec<FeatureHit> {
        hit.wellbores
            .iter()
            .map(|&i| {
                let w = &self.wellbores[i];
                let mut out = FeatureHit::new(WELLBORES, FeatureId::from_index(i), w.data.label.clone());
                out.group = Some(self.groups[w.group].key.clone());
                out.properties = w.data.properties.clone();
                out.relative = hit.relative;
                out
            })
            .collect()
    }

    fn update_highlighted(&mut self, position: Vec2) -> PointerOutcome {
        let Some(hit) = self.test_position(position) else {
            if self.highlight.is_active() {
                self.clear_highlight();
            }
            return PointerOutcome::ignored();
        };
        let changed = self.emphasize(HighlightKey {
            root: hit.root,
            wellbores: hit.wellbores.clone(),
        });
        let event = HighlightEvent {
            changed,
            event_data: self.event_data(&hit),
        };
        self.events.push(WellboreEvent::HighlightOn(event));
        PointerOutcome::consumed(self.feature_hits(&hit))
    }

    /// Highlight events since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<WellboreEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Layer for WellboreModule {
    fn name(&self) -> &'static str {
        WELLBORES
    }

    fn id(&self) -> LayerId {
        self.store.layer()
    }

    fn clear(&mut self) {
        self.store.clear();
        self.wellbores.clear();
        self.roots.clear();
        self.root_dict.clear();
        self.path_dict.clear();
        for group in &mut self.groups {
            group.clear_members();
        }
        self.highlight.forget();
        self.selected.clear();
        self.debug.emit(WELLBORES, "clear", "all wellbores removed");
    }

    fn resize(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        if self.wellbores.is_empty() {
            return;
        }
        let radii: Vec<f64> = self.groups.iter().map(|g| self.wellbore_radius(g)).collect();
        for wellbore in &self.wellbores {
            wellbore.set_radius(&mut self.store, radii[wellbore.group]);
        }
        let root_radius = self.root_radius();
        let layout = self.layout();
        for root in &self.roots {
            if let Some(mesh) = root.mesh {
                self.store
                    .set_uniform(mesh, ROOT_RADIUS, UniformValue::Float(root_radius as f32));
            }
            root.stack_labels(&mut self.store, &self.wellbores, &layout);
        }
        for wellbore in &self.wellbores {
            if let Some(handle) = wellbore.label.handle
                && !wellbore.label.attach_to_root
            {
                self.store.update_text(handle, |t| t.scale = layout.scale);
            }
        }
        trace!(zoom, root_radius, label_scale = layout.scale, "wellbore resize");
    }

    fn is_visible(&self) -> bool {
        self.store.is_layer_visible()
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        self.store.set_layer_visible(visible)
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let skip = self.drag.track(event.kind);
        if !self.is_visible() || self.wellbores.is_empty() {
            return PointerOutcome::ignored();
        }
        match event.kind {
            PointerKind::Move if !skip => self.update_highlighted(event.position),
            PointerKind::Click => match self.test_position(event.position) {
                Some(hit) => PointerOutcome::consumed(self.feature_hits(&hit)),
                None => PointerOutcome::ignored(),
            },
            PointerKind::Out => {
                self.clear_highlight();
                PointerOutcome::ignored()
            }
            _ => PointerOutcome::ignored(),
        }
    }

    fn drain_commands(&mut self) -> RenderFrame {
        self.store.drain()
    }
}
