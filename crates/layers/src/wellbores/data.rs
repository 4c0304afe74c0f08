use std::rc::Rc;

use geometry::{Interval, PathInterpolator};
use gpu::{MeshHandle, MeshStore, TextHandle, UniformValue, Uniforms};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::colors::{Color, hex_rgba};

use super::group::Group;

pub const WELLBORE_COLOR1: &str = "wellboreColor1";
pub const WELLBORE_COLOR2: &str = "wellboreColor2";
pub const COMPLETION_VISIBLE: &str = "completionVisible";
pub const WELLBORE_VISIBLE: &str = "wellboreVisible";
pub const FORCE_COLOR: &str = "forceColor";
pub const STATUS: &str = "status";
pub const COLOR_BY_LOG: &str = "colorByLog";
pub const HIDE_PATH_WITHOUT_INTERVAL: &str = "hidePathWithoutInterval";
pub const SHADE_WELLBORE: &str = "shadeWellbore";
pub const WELLBORE_RADIUS: &str = "wellboreRadius";

/// Status uniform for members of an inactive group.
pub const STATUS_GROUP_INACTIVE: i32 = 4;
pub const HIGHLIGHT_Z_BONUS: i64 = 100_000;
pub const SELECTED_Z_BONUS: i64 = 1_000_000;

/// One wellbore as delivered by the host. Unknown fields are kept in
/// `properties` and travel with hit results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceData {
    #[serde(alias = "wellboreGuid")]
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub label_short: Option<String>,
    /// `[lat, lng]` pairs, root first.
    pub path: Vec<[f64; 2]>,
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl SourceData {
    pub fn short_label(&self) -> &str {
        self.label_short.as_deref().unwrap_or(&self.label)
    }

    /// Interval covering relative position `t`, if any.
    pub fn interval_at(&self, t: f64) -> Option<&Interval> {
        self.intervals
            .iter()
            .find(|i| !i.kind.is_marker() && i.l1 <= t && t <= i.l2)
    }

    /// Digit after the first `T` of the branch code (`T2` is the second sidetrack).
    pub fn sidetrack(&self) -> Option<u32> {
        let branch = self.branch.as_deref()?;
        let index = branch.find('T')?;
        branch[index + 1..].chars().next()?.to_digit(10)
    }
}

/// Soft leaves gray wellbores, hard leaves ghost lines.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    #[default]
    None,
    Soft,
    Hard,
}

impl FilterStatus {
    pub fn code(self) -> i32 {
        match self {
            FilterStatus::None => 0,
            FilterStatus::Soft => 1,
            FilterStatus::Hard => 2,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum WellboreStatus {
    #[default]
    Normal,
    Highlighted,
    MultiHighlighted,
    Selected,
}

/// Full uniform set of a wellbore mesh at submission time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WellboreUniforms {
    pub color: Color,
    pub completion_visible: bool,
    pub wellbore_visible: bool,
    pub force_color: bool,
    pub status: i32,
    pub color_by_log: bool,
    pub hide_path_without_interval: bool,
    pub shade_wellbore: bool,
    pub wellbore_radius: f64,
}

impl WellboreUniforms {
    pub fn to_uniforms(&self) -> Uniforms {
        let mut u = Uniforms::new();
        u.insert(WELLBORE_COLOR1, UniformValue::Vec3(self.color.col1));
        u.insert(WELLBORE_COLOR2, UniformValue::Vec3(self.color.col2));
        u.insert(COMPLETION_VISIBLE, UniformValue::Bool(self.completion_visible));
        u.insert(WELLBORE_VISIBLE, UniformValue::Bool(self.wellbore_visible));
        u.insert(FORCE_COLOR, UniformValue::Bool(self.force_color));
        u.insert(STATUS, UniformValue::Int(self.status));
        u.insert(COLOR_BY_LOG, UniformValue::Bool(self.color_by_log));
        u.insert(
            HIDE_PATH_WITHOUT_INTERVAL,
            UniformValue::Bool(self.hide_path_without_interval),
        );
        u.insert(SHADE_WELLBORE, UniformValue::Bool(self.shade_wellbore));
        u.insert(WELLBORE_RADIUS, UniformValue::Float(self.wellbore_radius as f32));
        u
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WellboreLabel {
    pub text: String,
    pub handle: Option<TextHandle>,
    /// Stacked under the root rather than drawn at the path end.
    pub attach_to_root: bool,
}

/// A plotted wellbore: source record, path, mesh and label.
#[derive(Debug)]
pub struct WellboreData {
    pub data: Rc<SourceData>,
    /// Index of the owning group in the module.
    pub group: usize,
    /// Index of the shared root in the module.
    pub root: usize,
    pub interpolator: PathInterpolator,
    pub mesh: Option<MeshHandle>,
    pub label: WellboreLabel,
    z_index: i64,
    status: WellboreStatus,
    filter: FilterStatus,
}

impl WellboreData {
    pub fn new(
        data: Rc<SourceData>,
        group: usize,
        root: usize,
        interpolator: PathInterpolator,
    ) -> Self {
        let label = WellboreLabel {
            text: data.short_label().to_string(),
            handle: None,
            attach_to_root: interpolator.is_single_point(),
        };
        Self {
            data,
            group,
            root,
            interpolator,
            mesh: None,
            label,
            z_index: 0,
            status: WellboreStatus::Normal,
            filter: FilterStatus::None,
        }
    }

    pub fn status(&self) -> WellboreStatus {
        self.status
    }

    pub fn filter(&self) -> FilterStatus {
        self.filter
    }

    pub fn z_index(&self) -> i64 {
        self.z_index
    }

    pub fn is_selected(&self) -> bool {
        self.status == WellboreStatus::Selected
    }

    pub fn is_highlighted(&self) -> bool {
        matches!(
            self.status,
            WellboreStatus::Highlighted | WellboreStatus::MultiHighlighted
        )
    }

    /// Shown in full: group active and not filtered.
    pub fn is_active(&self, group: &Group) -> bool {
        group.active && self.filter == FilterStatus::None
    }

    /// Soft-filtered wellbores stay hoverable; ghosts and inactive groups do not.
    pub fn is_interactable(&self, group: &Group) -> bool {
        group.active && self.filter != FilterStatus::Hard
    }

    pub fn status_code(&self, group: &Group) -> i32 {
        if group.active {
            self.filter.code()
        } else {
            STATUS_GROUP_INACTIVE
        }
    }

    /// Uniforms for the initial submission, given the base color.
    pub fn initial_uniforms(&self, group: &Group, color: Color, radius: f64) -> WellboreUniforms {
        WellboreUniforms {
            color,
            completion_visible: group.state.completion_visible,
            wellbore_visible: group.state.wellbore_visible,
            force_color: false,
            status: self.status_code(group),
            color_by_log: group.state.color_by_log,
            hide_path_without_interval: group.state.hide_path_without_interval,
            shade_wellbore: group.state.shade_wellbore,
            wellbore_radius: radius,
        }
    }

    /// Returns true if the filter changed.
    pub fn set_filter(&mut self, store: &mut MeshStore, group: &Group, filter: FilterStatus) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.update(store, group, !group.state.labels_visible);
        true
    }

    /// Pushes status and label visibility to the store.
    pub fn update(&self, store: &mut MeshStore, group: &Group, label_force_hide: bool) {
        if let Some(mesh) = self.mesh {
            store.set_uniform(mesh, STATUS, UniformValue::Int(self.status_code(group)));
        }
        let visible = !label_force_hide && self.is_active(group);
        self.set_label_visible(store, visible);
    }

    pub fn label_visible(&self, store: &MeshStore) -> bool {
        self.label
            .handle
            .and_then(|h| store.text(h))
            .is_some_and(|t| t.visible)
    }

    pub fn set_label_visible(&self, store: &mut MeshStore, visible: bool) {
        if let Some(handle) = self.label.handle {
            store.update_text(handle, |t| t.visible = visible);
        }
    }

    pub fn set_z_index(&mut self, store: &mut MeshStore, z_index: i64) {
        self.z_index = z_index;
        if let Some(mesh) = self.mesh {
            store.set_z_index(mesh, self.emphasis_z());
        }
    }

    pub fn set_flag(&self, store: &mut MeshStore, key: &'static str, value: bool) {
        if let Some(mesh) = self.mesh {
            store.set_uniform(mesh, key, UniformValue::Bool(value));
        }
    }

    pub fn set_radius(&self, store: &mut MeshStore, radius: f64) {
        if let Some(mesh) = self.mesh {
            store.set_uniform(mesh, WELLBORE_RADIUS, UniformValue::Float(radius as f32));
        }
    }

    /// Selected wellbores keep their status.
    pub fn set_highlight(
        &mut self,
        store: &mut MeshStore,
        group: &Group,
        highlighted: bool,
        multiple: bool,
    ) {
        if self.is_selected() {
            return;
        }
        self.status = match (highlighted, multiple) {
            (false, _) => WellboreStatus::Normal,
            (true, false) => WellboreStatus::Highlighted,
            (true, true) => WellboreStatus::MultiHighlighted,
        };
        self.paint(store, group);
    }

    pub fn set_selected(&mut self, store: &mut MeshStore, group: &Group, selected: bool) {
        self.status = if selected {
            WellboreStatus::Selected
        } else {
            WellboreStatus::Normal
        };
        self.paint(store, group);
    }

    /// Restores a status captured earlier.
    pub fn restore_status(&mut self, store: &mut MeshStore, group: &Group, status: WellboreStatus) {
        self.status = status;
        self.paint(store, group);
    }

    fn emphasis_z(&self) -> i64 {
        match self.status {
            WellboreStatus::Normal => self.z_index,
            WellboreStatus::Highlighted | WellboreStatus::MultiHighlighted => {
                self.z_index + HIGHLIGHT_Z_BONUS
            }
            WellboreStatus::Selected => self.z_index + SELECTED_Z_BONUS,
        }
    }

    /// Writes color, z-order and label tint for the current status.
    fn paint(&self, store: &mut MeshStore, group: &Group) {
        let colors = &group.colors;
        let (color, force) = match self.status {
            WellboreStatus::Normal => (group.base_color(&self.data), false),
            WellboreStatus::Highlighted => (Some(colors.highlight), true),
            WellboreStatus::MultiHighlighted => (Some(colors.multi_highlight), true),
            WellboreStatus::Selected => (Some(colors.selected), true),
        };
        if let Some(mesh) = self.mesh {
            if let Some(color) = color {
                store.set_uniform(mesh, WELLBORE_COLOR1, UniformValue::Vec3(color.col1));
                store.set_uniform(mesh, WELLBORE_COLOR2, UniformValue::Vec3(color.col2));
            }
            store.set_uniform(mesh, FORCE_COLOR, UniformValue::Bool(force));
            store.set_z_index(mesh, self.emphasis_z());
        }
        if let Some(handle) = self.label.handle {
            let (tint, z) = match self.status {
                WellboreStatus::Normal => (colors.font_color, 1),
                WellboreStatus::Selected => (colors.font_color, 3),
                _ => (colors.interact_font_color, 3),
            };
            store.update_text(handle, |t| {
                t.color = hex_rgba(tint);
                t.z_index = z;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterStatus, SourceData, WellboreStatus};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn source() -> SourceData {
        serde_json::from_value(json!({
            "wellboreGuid": 7,
            "label": "NO 25/8-B-2 T3",
            "labelShort": "B-2 T3",
            "path": [[58.8, 2.5], [58.81, 2.51]],
            "intervals": [
                { "type": "Screen", "start": 2385.0, "end": 2563.0, "l1": 0.8, "l2": 0.95 },
                { "type": "Packer", "start": 2300.0, "end": 2301.0, "l1": 0.7, "l2": 0.71 }
            ],
            "branch": "T3",
            "field": "BALDER"
        }))
        .unwrap()
    }

    #[test]
    fn source_keeps_unknown_fields() {
        let data = source();
        assert_eq!(data.id, 7);
        assert_eq!(data.short_label(), "B-2 T3");
        assert_eq!(data.properties.get("field"), Some(&json!("BALDER")));
        assert_eq!(data.sidetrack(), Some(3));
    }

    #[test]
    fn interval_lookup_ignores_packers() {
        let data = source();
        assert!(data.interval_at(0.85).is_some());
        assert!(data.interval_at(0.705).is_none());
        assert!(data.interval_at(0.1).is_none());
    }

    #[test]
    fn sidetrack_needs_a_digit() {
        let mut data = source();
        data.branch = Some("AH".into());
        assert_eq!(data.sidetrack(), None);
        data.branch = Some("T".into());
        assert_eq!(data.sidetrack(), None);
        data.branch = None;
        assert_eq!(data.sidetrack(), None);
    }

    #[test]
    fn status_codes() {
        assert_eq!(FilterStatus::None.code(), 0);
        assert_eq!(FilterStatus::Soft.code(), 1);
        assert_eq!(FilterStatus::Hard.code(), 2);
        assert_eq!(WellboreStatus::default(), WellboreStatus::Normal);
    }
}
