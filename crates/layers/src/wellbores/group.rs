use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::colors::{Color, ColorError, ColorOffset, Colors, InputColors, colormap_to_flat_array, default_log_colormap};
use crate::resize::ResizeConfig;

use super::data::{FilterStatus, SourceData};

/// Predicate deciding which wellbores pass a filter.
pub type Filter = Rc<dyn Fn(&SourceData) -> bool>;

/// Per-wellbore color override; `None` leaves the wellbore without a mesh.
pub type ColorFunction = Rc<dyn Fn(&SourceData) -> Option<Color>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterMode {
    Soft,
    Hard,
}

impl FilterMode {
    pub fn status(self) -> FilterStatus {
        match self {
            FilterMode::Soft => FilterStatus::Soft,
            FilterMode::Hard => FilterStatus::Hard,
        }
    }
}

#[derive(Clone)]
pub struct ActiveFilter {
    pub predicate: Filter,
    pub mode: FilterMode,
}

impl ActiveFilter {
    /// Status a wellbore gets under this filter.
    pub fn status_for(&self, data: &SourceData) -> FilterStatus {
        if (self.predicate)(data) {
            FilterStatus::None
        } else {
            self.mode.status()
        }
    }
}

impl fmt::Debug for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveFilter")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupOptions {
    pub colors: Option<InputColors>,
    pub order: Option<i64>,
    pub wellbore_resize: Option<ResizeConfig>,
    pub wellbore_width: Option<f64>,
    pub log_colormap: Option<Vec<ColorOffset>>,
}

/// Display toggles shared by every wellbore of a group.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GroupState {
    pub completion_visible: bool,
    pub wellbore_visible: bool,
    pub labels_visible: bool,
    pub color_by_log: bool,
    pub hide_path_without_interval: bool,
    pub shade_wellbore: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            completion_visible: true,
            wellbore_visible: true,
            labels_visible: false,
            color_by_log: false,
            hide_path_without_interval: false,
            shade_wellbore: true,
        }
    }
}

/// Named collection of wellbores sharing colors, z-layer and filter.
///
/// Members are indices into the owning module's wellbore list; the module
/// walks them when a group-wide change has to reach the store.
pub struct Group {
    pub key: String,
    pub colors: Colors,
    pub active: bool,
    pub order: i64,
    pub state: GroupState,
    pub wellbore_width: Option<f64>,
    pub wellbore_resize: Option<ResizeConfig>,
    pub color_function: Option<ColorFunction>,
    pub log_colormap: Vec<ColorOffset>,
    filter: Option<ActiveFilter>,
    members: Vec<usize>,
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("key", &self.key)
            .field("active", &self.active)
            .field("order", &self.order)
            .field("state", &self.state)
            .field("filter", &self.filter)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

impl Group {
    pub fn new(key: impl Into<String>, options: GroupOptions) -> Self {
        let colors = options
            .colors
            .as_ref()
            .map(Colors::from_input)
            .unwrap_or_default();
        Self {
            key: key.into(),
            colors,
            active: true,
            order: options.order.unwrap_or(0),
            state: GroupState::default(),
            wellbore_width: options.wellbore_width,
            wellbore_resize: options.wellbore_resize,
            color_function: None,
            log_colormap: options.log_colormap.unwrap_or_else(default_log_colormap),
            filter: None,
            members: Vec::new(),
        }
    }

    pub fn with_color_function(mut self, f: ColorFunction) -> Self {
        self.color_function = Some(f);
        self
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_filter(&self) -> Option<&ActiveFilter> {
        self.filter.as_ref()
    }

    /// Replaces any previous filter.
    pub fn set_filter(&mut self, filter: Option<ActiveFilter>) {
        self.filter = filter;
    }

    /// Color of a wellbore in normal state.
    pub fn base_color(&self, data: &SourceData) -> Option<Color> {
        match &self.color_function {
            Some(f) => f(data),
            None => Some(self.colors.default),
        }
    }

    /// Z-index for the next member: group order, insertion position and a
    /// sidetrack bonus in the sidetrack group so branches draw above the
    /// main bore.
    pub fn next_z_index(&self, data: &SourceData, sidetrack_group: &str) -> i64 {
        let bonus = if self.key == sidetrack_group {
            data.sidetrack().map_or(0, |n| 10 * i64::from(n))
        } else {
            0
        };
        self.order * 10_000 + self.members.len() as i64 + bonus
    }

    pub fn push_member(&mut self, index: usize) {
        self.members.push(index);
    }

    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    /// Log colormap as a texture row: RGBA bytes, then f32 offsets.
    pub fn colormap_texture(&self) -> Result<Vec<u8>, ColorError> {
        colormap_to_flat_array(&self.log_colormap)
    }
}
