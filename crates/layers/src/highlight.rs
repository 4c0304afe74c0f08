//! Emphasis for polygon meshes and point markers.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{Marker, MarkerPaint, marker};
use gpu::{Geometry, MeshHandle, MeshStore, OutlineFilter, UniformValue};
use scene::{EmphasisTarget, Highlighter};
use tracing::warn;

use crate::colors::Rgb;
use crate::symbology::{
    FILL_COLOR1, FILL_COLOR2, FILL_OPACITY, FeatureStyle, OUTLINE_COLOR,
};

pub const HIGHLIGHT_Z_LIFT: i64 = 10_000;
pub const HIGHLIGHT_CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];

/// Render handles of one polygon part.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PolygonMeshes {
    pub fill: Option<MeshHandle>,
    pub outline: MeshHandle,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillOverride {
    pub col1: Rgb,
    pub col2: Rgb,
    pub opacity: Option<f32>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshEmphasis {
    pub outline: Rgb,
    pub fill: Option<FillOverride>,
    pub z_lift: i64,
}

impl MeshEmphasis {
    /// Cyan outline raised above its neighbours.
    pub fn outline(outline: Rgb) -> Self {
        Self {
            outline,
            fill: None,
            z_lift: HIGHLIGHT_Z_LIFT,
        }
    }

    pub fn with_fill(mut self, fill: FillOverride) -> Self {
        self.fill = Some(fill);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartSnapshot {
    outline_color: Option<UniformValue>,
    outline_z: i64,
    fill: Option<FillSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
struct FillSnapshot {
    handle: MeshHandle,
    col1: Option<UniformValue>,
    col2: Option<UniformValue>,
    opacity: Option<UniformValue>,
    z: i64,
}

struct PolygonTarget<'a> {
    store: &'a mut MeshStore,
    groups: &'a [Vec<PolygonMeshes>],
    emphasis: &'a MeshEmphasis,
}

impl EmphasisTarget for PolygonTarget<'_> {
    type Key = FeatureId;
    type Snapshot = Vec<PartSnapshot>;

    fn capture(&self, key: &FeatureId) -> Option<Vec<PartSnapshot>> {
        let parts = self.groups.get(key.index())?;
        parts
            .iter()
            .map(|part| {
                let fill = match (self.emphasis.fill, part.fill) {
                    (Some(_), Some(handle)) => Some(FillSnapshot {
                        handle,
                        col1: self.store.uniform(handle, FILL_COLOR1),
                        col2: self.store.uniform(handle, FILL_COLOR2),
                        opacity: self.store.uniform(handle, FILL_OPACITY),
                        z: self.store.z_index(handle)?,
                    }),
                    _ => None,
                };
                Some(PartSnapshot {
                    outline_color: self.store.uniform(part.outline, OUTLINE_COLOR),
                    outline_z: self.store.z_index(part.outline)?,
                    fill,
                })
            })
            .collect()
    }

    fn emphasize(&mut self, key: &FeatureId) {
        let Some(parts) = self.groups.get(key.index()) else {
            return;
        };
        let emphasis = self.emphasis;
        for part in parts {
            self.store.set_uniform(
                part.outline,
                OUTLINE_COLOR,
                UniformValue::Vec3(emphasis.outline),
            );
            if let Some(z) = self.store.z_index(part.outline) {
                self.store.set_z_index(part.outline, z + emphasis.z_lift);
            }
            let (Some(fill), Some(handle)) = (emphasis.fill, part.fill) else {
                continue;
            };
            self.store
                .set_uniform(handle, FILL_COLOR1, UniformValue::Vec3(fill.col1));
            self.store
                .set_uniform(handle, FILL_COLOR2, UniformValue::Vec3(fill.col2));
            if let Some(opacity) = fill.opacity {
                self.store
                    .set_uniform(handle, FILL_OPACITY, UniformValue::Float(opacity));
            }
            if let Some(z) = self.store.z_index(handle) {
                self.store.set_z_index(handle, z + emphasis.z_lift);
            }
        }
    }

    fn restore(&mut self, key: &FeatureId, snapshot: Vec<PartSnapshot>) {
        let Some(parts) = self.groups.get(key.index()) else {
            return;
        };
        for (part, snap) in parts.iter().zip(snapshot) {
            if let Some(color) = snap.outline_color {
                self.store.set_uniform(part.outline, OUTLINE_COLOR, color);
            }
            self.store.set_z_index(part.outline, snap.outline_z);
            let Some(fill) = snap.fill else {
                continue;
            };
            for (key, value) in [
                (FILL_COLOR1, fill.col1),
                (FILL_COLOR2, fill.col2),
                (FILL_OPACITY, fill.opacity),
            ] {
                if let Some(value) = value {
                    self.store.set_uniform(fill.handle, key, value);
                }
            }
            self.store.set_z_index(fill.handle, fill.z);
        }
    }
}

/// Emphasizes every part of one polygon feature by outline color and z-order.
#[derive(Debug)]
pub struct MeshHighlighter {
    emphasis: MeshEmphasis,
    groups: Vec<Vec<PolygonMeshes>>,
    state: Highlighter<FeatureId, Vec<PartSnapshot>>,
}

impl MeshHighlighter {
    pub fn new(emphasis: MeshEmphasis) -> Self {
        Self {
            emphasis,
            groups: Vec::new(),
            state: Highlighter::new(),
        }
    }

    /// Registers the parts of the next feature; ids follow insertion order.
    pub fn add(&mut self, parts: Vec<PolygonMeshes>) -> FeatureId {
        self.groups.push(parts);
        FeatureId::from_index(self.groups.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn current(&self) -> Option<FeatureId> {
        self.state.current().copied()
    }

    pub fn highlight(&mut self, store: &mut MeshStore, id: FeatureId) -> bool {
        let mut target = PolygonTarget {
            store,
            groups: &self.groups,
            emphasis: &self.emphasis,
        };
        self.state.highlight(&mut target, id)
    }

    pub fn revert(&mut self, store: &mut MeshStore) -> bool {
        let mut target = PolygonTarget {
            store,
            groups: &self.groups,
            emphasis: &self.emphasis,
        };
        self.state.revert(&mut target)
    }

    /// Forgets all features. Render state is assumed to be cleared by the owner.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.state.forget();
    }
}

/// Everything needed to redraw one point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGraphic {
    pub handle: MeshHandle,
    pub center: Vec2,
    pub style: FeatureStyle,
}

impl PointGraphic {
    pub fn is_sprite(&self) -> bool {
        matches!(
            self.style.shape(),
            geometry::mesh::PointShape::Image { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicSnapshot {
    Filter(Option<OutlineFilter>),
    Paint(MarkerPaint),
}

struct GraphicsTarget<'a> {
    store: &'a mut MeshStore,
    graphics: &'a [PointGraphic],
    color: [f32; 4],
    zoom: f64,
}

impl GraphicsTarget<'_> {
    fn redraw(&mut self, graphic: &PointGraphic, paint: &MarkerPaint) {
        match marker(graphic.center, &graphic.style.shape(), paint) {
            Marker::Geometry(mesh) => {
                self.store
                    .replace_mesh(graphic.handle, Geometry::Colored(mesh));
            }
            Marker::Sprite(_) => {}
        }
    }
}

impl EmphasisTarget for GraphicsTarget<'_> {
    type Key = FeatureId;
    type Snapshot = GraphicSnapshot;

    fn capture(&self, key: &FeatureId) -> Option<GraphicSnapshot> {
        let graphic = self.graphics.get(key.index())?;
        if graphic.is_sprite() {
            return Some(GraphicSnapshot::Filter(
                self.store.outline_filter(graphic.handle),
            ));
        }
        match graphic.style.marker_paint(None) {
            Ok(paint) => Some(GraphicSnapshot::Paint(paint)),
            Err(err) => {
                warn!(id = key.0, %err, "point style has no valid paint");
                None
            }
        }
    }

    fn emphasize(&mut self, key: &FeatureId) {
        let graphics = self.graphics;
        let Some(graphic) = graphics.get(key.index()) else {
            return;
        };
        if graphic.is_sprite() {
            let thickness = graphic.style.line_width * 2f64.powf(self.zoom);
            let filter = OutlineFilter {
                color: HIGHLIGHT_CYAN,
                thickness: thickness as f32,
            };
            self.store.set_outline_filter(graphic.handle, Some(filter));
            return;
        }
        if let Ok(paint) = graphic.style.marker_paint(Some(self.color)) {
            self.redraw(graphic, &paint);
        }
    }

    fn restore(&mut self, key: &FeatureId, snapshot: GraphicSnapshot) {
        let graphics = self.graphics;
        let Some(graphic) = graphics.get(key.index()) else {
            return;
        };
        match snapshot {
            GraphicSnapshot::Filter(filter) => {
                self.store.set_outline_filter(graphic.handle, filter);
            }
            GraphicSnapshot::Paint(paint) => self.redraw(graphic, &paint),
        }
    }
}

/// Emphasizes one point marker: redrawn with the highlight line color, or an
/// outline filter for image sprites whose thickness follows the zoom.
#[derive(Debug)]
pub struct GraphicsHighlighter {
    color: [f32; 4],
    zoom: f64,
    graphics: Vec<PointGraphic>,
    state: Highlighter<FeatureId, GraphicSnapshot>,
}

impl GraphicsHighlighter {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            zoom: 0.0,
            graphics: Vec::new(),
            state: Highlighter::new(),
        }
    }

    pub fn add(&mut self, graphic: PointGraphic) -> FeatureId {
        self.graphics.push(graphic);
        FeatureId::from_index(self.graphics.len() - 1)
    }

    pub fn get(&self, id: FeatureId) -> Option<&PointGraphic> {
        self.graphics.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn current(&self) -> Option<FeatureId> {
        self.state.current().copied()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn highlight(&mut self, store: &mut MeshStore, id: FeatureId) -> bool {
        let mut target = GraphicsTarget {
            store,
            graphics: &self.graphics,
            color: self.color,
            zoom: self.zoom,
        };
        self.state.highlight(&mut target, id)
    }

    pub fn revert(&mut self, store: &mut MeshStore) -> bool {
        let mut target = GraphicsTarget {
            store,
            graphics: &self.graphics,
            color: self.color,
            zoom: self.zoom,
        };
        self.state.revert(&mut target)
    }

    /// Stores the zoom and re-applies the active emphasis with it.
    pub fn resize(&mut self, store: &mut MeshStore, zoom: f64) -> bool {
        self.zoom = zoom;
        match self.current() {
            Some(id) => self.highlight(store, id),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.graphics.clear();
        self.state.forget();
    }
}
