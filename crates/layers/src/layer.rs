use foundation::ids::FeatureId;
use foundation::math::Vec2;
use gpu::RenderFrame;
use serde_json::{Map, Value};

pub use gpu::LayerId;

/// Host map collaborator. Projection must be stable within one synchronous
/// operation.
pub trait MapView {
    /// Geographic coordinate to projected layer point.
    fn project(&self, lat: f64, lng: f64) -> Vec2;

    /// Projected layer point back to `(lat, lng)`.
    fn unproject(&self, point: Vec2) -> (f64, f64);

    fn current_zoom(&self) -> f64;
}

/// Equirectangular projection with y growing southwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlatView {
    pub units_per_degree: f64,
    pub zoom: f64,
}

impl FlatView {
    pub fn new(units_per_degree: f64, zoom: f64) -> Self {
        Self {
            units_per_degree,
            zoom,
        }
    }
}

impl MapView for FlatView {
    fn project(&self, lat: f64, lng: f64) -> Vec2 {
        Vec2::new(lng * self.units_per_degree, -lat * self.units_per_degree)
    }

    fn unproject(&self, point: Vec2) -> (f64, f64) {
        (-point.y / self.units_per_degree, point.x / self.units_per_degree)
    }

    fn current_zoom(&self) -> f64 {
        self.zoom
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerKind {
    Move,
    Down,
    Up,
    Click,
    Out,
}

/// Pointer event in projected layer coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn new(position: Vec2, kind: PointerKind) -> Self {
        Self { position, kind }
    }
}

/// One feature under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHit {
    pub module: &'static str,
    pub id: FeatureId,
    pub label: String,
    pub group: Option<String>,
    pub properties: Map<String, Value>,
    /// Relative position along a path, for line features.
    pub relative: Option<f64>,
}

impl FeatureHit {
    pub fn new(module: &'static str, id: FeatureId, label: impl Into<String>) -> Self {
        Self {
            module,
            id,
            label: label.into(),
            group: None,
            properties: Map::new(),
            relative: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointerOutcome {
    pub consumed: bool,
    pub hits: Vec<FeatureHit>,
}

impl PointerOutcome {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn consumed(hits: Vec<FeatureHit>) -> Self {
        Self {
            consumed: true,
            hits,
        }
    }
}

/// Tracks map drags; pointer moves between Down and Up are pans, not hovers.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DragState {
    dragging: bool,
}

impl DragState {
    /// Updates the drag flag. Returns true if the event should be skipped.
    pub fn track(&mut self, kind: PointerKind) -> bool {
        match kind {
            PointerKind::Down => {
                self.dragging = true;
                true
            }
            PointerKind::Up => {
                self.dragging = false;
                true
            }
            PointerKind::Move => self.dragging,
            PointerKind::Click | PointerKind::Out => false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

/// Capabilities every feature module exposes to the host.
pub trait Layer {
    fn name(&self) -> &'static str;

    fn id(&self) -> LayerId;

    /// Drops all features and queues removal of their render state.
    fn clear(&mut self);

    /// Recomputes zoom-dependent uniforms. A no-op before any data is set.
    fn resize(&mut self, zoom: f64);

    fn is_visible(&self) -> bool;

    /// Returns true if visibility changed.
    fn set_visibility(&mut self, visible: bool) -> bool;

    fn on_add(&mut self, view: &dyn MapView) {
        self.resize(view.current_zoom());
    }

    fn on_remove(&mut self) {}

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome;

    /// Render commands queued since the last drain.
    fn drain_commands(&mut self) -> RenderFrame;
}

/// Ordered list of layers, dispatched front to back.
#[derive(Default)]
pub struct LayerRegistry {
    layers: Vec<Box<dyn Layer>>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut layer: Box<dyn Layer>, view: &dyn MapView) {
        layer.on_add(view);
        self.layers.push(layer);
    }

    pub fn remove(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let index = self.layers.iter().position(|l| l.id() == id)?;
        let mut layer = self.layers.remove(index);
        layer.on_remove();
        Some(layer)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut (dyn Layer + 'static)> {
        self.layers
            .iter_mut()
            .find(|l| l.id() == id)
            .map(|l| l.as_mut())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn resize(&mut self, zoom: f64) {
        for layer in &mut self.layers {
            layer.resize(zoom);
        }
    }

    /// Delivers the event to every visible layer and collects their hits.
    pub fn dispatch(&mut self, event: &PointerEvent) -> PointerOutcome {
        let mut out = PointerOutcome::default();
        for layer in &mut self.layers {
            if !layer.is_visible() {
                continue;
            }
            let outcome = layer.handle_pointer(event);
            out.consumed |= outcome.consumed;
            out.hits.extend(outcome.hits);
        }
        out
    }

    /// Drains every layer into one frame, in layer order.
    pub fn drain(&mut self) -> RenderFrame {
        let mut frame = RenderFrame::new();
        for layer in &mut self.layers {
            frame.extend(layer.drain_commands());
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DragState, FlatView, Layer, LayerId, LayerRegistry, MapView, PointerEvent, PointerKind,
        PointerOutcome,
    };
    use foundation::math::Vec2;
    use gpu::{RenderCommand, RenderFrame};

    struct Stub {
        id: LayerId,
        visible: bool,
        zoom: Option<f64>,
        events: usize,
        queued: RenderFrame,
    }

    impl Stub {
        fn new(id: u32) -> Self {
            Self {
                id: LayerId(id),
                visible: true,
                zoom: None,
                events: 0,
                queued: RenderFrame::new(),
            }
        }
    }

    impl Layer for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn id(&self) -> LayerId {
            self.id
        }

        fn clear(&mut self) {}

        fn resize(&mut self, zoom: f64) {
            self.zoom = Some(zoom);
        }

        fn is_visible(&self) -> bool {
            self.visible
        }

        fn set_visibility(&mut self, visible: bool) -> bool {
            let changed = self.visible != visible;
            self.visible = visible;
            changed
        }

        fn handle_pointer(&mut self, _event: &PointerEvent) -> PointerOutcome {
            self.events += 1;
            self.queued.push(RenderCommand::RequestRedraw);
            PointerOutcome::consumed(Vec::new())
        }

        fn drain_commands(&mut self) -> RenderFrame {
            std::mem::take(&mut self.queued)
        }
    }

    #[test]
    fn flat_view_round_trips() {
        let view = FlatView::new(100.0, 8.0);
        let p = view.project(58.5, 2.25);
        assert_eq!(p, Vec2::new(225.0, -5850.0));
        let (lat, lng) = view.unproject(p);
        assert!((lat - 58.5).abs() < 1e-12);
        assert!((lng - 2.25).abs() < 1e-12);
    }

    #[test]
    fn drag_suppresses_moves_until_up() {
        let mut drag = DragState::default();
        assert!(!drag.track(PointerKind::Move));
        assert!(drag.track(PointerKind::Down));
        assert!(drag.track(PointerKind::Move));
        assert!(drag.track(PointerKind::Up));
        assert!(!drag.track(PointerKind::Move));
        assert!(!drag.track(PointerKind::Click));
    }

    #[test]
    fn registry_resizes_on_add_and_skips_hidden_layers() {
        let view = FlatView::new(1.0, 9.0);
        let mut registry = LayerRegistry::new();
        registry.add(Box::new(Stub::new(1)), &view);
        registry.add(Box::new(Stub::new(2)), &view);
        assert_eq!(registry.len(), 2);

        if let Some(layer) = registry.get_mut(LayerId(2)) {
            assert!(layer.set_visibility(false));
        }
        let outcome = registry.dispatch(&PointerEvent::new(Vec2::ZERO, PointerKind::Move));
        assert!(outcome.consumed);
        assert_eq!(registry.drain().len(), 1);

        let removed = registry.remove(LayerId(1));
        assert!(removed.is_some());
        assert_eq!(registry.names(), vec!["stub"]);
        assert!(registry.remove(LayerId(1)).is_none());
    }
}
