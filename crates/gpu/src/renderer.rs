use std::collections::BTreeMap;

use foundation::math::Vec2;
use geometry::mesh::{
    ColoredMeshData, MeshData, MeshNormalData, QuadMeshData, Sprite, WellboreMeshData,
};

/// Namespace of one module's meshes and text.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshHandle {
    pub layer: LayerId,
    pub index: u32,
}

impl MeshHandle {
    pub fn new(layer: LayerId, index: u32) -> Self {
        Self { layer, index }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextHandle {
    pub layer: LayerId,
    pub index: u32,
}

impl TextHandle {
    pub fn new(layer: LayerId, index: u32) -> Self {
        Self { layer, index }
    }
}

/// Shader program a mesh is drawn with. The renderer owns the programs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Thick wellbore path with completion and log attributes.
    Wellbore,
    /// Shaded root disc, extruded from quad UVs.
    Root,
    /// Flat polygon fill.
    Fill,
    /// Outline or polyline extruded along vertex normals by a width uniform.
    Outline,
    /// Per-vertex colored point marker.
    Marker,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    pub fn as_float(self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i32> {
        match self {
            UniformValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            UniformValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered so command streams and snapshots are deterministic.
pub type Uniforms = BTreeMap<&'static str, UniformValue>;

/// Topology handed to the renderer. Never mutated after submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Plain(MeshData),
    Normals(MeshNormalData),
    Colored(ColoredMeshData),
    Quad(QuadMeshData),
    Wellbore(WellboreMeshData),
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Plain(m) => m.vertex_count(),
            Geometry::Normals(m) => m.vertex_count(),
            Geometry::Colored(m) => m.vertex_count(),
            Geometry::Quad(m) => m.vertices.len() / 2,
            Geometry::Wellbore(m) => m.vertex_count(),
        }
    }

    pub fn triangles(&self) -> &[u32] {
        match self {
            Geometry::Plain(m) => &m.triangles,
            Geometry::Normals(m) => &m.triangles,
            Geometry::Colored(m) => &m.triangles,
            Geometry::Quad(m) => &m.triangles,
            Geometry::Wellbore(m) => &m.triangles,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OutlineFilter {
    pub color: [f32; 4],
    pub thickness: f32,
}

/// A text item placed in projected map units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub position: Vec2,
    /// Normalized anchor inside the text box; `[0.5, 0.5]` centres it.
    pub anchor: [f64; 2],
    pub rotation: f64,
    pub scale: f64,
    pub color: [f32; 4],
    pub visible: bool,
    pub z_index: i64,
}

impl TextItem {
    pub fn new(text: impl Into<String>, position: Vec2) -> Self {
        Self {
            text: text.into(),
            position,
            anchor: [0.5, 0.5],
            rotation: 0.0,
            scale: 1.0,
            color: [0.0, 0.0, 0.0, 1.0],
            visible: true,
            z_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SubmitMesh {
        handle: MeshHandle,
        shader: ShaderKind,
        geometry: Geometry,
        uniforms: Uniforms,
        z_index: i64,
    },
    ReplaceMesh {
        handle: MeshHandle,
        geometry: Geometry,
    },
    UpdateUniform {
        handle: MeshHandle,
        key: &'static str,
        value: UniformValue,
    },
    SetZIndex {
        handle: MeshHandle,
        z_index: i64,
    },
    SetVisible {
        handle: MeshHandle,
        visible: bool,
    },
    RemoveMesh {
        handle: MeshHandle,
    },
    SubmitSprite {
        handle: MeshHandle,
        sprite: Sprite,
        z_index: i64,
    },
    SetOutlineFilter {
        handle: MeshHandle,
        filter: Option<OutlineFilter>,
    },
    SubmitText {
        handle: TextHandle,
        item: TextItem,
    },
    UpdateText {
        handle: TextHandle,
        item: TextItem,
    },
    RemoveText {
        handle: TextHandle,
    },
    /// Shows or hides everything a layer owns without touching per-item state.
    SetLayerVisible {
        layer: LayerId,
        visible: bool,
    },
    RequestRedraw,
}

impl RenderCommand {
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            RenderCommand::SubmitMesh { .. }
                | RenderCommand::ReplaceMesh { .. }
                | RenderCommand::SubmitSprite { .. }
        )
    }
}

/// Backend that draws what the feature engine submits.
pub trait Renderer {
    fn execute(&mut self, command: RenderCommand);

    /// Fire-and-forget; called at most once per replayed frame.
    fn request_redraw(&mut self);
}

/// Commands produced by one synchronous operation, in submission order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFrame {
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn extend(&mut self, other: RenderFrame) {
        self.commands.extend(other.commands);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn redraw_requested(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, RenderCommand::RequestRedraw))
    }

    pub fn topology_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_topology()).count()
    }

    /// Replays every command and then, if any redraw was requested, signals
    /// exactly one redraw. The redraw always follows the state it reflects.
    pub fn replay(self, renderer: &mut impl Renderer) {
        let mut redraw = false;
        for command in self.commands {
            match command {
                RenderCommand::RequestRedraw => redraw = true,
                other => renderer.execute(other),
            }
        }
        if redraw {
            renderer.request_redraw();
        }
    }
}
