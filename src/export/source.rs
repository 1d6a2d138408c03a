//! Source scene interface consumed by the exporter.
//!
//! The exporter only sees objects through [`SourceObject`]: a name, a world
//! matrix in the source's Z-up convention, a typed payload and the children.
//! [`SourceNode`] is a plain-data implementation.

use crate::material::ShaderGraph;
use crate::util::{DMat4, Vec3};
use crate::writer::VertexRecord;

/// Object of the host scene graph.
pub trait SourceObject {
    /// Object name.
    fn name(&self) -> &str;

    /// World matrix in source space.
    fn world_matrix(&self) -> DMat4;

    /// Typed object data.
    fn payload(&self) -> SourcePayload<'_>;

    /// Child objects in host order.
    fn children(&self) -> Vec<&dyn SourceObject>;
}

/// Borrowed view of an object's data.
#[derive(Clone, Copy, Debug)]
pub enum SourcePayload<'a> {
    Mesh(&'a SourceMesh),
    Light(&'a SourceLight),
    Camera(&'a SourceCamera),
    Armature,
    /// Unsupported object kind, with the host's type name.
    Other(&'a str),
}

/// Material slot on a mesh object.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSlot {
    pub name: String,
    pub graph: ShaderGraph,
}

impl MaterialSlot {
    pub fn new(name: impl Into<String>, graph: ShaderGraph) -> Self {
        Self { name: name.into(), graph }
    }
}

/// One triangle of the processed (triangulated) mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceTriangle {
    /// Index into [`SourceMesh::materials`].
    pub material_index: usize,
    /// Corners in source space.
    pub vertices: [VertexRecord; 3],
}

impl SourceTriangle {
    pub fn new(material_index: usize, vertices: [VertexRecord; 3]) -> Self {
        Self { material_index, vertices }
    }
}

/// Triangle soup of a mesh object, already triangulated by the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    /// Name of the mesh datablock; objects sharing it share geometry.
    pub data_name: String,
    /// Material slots; an empty slot uses the default material.
    pub materials: Vec<Option<MaterialSlot>>,
    pub triangles: Vec<SourceTriangle>,
}

impl SourceMesh {
    pub fn new(data_name: impl Into<String>) -> Self {
        Self { data_name: data_name.into(), ..Self::default() }
    }

    pub fn with_material(mut self, slot: Option<MaterialSlot>) -> Self {
        self.materials.push(slot);
        self
    }

    pub fn with_triangle(mut self, triangle: SourceTriangle) -> Self {
        self.triangles.push(triangle);
        self
    }
}

/// Host light kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceLightKind {
    Point,
    Sun,
    /// Spot light with cone size (radians) and blend factor.
    Spot { size: f32, blend: f32 },
}

/// Host light data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceLight {
    pub kind: SourceLightKind,
    pub color: Vec3,
    pub distance: f32,
    /// Power in host units.
    pub energy: f32,
}

/// Host camera projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceProjection {
    Perspective,
    Orthographic,
}

/// Host camera data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCamera {
    pub projection: SourceProjection,
    /// Vertical field of view in radians.
    pub angle_y: f32,
    pub clip_start: f32,
    pub clip_end: f32,
}

/// Owned object data for [`SourceNode`].
#[derive(Clone, Debug, PartialEq)]
pub enum SourceData {
    Mesh(SourceMesh),
    Light(SourceLight),
    Camera(SourceCamera),
    Armature,
    Other(String),
}

/// Plain-data scene object.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceNode {
    pub name: String,
    pub world: DMat4,
    pub data: SourceData,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(name: impl Into<String>, world: DMat4, data: SourceData) -> Self {
        Self { name: name.into(), world, data, children: Vec::new() }
    }

    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }
}

impl SourceObject for SourceNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_matrix(&self) -> DMat4 {
        self.world
    }

    fn payload(&self) -> SourcePayload<'_> {
        match &self.data {
            SourceData::Mesh(m) => SourcePayload::Mesh(m),
            SourceData::Light(l) => SourcePayload::Light(l),
            SourceData::Camera(c) => SourcePayload::Camera(c),
            SourceData::Armature => SourcePayload::Armature,
            SourceData::Other(kind) => SourcePayload::Other(kind),
        }
    }

    fn children(&self) -> Vec<&dyn SourceObject> {
        self.children.iter().map(|c| c as &dyn SourceObject).collect()
    }
}
