//! Scene components stored in the document's flat component table.

use std::fmt;

use crate::format::{TAG_CAMERA, TAG_LIGHT, TAG_MATERIAL, TAG_MESH, TAG_TRANSFORM};
use crate::material::Material;
use crate::util::{BBox3f, Vec2, Vec3, Vec4};

/// Component variant discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Transform,
    Mesh,
    Material,
    Camera,
    Light,
}

impl ComponentKind {
    /// Wire tag of this kind.
    pub fn tag(self) -> u8 {
        match self {
            Self::Transform => TAG_TRANSFORM,
            Self::Mesh => TAG_MESH,
            Self::Material => TAG_MATERIAL,
            Self::Camera => TAG_CAMERA,
            Self::Light => TAG_LIGHT,
        }
    }

    /// Kind for a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_TRANSFORM => Some(Self::Transform),
            TAG_MESH => Some(Self::Mesh),
            TAG_MATERIAL => Some(Self::Material),
            TAG_CAMERA => Some(Self::Camera),
            TAG_LIGHT => Some(Self::Light),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Mesh => "Mesh",
            Self::Material => "Material",
            Self::Camera => "Camera",
            Self::Light => "Light",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parent-relative transform in the target (Y-up) convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One mesh chunk.
///
/// Attribute arrays run in lock-step with `vertices` when present; a chunk
/// never holds more than [`MAX_VERTS_PER_CHUNK`](crate::format::MAX_VERTS_PER_CHUNK) vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub tangents: Vec<Vec4>,
    pub bitangents: Vec<Vec3>,
    pub triangles: Vec<u16>,
    pub bounding_box: BBox3f,
}

impl Mesh {
    /// Number of unique vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle indices (three per triangle).
    #[inline]
    pub fn index_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of complete triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Camera projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionMethod {
    Perspective,
    Orthographic,
}

impl ProjectionMethod {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Perspective => 0,
            Self::Orthographic => 1,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Perspective),
            1 => Some(Self::Orthographic),
            _ => None,
        }
    }
}

/// Camera component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub projection: ProjectionMethod,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near and far clip distances.
    pub clipping_planes: Vec2,
    /// Viewport as `(x, y, width, height)` in percent.
    pub viewport: Vec4,
    pub clear_color: bool,
    pub clear_depth: bool,
    pub layer: i32,
    pub background_color: Vec4,
    pub active: bool,
}

impl Camera {
    /// Create a camera with the exporter's fixed viewport and clear settings.
    pub fn new(projection: ProjectionMethod, fov: f32, near: f32, far: f32) -> Self {
        Self {
            projection,
            fov,
            clipping_planes: Vec2::new(near, far),
            viewport: Vec4::new(0.0, 0.0, 100.0, 100.0),
            clear_color: true,
            clear_depth: true,
            layer: 0,
            background_color: Vec4::ONE,
            active: true,
        }
    }
}

/// Light kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightType {
    Point,
    Parallel,
    Spot,
    Legacy,
}

impl LightType {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Parallel => 1,
            Self::Spot => 2,
            Self::Legacy => 3,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Point),
            1 => Some(Self::Parallel),
            2 => Some(Self::Spot),
            3 => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Light component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub active: bool,
    pub color: Vec4,
    pub max_distance: f32,
    pub strength: f32,
    pub light_type: LightType,
    /// Outer spot cone angle in radians.
    pub outer_cone_angle: f32,
    /// Inner spot cone angle in radians.
    pub inner_cone_angle: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            active: true,
            color: Vec4::ONE,
            max_distance: 0.0,
            strength: 1.0,
            light_type: LightType::Point,
            outer_cone_angle: 1.6,
            inner_cone_angle: 1.0,
        }
    }
}

/// Component payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentData {
    Transform(Transform),
    Mesh(Mesh),
    Material(Material),
    Camera(Camera),
    Light(Light),
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Mesh(_) => ComponentKind::Mesh,
            Self::Material(_) => ComponentKind::Material,
            Self::Camera(_) => ComponentKind::Camera,
            Self::Light(_) => ComponentKind::Light,
        }
    }
}

/// Named or anonymous entry of the component table.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub name: Option<String>,
    pub data: ComponentData,
}

impl Component {
    pub fn new(name: Option<&str>, data: ComponentData) -> Self {
        Self { name: name.map(str::to_string), data }
    }

    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    /// Mesh payload, if this is a mesh.
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.data {
            ComponentData::Mesh(m) => Some(m),
            _ => None,
        }
    }

    /// Material payload, if this is a material.
    pub fn as_material(&self) -> Option<&Material> {
        match &self.data {
            ComponentData::Material(m) => Some(m),
            _ => None,
        }
    }

    /// Transform payload, if this is a transform.
    pub fn as_transform(&self) -> Option<&Transform> {
        match &self.data {
            ComponentData::Transform(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        for kind in [
            ComponentKind::Transform,
            ComponentKind::Mesh,
            ComponentKind::Material,
            ComponentKind::Camera,
            ComponentKind::Light,
        ] {
            assert_eq!(ComponentKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ComponentKind::from_tag(200), None);
    }

    #[test]
    fn test_camera_defaults() {
        let cam = Camera::new(ProjectionMethod::Perspective, 0.8, 0.1, 100.0);
        assert_eq!(cam.viewport, Vec4::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(cam.clipping_planes, Vec2::new(0.1, 100.0));
        assert!(cam.clear_color && cam.clear_depth && cam.active);
        assert_eq!(cam.background_color, Vec4::ONE);
    }

    #[test]
    fn test_component_accessors() {
        let c = Component::new(Some("xf"), ComponentData::Transform(Transform::IDENTITY));
        assert_eq!(c.kind(), ComponentKind::Transform);
        assert_eq!(c.as_transform(), Some(&Transform::IDENTITY));
        assert!(c.as_mesh().is_none());
        assert_eq!(c.kind().to_string(), "Transform");
    }
}
