//! Abstract shader node graph supplied by the host.
//!
//! Only the node kinds the extractor understands carry data; everything
//! else is kept as [`ShaderNode::Other`] with the host's type name.

use crate::util::Vec4;

/// Image texture node linked into a color input.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTexture {
    /// Image path as stored by the host (may use the `//` relative prefix).
    pub path: String,
}

impl ImageTexture {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Color socket: default value plus an optional linked image.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorInput {
    pub value: Vec4,
    pub link: Option<ImageTexture>,
}

impl ColorInput {
    /// Unlinked color.
    pub fn value(value: Vec4) -> Self {
        Self { value, link: None }
    }

    /// Color with a linked image texture.
    pub fn textured(value: Vec4, path: impl Into<String>) -> Self {
        Self { value, link: Some(ImageTexture::new(path)) }
    }
}

/// Principled / uber shader inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct PrincipledBsdf {
    pub base_color: ColorInput,
    pub subsurface_color: Vec4,
    pub metallic: f32,
    pub specular: f32,
    pub roughness: f32,
    pub emission: ColorInput,
}

impl Default for PrincipledBsdf {
    fn default() -> Self {
        Self {
            base_color: ColorInput::value(Vec4::new(0.8, 0.8, 0.8, 1.0)),
            subsurface_color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            metallic: 0.0,
            specular: 0.5,
            roughness: 0.5,
            emission: ColorInput::value(Vec4::new(0.0, 0.0, 0.0, 1.0)),
        }
    }
}

/// Node kind, used to identify what feeds a mix node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderNodeKind {
    Diffuse,
    Glossy,
    Emission,
    Mix,
    NormalMap,
    Principled,
    Other,
}

/// A node in the host's shader graph.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderNode {
    Diffuse { color: ColorInput },
    Glossy { color: ColorInput, roughness: f32 },
    Emission { color: ColorInput },
    /// Mix shader; `first_input` is the kind of node linked to shader input 1.
    Mix { factor: f32, first_input: Option<ShaderNodeKind> },
    NormalMap { strength: f32, color: ColorInput },
    Principled(PrincipledBsdf),
    Other(String),
}

impl ShaderNode {
    /// Kind tag of this node.
    pub fn kind(&self) -> ShaderNodeKind {
        match self {
            Self::Diffuse { .. } => ShaderNodeKind::Diffuse,
            Self::Glossy { .. } => ShaderNodeKind::Glossy,
            Self::Emission { .. } => ShaderNodeKind::Emission,
            Self::Mix { .. } => ShaderNodeKind::Mix,
            Self::NormalMap { .. } => ShaderNodeKind::NormalMap,
            Self::Principled(_) => ShaderNodeKind::Principled,
            Self::Other(_) => ShaderNodeKind::Other,
        }
    }
}

/// Node graph of one material. Node order is the host's iteration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderGraph {
    pub nodes: Vec<ShaderNode>,
}

impl ShaderGraph {
    pub fn new(nodes: Vec<ShaderNode>) -> Self {
        Self { nodes }
    }

    /// Append a node.
    pub fn with_node(mut self, node: ShaderNode) -> Self {
        self.nodes.push(node);
        self
    }
}
