//! Fus document reader.
//!
//! Decodes the container written by [`crate::writer`] back into a
//! [`SceneDocument`]. Files are memory-mapped.

mod read_util;

pub use read_util::IStream;

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::format::{
    CONTAINER_VERSION, FLAGS_OFFSET, FUS_MAGIC, MAX_NODE_DEPTH, PREAMBLE_SIZE, VERSION_OFFSET,
};
use crate::material::{ColorChannel, Material, NormalMapChannel, PbrSettings, SpecularChannel};
use crate::scene::{
    Camera, Component, ComponentData, ComponentKind, Header, LightType, Light, Mesh, Node,
    ProjectionMethod, SceneDocument, Transform,
};
use crate::util::{BBox3f, Error, Result};

/// Parsed preamble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preamble {
    pub flags: u8,
    pub version: u16,
}

/// Parse and validate the fixed preamble.
pub fn parse_preamble(data: &[u8]) -> Result<Preamble> {
    if data.len() < PREAMBLE_SIZE {
        return Err(Error::UnexpectedEof(data.len() as u64));
    }
    if &data[0..FUS_MAGIC.len()] != FUS_MAGIC {
        return Err(Error::InvalidMagic);
    }
    let flags = data[FLAGS_OFFSET];
    let version = u16::from_le_bytes([data[VERSION_OFFSET], data[VERSION_OFFSET + 1]]);
    if version != CONTAINER_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(Preamble { flags, version })
}

/// Decode a document from bytes.
pub fn read_document(data: &[u8]) -> Result<SceneDocument> {
    parse_preamble(data)?;
    let mut s = IStream::new(data);
    s.take(PREAMBLE_SIZE)?;

    let header = read_header(&mut s)?;

    let count = s.read_count(1)?;
    let mut components = Vec::with_capacity(count);
    for _ in 0..count {
        components.push(read_component(&mut s)?);
    }

    let count = s.read_count(1)?;
    let mut children = Vec::with_capacity(count);
    for _ in 0..count {
        children.push(read_node(&mut s, components.len(), 0)?);
    }

    if !s.is_at_end() {
        return Err(Error::invalid(format!("{} trailing bytes after node tree", s.remaining())));
    }

    tracing::debug!("decoded {} components, {} top-level nodes", components.len(), children.len());
    Ok(SceneDocument { header, components, children })
}

/// Memory-map and decode a document file.
pub fn read_document_file(path: impl AsRef<Path>) -> Result<SceneDocument> {
    let file = File::open(path.as_ref())?;
    let size = file.metadata()?.len();
    if size < PREAMBLE_SIZE as u64 {
        return Err(Error::UnexpectedEof(size));
    }
    // Safety: the file is opened read-only and the map does not outlive this call.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
    read_document(&mmap)
}

fn read_header(s: &mut IStream<'_>) -> Result<Header> {
    Ok(Header {
        format_version: s.read_u32()?,
        generator: s.read_str()?,
        created_by: s.read_str()?,
        creation_date: s.read_str()?,
    })
}

fn read_component(s: &mut IStream<'_>) -> Result<Component> {
    let tag_pos = s.pos();
    let tag = s.read_u8()?;
    let kind = ComponentKind::from_tag(tag).ok_or(Error::UnknownComponentTag { tag, pos: tag_pos })?;
    let name = s.read_opt_str()?;
    let len = s.read_count(1)?;
    let mut p = s.sub(len)?;

    let data = match kind {
        ComponentKind::Transform => ComponentData::Transform(read_transform(&mut p)?),
        ComponentKind::Mesh => ComponentData::Mesh(read_mesh(&mut p)?),
        ComponentKind::Material => ComponentData::Material(read_material(&mut p)?),
        ComponentKind::Camera => ComponentData::Camera(read_camera(&mut p)?),
        ComponentKind::Light => ComponentData::Light(read_light(&mut p)?),
    };
    if !p.is_at_end() {
        return Err(Error::invalid(format!(
            "{kind} payload at {tag_pos} has {} unread bytes",
            p.remaining()
        )));
    }
    Ok(Component { name, data })
}

fn read_node(s: &mut IStream<'_>, table_len: usize, depth: usize) -> Result<Node> {
    if depth > MAX_NODE_DEPTH {
        return Err(Error::invalid(format!("node nesting exceeds {MAX_NODE_DEPTH}")));
    }
    let mut node = Node::new(None);
    node.name = s.read_opt_str()?;

    let refs = s.read_count(4)?;
    for _ in 0..refs {
        let index = s.read_u32()?;
        if index as usize >= table_len {
            return Err(Error::invalid(format!(
                "node references component {index} but table has {table_len}"
            )));
        }
        node.components.push(index);
    }

    let count = s.read_count(1)?;
    node.children.reserve(count);
    for _ in 0..count {
        node.children.push(read_node(s, table_len, depth + 1)?);
    }
    Ok(node)
}

fn read_transform(s: &mut IStream<'_>) -> Result<Transform> {
    Ok(Transform {
        translation: s.read_vec3()?,
        rotation: s.read_vec3()?,
        scale: s.read_vec3()?,
    })
}

fn read_mesh(s: &mut IStream<'_>) -> Result<Mesh> {
    let mut mesh = Mesh::default();

    let n = s.read_count(12)?;
    mesh.vertices = (0..n).map(|_| s.read_vec3()).collect::<Result<_>>()?;
    let n = s.read_count(12)?;
    mesh.normals = (0..n).map(|_| s.read_vec3()).collect::<Result<_>>()?;
    let n = s.read_count(8)?;
    mesh.uvs = (0..n).map(|_| s.read_vec2()).collect::<Result<_>>()?;
    let n = s.read_count(16)?;
    mesh.tangents = (0..n).map(|_| s.read_vec4()).collect::<Result<_>>()?;
    let n = s.read_count(12)?;
    mesh.bitangents = (0..n).map(|_| s.read_vec3()).collect::<Result<_>>()?;
    let n = s.read_count(2)?;
    mesh.triangles = (0..n).map(|_| s.read_u16()).collect::<Result<_>>()?;
    mesh.bounding_box = BBox3f::new(s.read_vec3()?, s.read_vec3()?);

    if mesh.triangles.len() % 3 != 0 {
        return Err(Error::invalid(format!(
            "mesh index count {} is not a multiple of 3",
            mesh.triangles.len()
        )));
    }
    if let Some(&bad) = mesh.triangles.iter().find(|&&i| i as usize >= mesh.vertices.len()) {
        return Err(Error::invalid(format!(
            "mesh index {bad} out of range for {} vertices",
            mesh.vertices.len()
        )));
    }
    Ok(mesh)
}

fn read_opt_color(s: &mut IStream<'_>) -> Result<Option<crate::util::Vec4>> {
    if s.read_present()? {
        Ok(Some(s.read_vec4()?))
    } else {
        Ok(None)
    }
}

fn read_color_channel(s: &mut IStream<'_>) -> Result<ColorChannel> {
    Ok(ColorChannel {
        color: read_opt_color(s)?,
        texture: s.read_opt_str()?,
        mix: s.read_f32()?,
    })
}

fn read_material(s: &mut IStream<'_>) -> Result<Material> {
    let mut m = Material::new();
    if s.read_present()? {
        m.albedo = Some(read_color_channel(s)?);
    }
    if s.read_present()? {
        m.specular = Some(SpecularChannel {
            color: read_opt_color(s)?,
            texture: s.read_opt_str()?,
            mix: s.read_f32()?,
            shininess: s.read_f32()?,
            intensity: s.read_f32()?,
        });
    }
    if s.read_present()? {
        m.emissive = Some(read_color_channel(s)?);
    }
    if s.read_present()? {
        m.normal_map = Some(NormalMapChannel {
            texture: s.read_opt_str()?,
            intensity: s.read_f32()?,
        });
    }
    if s.read_present()? {
        m.pbr = Some(PbrSettings::new(s.read_f32()?, s.read_f32()?, s.read_f32()?));
    }
    Ok(m)
}

fn read_camera(s: &mut IStream<'_>) -> Result<Camera> {
    let pos = s.pos();
    let projection = ProjectionMethod::from_u8(s.read_u8()?)
        .ok_or_else(|| Error::invalid(format!("invalid projection method at {pos}")))?;
    Ok(Camera {
        projection,
        fov: s.read_f32()?,
        clipping_planes: s.read_vec2()?,
        viewport: s.read_vec4()?,
        clear_color: s.read_bool()?,
        clear_depth: s.read_bool()?,
        layer: s.read_i32()?,
        background_color: s.read_vec4()?,
        active: s.read_bool()?,
    })
}

fn read_light(s: &mut IStream<'_>) -> Result<Light> {
    let active = s.read_bool()?;
    let color = s.read_vec4()?;
    let max_distance = s.read_f32()?;
    let strength = s.read_f32()?;
    let pos = s.pos();
    let light_type = LightType::from_u8(s.read_u8()?)
        .ok_or_else(|| Error::invalid(format!("invalid light type at {pos}")))?;
    Ok(Light {
        active,
        color,
        max_distance,
        strength,
        light_type,
        outer_cone_angle: s.read_f32()?,
        inner_cone_angle: s.read_f32()?,
    })
}
