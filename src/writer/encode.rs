//! Binary encoding of scene documents.
//!
//! Component payloads are independent once the table is fixed, so they are
//! encoded in parallel and then written in table order.

use std::io::Write;

use rayon::prelude::*;

use crate::format::{ABSENT, CONTAINER_VERSION, FUS_MAGIC, PRESENT};
use crate::material::{ColorChannel, Material};
use crate::scene::{Camera, Component, ComponentData, Header, Light, Mesh, Node, SceneDocument, Transform};
use crate::util::{Result, Vec4};

use super::stream::OStream;

/// Encode a whole document.
pub fn encode_document(doc: &SceneDocument) -> Result<Vec<u8>> {
    let mut stream = OStream::new(Vec::new());
    write_document(&mut stream, doc)?;
    Ok(stream.into_inner())
}

/// Write a whole document to `stream`.
pub fn write_document<W: Write>(stream: &mut OStream<W>, doc: &SceneDocument) -> Result<()> {
    let payloads = doc
        .components
        .par_iter()
        .map(|c| encode_payload(&c.data))
        .collect::<Result<Vec<_>>>()?;

    write_preamble(stream)?;
    write_header(stream, &doc.header)?;

    stream.write_len(doc.components.len())?;
    for (component, payload) in doc.components.iter().zip(&payloads) {
        write_component(stream, component, payload)?;
    }

    stream.write_len(doc.children.len())?;
    for node in &doc.children {
        write_node(stream, node)?;
    }

    tracing::debug!(
        "encoded {} components, {} nodes, {} bytes",
        doc.components.len(),
        doc.node_count(),
        stream.pos()
    );
    stream.flush()
}

fn write_preamble<W: Write>(s: &mut OStream<W>) -> Result<()> {
    s.write_bytes(FUS_MAGIC)?;
    s.write_u8(0)?; // flags
    s.write_u16(CONTAINER_VERSION)
}

fn write_header<W: Write>(s: &mut OStream<W>, header: &Header) -> Result<()> {
    s.write_u32(header.format_version)?;
    s.write_str(&header.generator)?;
    s.write_str(&header.created_by)?;
    s.write_str(&header.creation_date)
}

fn write_component<W: Write>(s: &mut OStream<W>, c: &Component, payload: &[u8]) -> Result<()> {
    s.write_u8(c.kind().tag())?;
    s.write_opt_str(c.name.as_deref())?;
    s.write_len(payload.len())?;
    s.write_bytes(payload)
}

fn write_node<W: Write>(s: &mut OStream<W>, node: &Node) -> Result<()> {
    s.write_opt_str(node.name.as_deref())?;
    s.write_len(node.components.len())?;
    for &index in &node.components {
        s.write_u32(index)?;
    }
    s.write_len(node.children.len())?;
    for child in &node.children {
        write_node(s, child)?;
    }
    Ok(())
}

/// Encode one component payload.
pub fn encode_payload(data: &ComponentData) -> Result<Vec<u8>> {
    let mut s = OStream::new(Vec::new());
    match data {
        ComponentData::Transform(t) => write_transform(&mut s, t)?,
        ComponentData::Mesh(m) => write_mesh(&mut s, m)?,
        ComponentData::Material(m) => write_material(&mut s, m)?,
        ComponentData::Camera(c) => write_camera(&mut s, c)?,
        ComponentData::Light(l) => write_light(&mut s, l)?,
    }
    Ok(s.into_inner())
}

fn write_transform(s: &mut OStream<Vec<u8>>, t: &Transform) -> Result<()> {
    s.write_vec3(t.translation)?;
    s.write_vec3(t.rotation)?;
    s.write_vec3(t.scale)
}

fn write_mesh(s: &mut OStream<Vec<u8>>, m: &Mesh) -> Result<()> {
    s.write_len(m.vertices.len())?;
    for &v in &m.vertices {
        s.write_vec3(v)?;
    }
    s.write_len(m.normals.len())?;
    for &n in &m.normals {
        s.write_vec3(n)?;
    }
    s.write_len(m.uvs.len())?;
    for &uv in &m.uvs {
        s.write_vec2(uv)?;
    }
    s.write_len(m.tangents.len())?;
    for &t in &m.tangents {
        s.write_vec4(t)?;
    }
    s.write_len(m.bitangents.len())?;
    for &b in &m.bitangents {
        s.write_vec3(b)?;
    }
    s.write_len(m.triangles.len())?;
    for &i in &m.triangles {
        s.write_u16(i)?;
    }
    s.write_vec3(m.bounding_box.min)?;
    s.write_vec3(m.bounding_box.max)
}

fn write_opt_color(s: &mut OStream<Vec<u8>>, color: Option<Vec4>) -> Result<()> {
    match color {
        Some(c) => {
            s.write_u8(PRESENT)?;
            s.write_vec4(c)
        }
        None => s.write_u8(ABSENT),
    }
}

fn write_color_channel(s: &mut OStream<Vec<u8>>, c: &ColorChannel) -> Result<()> {
    write_opt_color(s, c.color)?;
    s.write_opt_str(c.texture.as_deref())?;
    s.write_f32(c.mix)
}

fn write_material(s: &mut OStream<Vec<u8>>, m: &Material) -> Result<()> {
    match &m.albedo {
        Some(c) => {
            s.write_u8(PRESENT)?;
            write_color_channel(s, c)?;
        }
        None => s.write_u8(ABSENT)?,
    }
    match &m.specular {
        Some(c) => {
            s.write_u8(PRESENT)?;
            write_opt_color(s, c.color)?;
            s.write_opt_str(c.texture.as_deref())?;
            s.write_f32(c.mix)?;
            s.write_f32(c.shininess)?;
            s.write_f32(c.intensity)?;
        }
        None => s.write_u8(ABSENT)?,
    }
    match &m.emissive {
        Some(c) => {
            s.write_u8(PRESENT)?;
            write_color_channel(s, c)?;
        }
        None => s.write_u8(ABSENT)?,
    }
    match &m.normal_map {
        Some(c) => {
            s.write_u8(PRESENT)?;
            s.write_opt_str(c.texture.as_deref())?;
            s.write_f32(c.intensity)?;
        }
        None => s.write_u8(ABSENT)?,
    }
    match &m.pbr {
        Some(p) => {
            s.write_u8(PRESENT)?;
            s.write_f32(p.roughness)?;
            s.write_f32(p.fresnel_reflectance)?;
            s.write_f32(p.diffuse_fraction)?;
        }
        None => s.write_u8(ABSENT)?,
    }
    Ok(())
}

fn write_camera(s: &mut OStream<Vec<u8>>, c: &Camera) -> Result<()> {
    s.write_u8(c.projection.to_u8())?;
    s.write_f32(c.fov)?;
    s.write_vec2(c.clipping_planes)?;
    s.write_vec4(c.viewport)?;
    s.write_bool(c.clear_color)?;
    s.write_bool(c.clear_depth)?;
    s.write_i32(c.layer)?;
    s.write_vec4(c.background_color)?;
    s.write_bool(c.active)
}

fn write_light(s: &mut OStream<Vec<u8>>, l: &Light) -> Result<()> {
    s.write_bool(l.active)?;
    s.write_vec4(l.color)?;
    s.write_f32(l.max_distance)?;
    s.write_f32(l.strength)?;
    s.write_u8(l.light_type.to_u8())?;
    s.write_f32(l.outer_cone_angle)?;
    s.write_f32(l.inner_cone_angle)
}
