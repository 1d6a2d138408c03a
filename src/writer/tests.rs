use super::*;
use crate::format::MAX_VERTS_PER_CHUNK;
use crate::material::Material;
use crate::scene::{LightType, ProjectionMethod};
use crate::util::{Vec2, Vec4};

fn header() -> Header {
    Header {
        format_version: 1,
        generator: "tests".into(),
        created_by: "tester".into(),
        creation_date: "1-1-2024".into(),
    }
}

fn vert(i: usize) -> VertexRecord {
    VertexRecord::new(Vec3::new(i as f32, (i % 7) as f32, -(i as f32)))
        .with_normal(Vec3::Z)
        .with_uv(Vec2::new(0.0, 1.0))
}

/// Feed `verts` through the writer the way a traversal driver does.
fn write_chunked(w: &mut SceneWriter, verts: &[VertexRecord]) -> Result<Vec<Mesh>> {
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < verts.len() {
        if !chunks.is_empty() {
            w.add_child(Some("chunk"));
        }
        w.begin_mesh(verts[i], None)?;
        i += 1;
        while i < verts.len() && w.has_capacity() {
            w.add_vertex(verts[i])?;
            i += 1;
        }
        chunks.push(w.end_mesh()?.clone());
    }
    Ok(chunks)
}

#[test]
fn test_end_to_end_root_and_child() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("Root"));
    w.add_transform(
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(4.0, 5.0, 6.0),
        Vec3::new(7.0, 8.0, 9.0),
    )?;
    w.push()?;
    w.add_child(Some("Child"));
    w.pop()?;
    let doc = w.finalize()?;

    assert_eq!(doc.children.len(), 1);
    let root = &doc.children[0];
    assert_eq!(root.name.as_deref(), Some("Root"));
    assert_eq!(root.components.len(), 1);
    let xf = doc.component(root.components[0]).and_then(Component::as_transform).expect("transform");
    assert_eq!(xf.translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(xf.scale, Vec3::new(7.0, 8.0, 9.0));

    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].name.as_deref(), Some("Child"));
    assert!(root.children[0].components.is_empty());
    Ok(())
}

#[test]
fn test_component_without_node_fails() {
    let mut w = SceneWriter::new(header());
    let err = w.add_transform(Vec3::ZERO, Vec3::ZERO, Vec3::ONE).unwrap_err();
    assert!(matches!(err, Error::NoCurrentNode));
    assert_eq!(w.component_count(), 0);

    w.add_child(Some("a"));
    w.push().expect("push");
    assert!(matches!(w.begin_mesh(vert(0), None), Err(Error::NoCurrentNode)));
    assert!(matches!(w.try_reference_mesh("x"), Err(Error::NoCurrentNode)));
    assert_eq!(w.component_count(), 0);
}

#[test]
fn test_balanced_push_pop_serializes() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.push()?;
    w.add_child(Some("b"));
    w.push()?;
    w.add_child(Some("c"));
    w.pop()?;
    w.pop()?;
    let bytes = w.serialize()?;
    assert_eq!(&bytes[..5], b"FUSEE");
    Ok(())
}

#[test]
fn test_extra_pop_is_unbalanced() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.push()?;
    w.pop()?;
    assert!(matches!(w.pop(), Err(Error::UnbalancedStack { .. })));
    Ok(())
}

#[test]
fn test_missing_pop_fails_finalize() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.push()?;
    assert!(matches!(w.finalize(), Err(Error::UnbalancedStack { depth: 1 })));
    Ok(())
}

#[test]
fn test_open_component_rules() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.begin_material(Some("m"))?;
    assert!(matches!(
        w.begin_mesh(vert(0), None),
        Err(Error::OpenComponent { open: ComponentKind::Material, requested: ComponentKind::Mesh })
    ));
    assert!(matches!(w.begin_material(None), Err(Error::OpenComponent { .. })));
    assert!(matches!(w.add_vertex(vert(0)), Err(Error::NoOpenComponent(ComponentKind::Mesh))));
    assert!(matches!(w.end_mesh(), Err(Error::NoOpenComponent(ComponentKind::Mesh))));
    // the material is still open after the failed calls
    w.add_albedo(ColorChannel::color(Vec4::ONE))?;
    w.end_material()?;
    assert!(matches!(w.end_material(), Err(Error::NoOpenComponent(ComponentKind::Material))));
    assert!(!w.has_capacity());
    Ok(())
}

#[test]
fn test_unfinished_component_fails_finalize() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.begin_mesh(vert(0), None)?;
    assert!(matches!(w.finalize(), Err(Error::UnfinishedComponent(ComponentKind::Mesh))));
    Ok(())
}

#[test]
fn test_streamed_material() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    let index = w.begin_material(Some("wood"))?;
    w.add_albedo(ColorChannel::new(Some(Vec4::new(0.5, 0.3, 0.1, 1.0)), Some("wood.png"), 0.5))?;
    w.add_specular(SpecularChannel::new(Some(Vec4::ONE), None, 1.0, 80.0, 0.4))?;
    w.add_normal_map(NormalMapChannel::new(Some("wood_n.png"), 0.3))?;
    w.add_pbr(PbrSettings::new(0.4, 0.2, 0.9))?;
    assert_eq!(w.end_material()?, index);

    let doc = w.finalize()?;
    let m = doc.component(index).and_then(Component::as_material).expect("material");
    assert_eq!(m.albedo.as_ref().and_then(|a| a.texture.as_deref()), Some("wood.png"));
    assert_eq!(m.specular.as_ref().map(|s| s.shininess), Some(80.0));
    assert!(m.emissive.is_none());
    assert_eq!(m.pbr, Some(PbrSettings::new(0.4, 0.2, 0.9)));
    assert_eq!(doc.components[index as usize].name.as_deref(), Some("wood"));
    Ok(())
}

#[test]
fn test_material_reference_cache() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    assert!(!w.try_reference_material("stone")?);
    let index = w.add_material(Some("stone"), Material::fallback())?;

    w.add_child(Some("b"));
    assert!(w.try_reference_material("stone")?);
    assert_eq!(w.current_node().map(|n| n.components.to_vec()), Some(vec![index]));
    assert_eq!(w.component_count(), 1);
    Ok(())
}

#[test]
fn test_mesh_reference_idempotence() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("first"));

    let nodes_before = w.current_node().map(|n| n.components.len());
    assert!(!w.try_reference_mesh("cube")?);
    assert_eq!(w.current_node().map(|n| n.components.len()), nodes_before);
    assert_eq!(w.component_count(), 0);

    let index = w.begin_mesh(vert(0), Some("cube"))?;
    w.add_vertex(vert(1))?;
    w.add_vertex(vert(2))?;
    w.end_mesh()?;

    w.add_child(Some("second"));
    let table = w.component_count();
    assert!(w.try_reference_mesh("cube")?);
    assert_eq!(w.component_count(), table);
    assert_eq!(w.current_node().map(|n| n.components.to_vec()), Some(vec![index]));
    assert_eq!(w.get_referenced_mesh_triangle_count("cube"), Some(3));
    assert_eq!(w.get_referenced_mesh_triangle_count("sphere"), None);
    Ok(())
}

#[test]
fn test_dedup_through_writer() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.begin_mesh(vert(0), None)?;
    w.add_vertex(vert(0))?;
    w.add_vertex(vert(0).with_uv(Vec2::new(0.5, 0.5)))?;
    let mesh = w.end_mesh()?;
    assert_eq!(mesh.vertices.len(), 2);
    assert_eq!(mesh.triangles, vec![0, 0, 1]);
    Ok(())
}

#[test]
fn test_bounding_box_uses_positions_only() -> Result<()> {
    let positions = [
        Vec3::new(1.0, -2.0, 3.0),
        Vec3::new(-4.0, 5.0, 0.5),
        Vec3::new(2.0, 0.0, -6.0),
    ];
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    let rec = |p: Vec3| VertexRecord::new(p).with_normal(Vec3::splat(100.0)).with_uv(Vec2::splat(-50.0));
    w.begin_mesh(rec(positions[0]), None)?;
    w.add_vertex(rec(positions[1]))?;
    w.add_vertex(rec(positions[2]))?;
    let mesh = w.end_mesh()?;
    assert_eq!(mesh.bounding_box.min, Vec3::new(-4.0, -2.0, -6.0));
    assert_eq!(mesh.bounding_box.max, Vec3::new(2.0, 5.0, 3.0));
    Ok(())
}

#[test]
fn test_chunk_limits_on_large_mesh() -> Result<()> {
    let count = MAX_VERTS_PER_CHUNK * 2 + 300;
    let verts: Vec<VertexRecord> = (0..count).map(vert).collect();

    let mut w = SceneWriter::new(header());
    w.add_child(Some("big"));
    let chunks = write_chunked(&mut w, &verts)?;

    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert_eq!(chunk.triangles.len() % 3, 0);
        assert!(chunk.vertices.len() <= MAX_VERTS_PER_CHUNK);
        assert!(chunk.triangles.iter().all(|&i| (i as usize) < chunk.vertices.len()));
    }
    let total: usize = chunks.iter().map(|c| c.triangles.len()).sum();
    assert_eq!(total, count);
    Ok(())
}

#[test]
fn test_chunk_limits_with_dedup_hits() -> Result<()> {
    // every 7th corner repeats the corner before it
    let count = MAX_VERTS_PER_CHUNK + 3000;
    let verts: Vec<VertexRecord> = (0..count)
        .map(|i| if i % 7 == 6 { vert(i - 1) } else { vert(i) })
        .collect();

    let mut w = SceneWriter::new(header());
    w.add_child(Some("big"));
    let chunks = write_chunked(&mut w, &verts)?;

    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert_eq!(chunk.triangles.len() % 3, 0);
        assert!(chunk.vertices.len() <= MAX_VERTS_PER_CHUNK);
        assert!(chunk.triangles.iter().all(|&i| (i as usize) < chunk.vertices.len()));
    }
    let total: usize = chunks.iter().map(|c| c.triangles.len()).sum();
    assert_eq!(total, count);
    Ok(())
}

#[test]
fn test_open_mesh_has_no_referenced_count() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    w.begin_mesh(vert(0), Some("tri"))?;
    w.add_vertex(vert(1))?;
    assert_eq!(w.get_referenced_mesh_triangle_count("tri"), None);
    w.add_vertex(vert(2))?;
    w.end_mesh()?;
    assert_eq!(w.get_referenced_mesh_triangle_count("tri"), Some(3));
    Ok(())
}

#[test]
fn test_camera_and_light() -> Result<()> {
    let mut w = SceneWriter::new(header());
    w.add_child(Some("cam"));
    w.add_camera(Camera::new(ProjectionMethod::Perspective, 0.7, 0.1, 50.0))?;
    w.add_child(Some("lamp"));
    w.add_light(Light { light_type: LightType::Spot, ..Light::default() })?;
    let doc = w.finalize()?;
    assert_eq!(doc.components[0].kind(), ComponentKind::Camera);
    assert_eq!(doc.components[1].kind(), ComponentKind::Light);
    assert_eq!(doc.children.len(), 2);
    Ok(())
}

#[test]
fn test_write_file() -> Result<()> {
    let temp = tempfile::NamedTempFile::new()?;
    let mut w = SceneWriter::new(header());
    w.add_child(Some("a"));
    let doc = w.write_file(temp.path())?;
    let bytes = std::fs::read(temp.path())?;
    assert_eq!(bytes, doc.to_bytes()?);
    Ok(())
}
