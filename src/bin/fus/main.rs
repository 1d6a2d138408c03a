//! fus CLI - Tool for inspecting and writing FUSEE scene files.

use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use fus::export::{
    ExportSettings, MaterialSlot, SceneExporter, SourceCamera, SourceData, SourceLight, SourceLightKind,
    SourceMesh, SourceNode, SourceObject, SourceProjection, SourceTriangle,
};
use fus::material::{ColorInput, PrincipledBsdf, ShaderGraph, ShaderNode};
use fus::prelude::*;
use fus::util::DVec3;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("fus");

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(level);

    let Some(&command) = filtered_args.first() else {
        print_usage(prog);
        return Ok(());
    };
    let file = filtered_args.get(1).copied();

    match (command, file) {
        ("info" | "i", Some(path)) => cmd_info(path),
        ("tree" | "t", Some(path)) => cmd_tree(path),
        ("json" | "j", Some(path)) => cmd_json(path),
        ("demo" | "d", Some(path)) => cmd_demo(path),
        ("help" | "h" | "-h" | "--help", _) => {
            print_usage(prog);
            Ok(())
        }
        ("info" | "i" | "tree" | "t" | "json" | "j" | "demo" | "d", None) => {
            bail!("Usage: {prog} {command} <file.fus>")
        }
        // Assume it's a file path
        (path, _) if Path::new(path).exists() => cmd_info(path),
        (other, _) => {
            print_usage(prog);
            bail!("Unknown command: {other}")
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // ignore a subscriber installed by an embedding process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_usage(prog: &str) {
    println!("fus CLI - Inspect and write FUSEE scene files");
    println!();
    println!("Usage: {} [options] <command> <file.fus>", prog);
    println!();
    println!("Commands:");
    println!("  i, info    Show header and table summary");
    println!("  t, tree    Show node hierarchy with components");
    println!("  j, json    Dump the document as JSON");
    println!("  d, demo    Write a small sample scene");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Errors only");
    println!();
    println!("RUST_LOG overrides the level set by the options.");
}

fn open(path: &str) -> anyhow::Result<SceneDocument> {
    tracing::debug!("Opening document: {}", path);
    read_document_file(path).with_context(|| format!("Failed to open {path}"))
}

fn cmd_info(path: &str) -> anyhow::Result<()> {
    let doc = open(path)?;

    println!("Document: {}", path);
    println!("Version: {}", doc.header.format_version);
    println!("Generator: {}", doc.header.generator);
    println!("Created by: {}", doc.header.created_by);
    println!("Created: {}", doc.header.creation_date);
    println!();

    let mut counts = [0usize; 5];
    let mut vertices = 0;
    let mut triangles = 0;
    let mut bounds = BBox3f::EMPTY;
    for c in &doc.components {
        counts[c.kind().tag() as usize] += 1;
        if let Some(mesh) = c.as_mesh() {
            vertices += mesh.vertex_count();
            triangles += mesh.triangle_count();
            bounds.expand_by_point(mesh.bounding_box.min);
            bounds.expand_by_point(mesh.bounding_box.max);
        }
    }

    println!("Nodes: {}", doc.node_count());
    println!("Components: {}", doc.components.len());
    for kind in [
        ComponentKind::Transform,
        ComponentKind::Mesh,
        ComponentKind::Material,
        ComponentKind::Camera,
        ComponentKind::Light,
    ] {
        println!("  {:<10} {}", kind.name(), counts[kind.tag() as usize]);
    }
    println!("Vertices: {}", vertices);
    println!("Triangles: {}", triangles);
    if !bounds.is_empty() {
        // chunk-local bounds, not placed in world space
        println!("Mesh bounds: center {:?}, size {:?}", bounds.center(), bounds.size());
    }
    Ok(())
}

fn cmd_tree(path: &str) -> anyhow::Result<()> {
    let doc = open(path)?;
    doc.walk(|node, depth| {
        let kinds: Vec<String> = node
            .components
            .iter()
            .map(|&i| match doc.component(i) {
                Some(c) => match &c.name {
                    Some(name) => format!("{}#{} '{}'", c.kind(), i, name),
                    None => format!("{}#{}", c.kind(), i),
                },
                None => format!("?#{}", i),
            })
            .collect();
        println!(
            "{}{} [{}]",
            "  ".repeat(depth),
            node.name.as_deref().unwrap_or("<unnamed>"),
            kinds.join(", ")
        );
    });
    Ok(())
}

fn cmd_json(path: &str) -> anyhow::Result<()> {
    let doc = open(path)?;
    let value = json!({
        "header": {
            "format_version": doc.header.format_version,
            "generator": doc.header.generator,
            "created_by": doc.header.created_by,
            "creation_date": doc.header.creation_date,
        },
        "components": doc.components.iter().map(component_json).collect::<Vec<_>>(),
        "children": doc.children.iter().map(node_json).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn v2(v: Vec2) -> Value {
    json!(v.to_array())
}

fn v3(v: Vec3) -> Value {
    json!(v.to_array())
}

fn v4(v: Vec4) -> Value {
    json!(v.to_array())
}

fn color_json(c: &ColorChannel) -> Value {
    json!({ "color": c.color.map(v4), "texture": c.texture, "mix": c.mix })
}

fn component_json(c: &Component) -> Value {
    let payload = match &c.data {
        ComponentData::Transform(t) => json!({
            "translation": v3(t.translation),
            "rotation": v3(t.rotation),
            "scale": v3(t.scale),
        }),
        ComponentData::Mesh(m) => json!({
            "vertices": m.vertices.len(),
            "normals": m.normals.len(),
            "uvs": m.uvs.len(),
            "tangents": m.tangents.len(),
            "bitangents": m.bitangents.len(),
            "triangles": m.triangle_count(),
            "bounding_box": { "min": v3(m.bounding_box.min), "max": v3(m.bounding_box.max) },
        }),
        ComponentData::Material(m) => json!({
            "albedo": m.albedo.as_ref().map(color_json),
            "specular": m.specular.as_ref().map(|s| json!({
                "color": s.color.map(v4),
                "texture": s.texture,
                "mix": s.mix,
                "shininess": s.shininess,
                "intensity": s.intensity,
            })),
            "emissive": m.emissive.as_ref().map(color_json),
            "normal_map": m.normal_map.as_ref().map(|n| json!({
                "texture": n.texture,
                "intensity": n.intensity,
            })),
            "pbr": m.pbr.map(|p| json!({
                "roughness": p.roughness,
                "fresnel_reflectance": p.fresnel_reflectance,
                "diffuse_fraction": p.diffuse_fraction,
            })),
        }),
        ComponentData::Camera(c) => json!({
            "projection": format!("{:?}", c.projection),
            "fov": c.fov,
            "clipping_planes": v2(c.clipping_planes),
            "viewport": v4(c.viewport),
            "clear_color": c.clear_color,
            "clear_depth": c.clear_depth,
            "layer": c.layer,
            "background_color": v4(c.background_color),
            "active": c.active,
        }),
        ComponentData::Light(l) => json!({
            "type": format!("{:?}", l.light_type),
            "active": l.active,
            "color": v4(l.color),
            "max_distance": l.max_distance,
            "strength": l.strength,
            "outer_cone_angle": l.outer_cone_angle,
            "inner_cone_angle": l.inner_cone_angle,
        }),
    };
    json!({ "kind": c.kind().name(), "name": c.name, "data": payload })
}

fn node_json(node: &Node) -> Value {
    json!({
        "name": node.name,
        "components": node.components.to_vec(),
        "children": node.children.iter().map(node_json).collect::<Vec<_>>(),
    })
}

/// Six quads of an axis-aligned cube in source (Z-up) space.
fn cube_triangles(half: f32) -> Vec<SourceTriangle> {
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::NEG_Y, Vec3::Z),
        (Vec3::Y, Vec3::NEG_X, Vec3::Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::NEG_Y),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut out = Vec::new();
    for (n, u, v) in faces {
        let vert = |i: usize| {
            let (su, sv) = corners[i];
            VertexRecord::new((n + u * su + v * sv) * half)
                .with_normal(n)
                .with_uv(Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5))
        };
        out.push(SourceTriangle::new(0, [vert(0), vert(1), vert(2)]));
        out.push(SourceTriangle::new(0, [vert(0), vert(2), vert(3)]));
    }
    out
}

fn cmd_demo(path: &str) -> anyhow::Result<()> {
    let user = env::var("USER").or_else(|_| env::var("USERNAME")).unwrap_or_default();
    let settings = ExportSettings::new().with_header(Header::new(Header::default_generator(), user));

    let material = MaterialSlot::new(
        "Painted",
        ShaderGraph::new(vec![ShaderNode::Principled(PrincipledBsdf {
            base_color: ColorInput::value(Vec4::new(0.8, 0.2, 0.1, 1.0)),
            roughness: 0.4,
            ..PrincipledBsdf::default()
        })]),
    );
    let cube = SourceMesh {
        data_name: "Cube".into(),
        materials: vec![Some(material)],
        triangles: cube_triangles(1.0),
    };

    let lamp = SourceNode::new(
        "Lamp",
        DMat4::from_translation(DVec3::new(4.0, 1.0, 6.0)),
        SourceData::Light(SourceLight {
            kind: SourceLightKind::Point,
            color: Vec3::ONE,
            distance: 30.0,
            energy: 1000.0,
        }),
    );
    let scene = [
        SourceNode::new("Cube", DMat4::IDENTITY, SourceData::Mesh(cube.clone())).with_child(lamp),
        SourceNode::new(
            "Cube.001",
            DMat4::from_translation(DVec3::new(3.0, 0.0, 0.0)),
            SourceData::Mesh(cube),
        ),
        SourceNode::new(
            "Camera",
            DMat4::look_at_rh(DVec3::new(7.0, -7.0, 5.0), DVec3::ZERO, DVec3::Z).inverse(),
            SourceData::Camera(SourceCamera {
                projection: SourceProjection::Perspective,
                angle_y: 0.69,
                clip_start: 0.1,
                clip_end: 100.0,
            }),
        ),
    ];
    let roots: Vec<&dyn SourceObject> = scene.iter().map(|n| n as &dyn SourceObject).collect();

    let mut exporter = SceneExporter::new(settings);
    exporter.traverse_list(&roots)?;
    let output = exporter.write_file(path).with_context(|| format!("Failed to write {path}"))?;

    println!(
        "Wrote {} ({} nodes, {} components)",
        path,
        output.document.node_count(),
        output.document.components.len()
    );
    Ok(())
}
