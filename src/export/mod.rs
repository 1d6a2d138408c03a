//! Scene export: drives a [`SceneWriter`] from a source object graph.
//!
//! Every visited object gets its transform resolved against its converted
//! parent. Meshes are split into one bin per material slot and written in
//! chunks; each chunk is named after the mesh datablock, the material slot,
//! the chunk number and (when scale is baked) the baked scale, so objects
//! sharing a datablock reference the already written chunks.

mod source;

pub use source::*;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::material::{extract_material, Material, DEFAULT_MATERIAL_NAME};
use crate::scene::{Camera, Header, Light, LightType, ProjectionMethod, SceneDocument};
use crate::util::{swap_yz, DVec3, Error, Result, Vec3};
use crate::writer::{SceneWriter, VertexRecord};
use crate::xform::{ResolvedTransform, TransformResolver};

/// Default spot cone angles used for non-spot lights.
const DEFAULT_OUTER_CONE: f32 = 1.6;
const DEFAULT_INNER_CONE: f32 = 1.0;

/// Host energy units per unit of light strength.
const ENERGY_PER_STRENGTH: f32 = 1000.0;

/// What visiting one object produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Visited {
    /// No node; children stay at the current level.
    Skipped,
    /// Node without a Transform.
    Group,
    /// Node with a Transform; the resolver descended into it.
    Placed,
}

/// Export configuration.
#[derive(Clone, Debug)]
pub struct ExportSettings {
    /// Bake object scale into geometry and emit unit scale.
    pub apply_scale: bool,
    pub header: Header,
    /// Directory used to resolve `//`-relative texture paths.
    pub texture_base_dir: Option<PathBuf>,
    /// Name under which the fallback material is cached.
    pub default_material_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            apply_scale: true,
            header: Header::default(),
            texture_base_dir: None,
            default_material_name: DEFAULT_MATERIAL_NAME.to_string(),
        }
    }
}

impl ExportSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apply_scale(mut self, apply_scale: bool) -> Self {
        self.apply_scale = apply_scale;
        self
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn with_texture_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.texture_base_dir = Some(dir.into());
        self
    }

    pub fn with_default_material_name(mut self, name: impl Into<String>) -> Self {
        self.default_material_name = name.into();
        self
    }
}

/// Result of an export run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOutput {
    pub document: SceneDocument,
    /// Absolute paths of all textures referenced by exported materials.
    /// Copying them next to the document is left to the caller.
    pub textures: BTreeSet<PathBuf>,
}

/// Traversal driver for one export.
pub struct SceneExporter {
    settings: ExportSettings,
    writer: SceneWriter,
    xform: TransformResolver,
    textures: BTreeSet<PathBuf>,
}

impl SceneExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            writer: SceneWriter::new(settings.header.clone()),
            xform: TransformResolver::new(settings.apply_scale),
            textures: BTreeSet::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Writer state so far.
    pub fn writer(&self) -> &SceneWriter {
        &self.writer
    }

    /// Traverse sibling objects in order.
    pub fn traverse_list(&mut self, objects: &[&dyn SourceObject]) -> Result<()> {
        for obj in objects {
            self.traverse(*obj)?;
        }
        Ok(())
    }

    /// Visit `obj` and its subtree.
    pub fn traverse(&mut self, obj: &dyn SourceObject) -> Result<()> {
        tracing::trace!("visit '{}' at transform depth {}", obj.name(), self.xform.depth());
        let visited = self.visit(obj)?;

        let children = obj.children();
        if !children.is_empty() {
            if visited == Visited::Skipped {
                self.traverse_list(&children)?;
            } else {
                self.writer.push()?;
                self.traverse_list(&children)?;
                self.writer.pop()?;
            }
        }

        if visited == Visited::Placed {
            self.xform.pop();
        }
        Ok(())
    }

    /// Dispatch on the payload.
    ///
    /// Only objects that emit a Transform descend the resolver; children of
    /// groups and skipped objects resolve against the nearest placed ancestor.
    fn visit(&mut self, obj: &dyn SourceObject) -> Result<Visited> {
        let payload = obj.payload();
        match payload {
            SourcePayload::Armature => {
                self.writer.add_child(Some(obj.name()));
                return Ok(Visited::Group);
            }
            SourcePayload::Other(kind) => {
                tracing::warn!("object '{}' of type {} not handled", obj.name(), kind);
                return Ok(Visited::Skipped);
            }
            _ => {}
        }

        let resolved = self.xform.push(obj.world_matrix());
        match payload {
            SourcePayload::Mesh(mesh) => self.visit_mesh(obj.name(), mesh, &resolved)?,
            SourcePayload::Light(light) => self.visit_light(obj.name(), light, &resolved)?,
            SourcePayload::Camera(camera) => self.visit_camera(obj.name(), camera, &resolved)?,
            SourcePayload::Armature | SourcePayload::Other(_) => {}
        }
        Ok(Visited::Placed)
    }

    fn add_transform(&mut self, resolved: &ResolvedTransform) -> Result<()> {
        let t = &resolved.transform;
        self.writer.add_transform(t.translation, t.rotation, t.scale)?;
        Ok(())
    }

    fn visit_mesh(&mut self, name: &str, mesh: &SourceMesh, resolved: &ResolvedTransform) -> Result<()> {
        self.writer.add_child(Some(name));
        self.add_transform(resolved)?;

        let (scale, suffix) = if self.xform.apply_scale() {
            let s = resolved.source_scale;
            (s, format!("_scl{:?}_{:?}_{:?}", s.x, s.z, s.y))
        } else {
            (DVec3::ONE, String::new())
        };

        let bin_count = mesh.materials.len().max(1);
        let mut bins: Vec<Vec<VertexRecord>> = vec![Vec::new(); bin_count];
        for tri in &mesh.triangles {
            let bin = tri.material_index.min(bin_count - 1);
            bins[bin].extend(tri.vertices.iter().map(|v| to_target(v, scale)));
        }

        for (i, verts) in bins.iter().enumerate() {
            let slot = match mesh.materials.get(i) {
                Some(Some(slot)) if !slot.name.is_empty() => Some(slot),
                _ => None,
            };
            let material_name = slot.map_or(self.settings.default_material_name.as_str(), |s| s.name.as_str()).to_string();

            if bin_count > 1 {
                self.writer.push()?;
                self.writer.add_child(Some(&format!("{name}_{material_name}")));
            }

            match slot {
                Some(slot) => self.add_material(slot)?,
                None => self.add_default_material()?,
            }

            self.write_chunks(name, &mesh.data_name, i, &suffix, verts)?;

            if bin_count > 1 {
                self.writer.pop()?;
            }
        }
        Ok(())
    }

    fn write_chunks(
        &mut self,
        object_name: &str,
        data_name: &str,
        material_index: usize,
        suffix: &str,
        verts: &[VertexRecord],
    ) -> Result<()> {
        let mut next = 0;
        let mut chunk = 0;
        while next < verts.len() {
            let mesh_name = format!("{data_name}_mat{material_index}_chnk{chunk}{suffix}");
            if chunk > 0 {
                self.writer.push()?;
                self.writer.add_child(Some(object_name));
            }

            if self.writer.try_reference_mesh(&mesh_name)? {
                let advance = self
                    .writer
                    .get_referenced_mesh_triangle_count(&mesh_name)
                    .filter(|&n| n > 0)
                    .ok_or(Error::EmptyMesh)?;
                next += advance;
            } else {
                self.writer.begin_mesh(verts[next], Some(&mesh_name))?;
                next += 1;
                while next < verts.len() && self.writer.has_capacity() {
                    self.writer.add_vertex(verts[next])?;
                    next += 1;
                }
                self.writer.end_mesh()?;
            }

            if chunk > 0 {
                self.writer.pop()?;
            }
            chunk += 1;
        }
        Ok(())
    }

    fn add_material(&mut self, slot: &MaterialSlot) -> Result<()> {
        if self.writer.try_reference_material(&slot.name)? {
            return Ok(());
        }
        let extracted = extract_material(&slot.graph, self.settings.texture_base_dir.as_deref());
        self.textures.extend(extracted.textures);
        if extracted.is_fallback {
            return self.add_default_material();
        }
        self.stream_material(&slot.name, &extracted.material)
    }

    fn stream_material(&mut self, name: &str, material: &Material) -> Result<()> {
        self.writer.begin_material(Some(name))?;
        if let Some(albedo) = &material.albedo {
            self.writer.add_albedo(albedo.clone())?;
        }
        if let Some(specular) = &material.specular {
            self.writer.add_specular(specular.clone())?;
        }
        if let Some(emissive) = &material.emissive {
            self.writer.add_emissive(emissive.clone())?;
        }
        if let Some(normal_map) = &material.normal_map {
            self.writer.add_normal_map(normal_map.clone())?;
        }
        if let Some(pbr) = material.pbr {
            self.writer.add_pbr(pbr)?;
        }
        self.writer.end_material()?;
        Ok(())
    }

    fn add_default_material(&mut self) -> Result<()> {
        let name = self.settings.default_material_name.clone();
        if self.writer.try_reference_material(&name)? {
            return Ok(());
        }
        self.writer.add_material(Some(&name), Material::fallback())?;
        Ok(())
    }

    fn visit_light(&mut self, name: &str, light: &SourceLight, resolved: &ResolvedTransform) -> Result<()> {
        self.writer.add_child(Some(name));
        self.add_transform(resolved)?;

        let (light_type, outer, inner) = match light.kind {
            SourceLightKind::Spot { size, blend } => (LightType::Spot, size, size * (1.0 - blend)),
            SourceLightKind::Sun => (LightType::Parallel, DEFAULT_OUTER_CONE, DEFAULT_INNER_CONE),
            SourceLightKind::Point => (LightType::Point, DEFAULT_OUTER_CONE, DEFAULT_INNER_CONE),
        };
        self.writer.add_light(Light {
            active: true,
            color: light.color.extend(1.0),
            max_distance: light.distance,
            strength: light.energy / ENERGY_PER_STRENGTH,
            light_type,
            outer_cone_angle: outer,
            inner_cone_angle: inner,
        })?;
        Ok(())
    }

    fn visit_camera(&mut self, name: &str, camera: &SourceCamera, resolved: &ResolvedTransform) -> Result<()> {
        self.writer.add_child(Some(name));
        self.add_transform(resolved)?;

        let projection = match camera.projection {
            SourceProjection::Perspective => ProjectionMethod::Perspective,
            SourceProjection::Orthographic => {
                tracing::warn!("camera '{}': orthographic projection is only partially supported", name);
                ProjectionMethod::Orthographic
            }
        };
        self.writer.add_camera(Camera::new(projection, camera.angle_y, camera.clip_start, camera.clip_end))?;
        Ok(())
    }

    /// Seal the document.
    #[tracing::instrument(skip_all)]
    pub fn finish(self) -> Result<ExportOutput> {
        let document = self.writer.finalize()?;
        tracing::info!(
            "exported {} nodes, {} components, {} textures",
            document.node_count(),
            document.components.len(),
            self.textures.len()
        );
        Ok(ExportOutput { document, textures: self.textures })
    }

    /// Seal the document and write it to `path`.
    pub fn write_file(self, path: impl AsRef<Path>) -> Result<ExportOutput> {
        let output = self.finish()?;
        output.document.write_file(path)?;
        Ok(output)
    }
}

/// Export `roots` in one pass.
#[tracing::instrument(skip_all, fields(roots = roots.len()))]
pub fn export_scene(roots: &[&dyn SourceObject], settings: ExportSettings) -> Result<ExportOutput> {
    let mut exporter = SceneExporter::new(settings);
    exporter.traverse_list(roots)?;
    exporter.finish()
}

/// Convert a source-space vertex: bake `scale`, then swap into the Y-up convention.
fn to_target(v: &VertexRecord, scale: DVec3) -> VertexRecord {
    let baking = scale != DVec3::ONE;
    let direction = |d: Vec3, by_inverse: bool| -> Vec3 {
        if !baking {
            return swap_yz(d);
        }
        let d = d.as_dvec3();
        let d = if by_inverse { d / scale } else { d * scale };
        swap_yz(d.normalize_or_zero().as_vec3())
    };

    VertexRecord {
        position: swap_yz((v.position.as_dvec3() * scale).as_vec3()),
        normal: v.normal.map(|n| direction(n, true)),
        uv: v.uv,
        tangent: v.tangent.map(|t| direction(t.truncate(), false).extend(t.w)),
        bitangent: v.bitangent.map(|b| direction(b, false)),
    }
}
