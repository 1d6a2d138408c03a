//! Streaming scene writer.
//!
//! [`SceneWriter`] is the build session for one document. The traversal
//! driver positions a cursor with [`add_child`](SceneWriter::add_child),
//! [`push`](SceneWriter::push) and [`pop`](SceneWriter::pop) and attaches
//! components to the current node. Materials and meshes are streamed between
//! `begin_*` and `end_*` calls; only one streaming component may be open at a
//! time. Named meshes and materials are cached so later nodes can reference
//! them instead of encoding them again.
//!
//! ```ignore
//! let mut w = SceneWriter::new(Header::default());
//! w.add_child(Some("Root"));
//! w.add_transform(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)?;
//! w.push()?;
//! w.add_child(Some("Child"));
//! w.pop()?;
//! let bytes = w.serialize()?;
//! ```

mod cache;
mod chunk;
mod cursor;
mod encode;
mod stream;

#[cfg(test)]
mod tests;

pub use cache::{CacheKind, ReferenceCache};
pub use chunk::{MeshChunkBuilder, VertexKey, VertexRecord};
pub use cursor::{NodeCursor, NodeEntry, NodeId};
pub use encode::{encode_document, encode_payload, write_document};
pub use stream::OStream;

use std::path::Path;

use crate::material::{ColorChannel, Material, NormalMapChannel, PbrSettings, SpecularChannel};
use crate::scene::{
    Camera, Component, ComponentData, ComponentKind, Header, Light, Mesh, SceneDocument, Transform,
};
use crate::util::{Error, Result, Vec3};

/// Component being streamed.
#[derive(Debug)]
enum OpenComponent {
    Material { index: u32, material: Material },
    Mesh { index: u32, builder: MeshChunkBuilder },
}

impl OpenComponent {
    fn kind(&self) -> ComponentKind {
        match self {
            Self::Material { .. } => ComponentKind::Material,
            Self::Mesh { .. } => ComponentKind::Mesh,
        }
    }
}

/// Build session for one scene document.
#[derive(Debug)]
pub struct SceneWriter {
    header: Header,
    components: Vec<Component>,
    cursor: NodeCursor,
    cache: ReferenceCache,
    open: Option<OpenComponent>,
}

impl Default for SceneWriter {
    fn default() -> Self {
        Self::new(Header::default())
    }
}

impl SceneWriter {
    /// Create an empty writer.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            components: Vec::new(),
            cursor: NodeCursor::new(),
            cache: ReferenceCache::new(),
            open: None,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Components appended so far.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of unmatched `push()` calls.
    #[inline]
    pub fn depth(&self) -> usize {
        self.cursor.depth()
    }

    // ------------------------------------------------------------------
    // Node tree
    // ------------------------------------------------------------------

    /// Append a node at the current depth and make it current.
    pub fn add_child(&mut self, name: Option<&str>) -> NodeId {
        self.cursor.add_child(name)
    }

    /// Descend into the current node.
    pub fn push(&mut self) -> Result<()> {
        self.cursor.push()?;
        tracing::trace!("push -> depth {}", self.cursor.depth());
        Ok(())
    }

    /// Ascend one level.
    pub fn pop(&mut self) -> Result<()> {
        self.cursor.pop()?;
        tracing::trace!("pop -> depth {}", self.cursor.depth());
        Ok(())
    }

    /// Node open at the current depth.
    pub fn current_node(&self) -> Option<&NodeEntry> {
        self.cursor.current().and_then(|id| self.cursor.node(id))
    }

    // ------------------------------------------------------------------
    // Component table and reference cache
    // ------------------------------------------------------------------

    fn ensure_closed(&self, requested: ComponentKind) -> Result<()> {
        match &self.open {
            Some(open) => Err(Error::OpenComponent { open: open.kind(), requested }),
            None => Ok(()),
        }
    }

    fn push_component(&mut self, name: Option<&str>, data: ComponentData) -> Result<u32> {
        if self.cursor.current().is_none() {
            return Err(Error::NoCurrentNode);
        }
        let index = u32::try_from(self.components.len())
            .map_err(|_| Error::other("component table exceeds u32 indices"))?;
        self.components.push(Component::new(name, data));
        self.cursor.attach(index)?;
        Ok(index)
    }

    /// Append a component and attach it to the current node.
    pub fn add_component(&mut self, name: Option<&str>, data: ComponentData) -> Result<u32> {
        self.ensure_closed(data.kind())?;
        self.push_component(name, data)
    }

    /// Attach the cached component `name` to the current node.
    ///
    /// Returns `false` without touching the document when `name` is not cached.
    pub fn try_reference(&mut self, kind: CacheKind, name: &str) -> Result<bool> {
        if self.cursor.current().is_none() {
            return Err(Error::NoCurrentNode);
        }
        match self.cache.get(kind, name) {
            Some(index) => {
                self.cursor.attach(index)?;
                tracing::debug!("reference {:?} '{}' -> component {}", kind, name, index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn try_reference_mesh(&mut self, name: &str) -> Result<bool> {
        self.try_reference(CacheKind::Mesh, name)
    }

    pub fn try_reference_material(&mut self, name: &str) -> Result<bool> {
        self.try_reference(CacheKind::Material, name)
    }

    /// Record `name -> index` for later references.
    pub fn cache_insert(&mut self, kind: CacheKind, name: &str, index: u32) {
        self.cache.insert(kind, name, index);
    }

    /// Triangle index count of the cached mesh `name`.
    ///
    /// `None` while that mesh is still being streamed.
    pub fn get_referenced_mesh_triangle_count(&self, name: &str) -> Option<usize> {
        let index = self.cache.get(CacheKind::Mesh, name)?;
        if matches!(self.open, Some(OpenComponent::Mesh { index: open, .. }) if open == index) {
            return None;
        }
        self.components
            .get(index as usize)
            .and_then(Component::as_mesh)
            .map(Mesh::index_count)
    }

    // ------------------------------------------------------------------
    // Simple components
    // ------------------------------------------------------------------

    /// Append an anonymous transform.
    pub fn add_transform(&mut self, translation: Vec3, rotation: Vec3, scale: Vec3) -> Result<u32> {
        self.add_component(None, ComponentData::Transform(Transform::new(translation, rotation, scale)))
    }

    pub fn add_camera(&mut self, camera: Camera) -> Result<u32> {
        self.add_component(None, ComponentData::Camera(camera))
    }

    pub fn add_light(&mut self, light: Light) -> Result<u32> {
        self.add_component(None, ComponentData::Light(light))
    }

    /// Append a complete material; named materials are cached.
    pub fn add_material(&mut self, name: Option<&str>, material: Material) -> Result<u32> {
        let index = self.add_component(name, ComponentData::Material(material))?;
        if let Some(name) = name {
            self.cache.insert(CacheKind::Material, name, index);
        }
        Ok(index)
    }

    // ------------------------------------------------------------------
    // Streaming material
    // ------------------------------------------------------------------

    /// Open a material; channels are added until [`end_material`](Self::end_material).
    pub fn begin_material(&mut self, name: Option<&str>) -> Result<u32> {
        self.ensure_closed(ComponentKind::Material)?;
        let index = self.push_component(name, ComponentData::Material(Material::new()))?;
        if let Some(name) = name {
            self.cache.insert(CacheKind::Material, name, index);
        }
        self.open = Some(OpenComponent::Material { index, material: Material::new() });
        Ok(index)
    }

    fn open_material(&mut self) -> Result<&mut Material> {
        match self.open.as_mut() {
            Some(OpenComponent::Material { material, .. }) => Ok(material),
            _ => Err(Error::NoOpenComponent(ComponentKind::Material)),
        }
    }

    pub fn add_albedo(&mut self, channel: ColorChannel) -> Result<()> {
        self.open_material()?.albedo = Some(channel);
        Ok(())
    }

    pub fn add_specular(&mut self, channel: SpecularChannel) -> Result<()> {
        self.open_material()?.specular = Some(channel);
        Ok(())
    }

    pub fn add_emissive(&mut self, channel: ColorChannel) -> Result<()> {
        self.open_material()?.emissive = Some(channel);
        Ok(())
    }

    pub fn add_normal_map(&mut self, channel: NormalMapChannel) -> Result<()> {
        self.open_material()?.normal_map = Some(channel);
        Ok(())
    }

    pub fn add_pbr(&mut self, pbr: PbrSettings) -> Result<()> {
        self.open_material()?.pbr = Some(pbr);
        Ok(())
    }

    /// Close the open material and store it in its table slot.
    pub fn end_material(&mut self) -> Result<u32> {
        match self.open.take() {
            Some(OpenComponent::Material { index, material }) => {
                self.components[index as usize].data = ComponentData::Material(material);
                Ok(index)
            }
            other => {
                self.open = other;
                Err(Error::NoOpenComponent(ComponentKind::Material))
            }
        }
    }

    // ------------------------------------------------------------------
    // Streaming mesh
    // ------------------------------------------------------------------

    /// Open a mesh chunk seeded with `first`.
    pub fn begin_mesh(&mut self, first: VertexRecord, name: Option<&str>) -> Result<u32> {
        self.ensure_closed(ComponentKind::Mesh)?;
        let index = self.push_component(name, ComponentData::Mesh(Mesh::default()))?;
        if let Some(name) = name {
            self.cache.insert(CacheKind::Mesh, name, index);
        }
        self.open = Some(OpenComponent::Mesh { index, builder: MeshChunkBuilder::begin(first) });
        Ok(index)
    }

    fn open_mesh(&self) -> Option<&MeshChunkBuilder> {
        match &self.open {
            Some(OpenComponent::Mesh { builder, .. }) => Some(builder),
            _ => None,
        }
    }

    /// Add a vertex to the open mesh chunk; returns its triangle index.
    pub fn add_vertex(&mut self, v: VertexRecord) -> Result<u16> {
        match self.open.as_mut() {
            Some(OpenComponent::Mesh { builder, .. }) => builder.add_vertex(v),
            _ => Err(Error::NoOpenComponent(ComponentKind::Mesh)),
        }
    }

    /// Whether the open mesh chunk accepts another vertex. False when no mesh is open.
    pub fn has_capacity(&self) -> bool {
        self.open_mesh().is_some_and(MeshChunkBuilder::has_capacity)
    }

    /// Seal the open mesh chunk.
    pub fn end_mesh(&mut self) -> Result<&Mesh> {
        match self.open.take() {
            Some(OpenComponent::Mesh { index, builder }) => {
                let slot = &mut self.components[index as usize];
                slot.data = ComponentData::Mesh(builder.finish());
                slot.as_mesh().ok_or_else(|| Error::other("mesh slot holds another component"))
            }
            other => {
                self.open = other;
                Err(Error::NoOpenComponent(ComponentKind::Mesh))
            }
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    fn check_complete(&self) -> Result<()> {
        if let Some(open) = &self.open {
            return Err(Error::UnfinishedComponent(open.kind()));
        }
        if self.cursor.depth() != 0 {
            return Err(Error::UnbalancedStack { depth: self.cursor.depth() });
        }
        Ok(())
    }

    /// Seal the build and return the document.
    pub fn finalize(self) -> Result<SceneDocument> {
        self.check_complete()?;
        tracing::debug!(
            "finalize: {} components, {} nodes, {} cached meshes, {} cached materials",
            self.components.len(),
            self.cursor.len(),
            self.cache.len(CacheKind::Mesh),
            self.cache.len(CacheKind::Material)
        );
        let children = self.cursor.to_tree();
        Ok(SceneDocument { header: self.header, components: self.components, children })
    }

    /// Seal the build and encode it.
    pub fn serialize(self) -> Result<Vec<u8>> {
        self.finalize()?.to_bytes()
    }

    /// Seal the build and write it to `path`.
    pub fn write_file(self, path: impl AsRef<Path>) -> Result<SceneDocument> {
        let doc = self.finalize()?;
        doc.write_file(path)?;
        Ok(doc)
    }
}

impl SceneDocument {
    /// Write the encoded document to `path`.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut stream = OStream::create(path)?;
        write_document(&mut stream, self)
    }
}
