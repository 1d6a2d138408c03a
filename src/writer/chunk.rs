//! Mesh chunk builder with exact vertex deduplication.

use std::collections::HashMap;

use crate::format::MAX_VERTS_PER_CHUNK;
use crate::scene::Mesh;
use crate::util::{BBox3f, Error, Result, Vec2, Vec3, Vec4};

/// One vertex of a triangle soup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexRecord {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub uv: Option<Vec2>,
    pub tangent: Option<Vec4>,
    pub bitangent: Option<Vec3>,
}

impl VertexRecord {
    /// Position-only vertex.
    pub fn new(position: Vec3) -> Self {
        Self { position, normal: None, uv: None, tangent: None, bitangent: None }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_tangent(mut self, tangent: Vec4, bitangent: Vec3) -> Self {
        self.tangent = Some(tangent);
        self.bitangent = Some(bitangent);
        self
    }

    /// Dedup key over position, normal and uv.
    ///
    /// Missing normals key as `(1,1,1)` and missing uvs as `(1,1)`. Values
    /// compare by bit pattern except that `-0.0` and `0.0` are the same key.
    pub fn key(&self) -> VertexKey {
        let n = self.normal.unwrap_or(Vec3::ONE);
        let uv = self.uv.unwrap_or(Vec2::ONE);
        let raw: [f32; 8] = [
            self.position.x, self.position.y, self.position.z,
            n.x, n.y, n.z,
            uv.x, uv.y,
        ];
        let mut bits: [u32; 8] = bytemuck::cast(raw);
        for (b, v) in bits.iter_mut().zip(raw) {
            if v == 0.0 {
                *b = 0;
            }
        }
        VertexKey(bits)
    }
}

/// Exact-match vertex key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexKey([u32; 8]);

/// Builds one [`Mesh`] chunk.
#[derive(Debug)]
pub struct MeshChunkBuilder {
    mesh: Mesh,
    cache: HashMap<VertexKey, u16>,
    max_verts: usize,
}

impl MeshChunkBuilder {
    /// Start a chunk with `first` as vertex 0.
    pub fn begin(first: VertexRecord) -> Self {
        Self::with_limit(first, MAX_VERTS_PER_CHUNK)
    }

    /// Start a chunk with a smaller vertex limit (clamped to `3..=MAX_VERTS_PER_CHUNK`).
    pub fn with_limit(first: VertexRecord, max_verts: usize) -> Self {
        let mut builder = Self {
            mesh: Mesh {
                bounding_box: BBox3f::from_point(first.position),
                ..Mesh::default()
            },
            cache: HashMap::new(),
            max_verts: max_verts.clamp(3, MAX_VERTS_PER_CHUNK),
        };
        builder.append(first);
        builder
    }

    fn append(&mut self, v: VertexRecord) -> u16 {
        // bounded by max_verts <= MAX_VERTS_PER_CHUNK < u16::MAX
        let index = self.mesh.vertices.len() as u16;
        let m = &mut self.mesh;
        m.vertices.push(v.position);
        if let Some(n) = v.normal {
            m.normals.push(n);
        }
        if let Some(uv) = v.uv {
            m.uvs.push(uv);
        }
        if let Some(t) = v.tangent {
            m.tangents.push(t);
        }
        if let Some(b) = v.bitangent {
            m.bitangents.push(b);
        }
        m.bounding_box.expand_by_point(v.position);
        m.triangles.push(index);
        self.cache.insert(v.key(), index);
        index
    }

    /// Add a vertex, reusing an identical one already in this chunk.
    pub fn add_vertex(&mut self, v: VertexRecord) -> Result<u16> {
        match self.cache.get(&v.key()).copied() {
            Some(index) => {
                check_hit(index, self.mesh.vertices[index as usize], v.position)?;
                self.mesh.triangles.push(index);
                Ok(index)
            }
            None => Ok(self.append(v)),
        }
    }

    /// True while more vertices may be added.
    ///
    /// A started triangle is always allowed to complete. A new triangle is
    /// only started while three more distinct vertices still fit.
    pub fn has_capacity(&self) -> bool {
        self.mesh.triangles.len() % 3 != 0 || self.mesh.vertices.len() + 3 <= self.max_verts
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.mesh.triangles.len()
    }

    /// Mesh built so far.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Seal the chunk.
    pub fn finish(self) -> Mesh {
        tracing::debug!(
            "mesh chunk: {} triangles on {} vertices",
            self.mesh.triangle_count(),
            self.mesh.vertex_count()
        );
        self.mesh
    }
}

/// Positions equal as dedup keys: same bits, with `-0.0 == 0.0`.
fn same_position(a: Vec3, b: Vec3) -> bool {
    a.to_array()
        .into_iter()
        .zip(b.to_array())
        .all(|(x, y)| x.to_bits() == y.to_bits() || (x == 0.0 && y == 0.0))
}

/// A cache hit must point at the same position.
fn check_hit(index: u16, stored: Vec3, incoming: Vec3) -> Result<()> {
    if !same_position(stored, incoming) {
        return Err(Error::DuplicateKeyConflict {
            index,
            stored: stored.to_array(),
            incoming: incoming.to_array(),
        });
    }
    Ok(())
}
