//! Name-keyed reference cache for meshes and materials.

use std::collections::HashMap;

/// Which cache a lookup targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
    Mesh,
    Material,
}

/// Maps component names to their index in the component table.
///
/// Scoped to one document build.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    meshes: HashMap<String, u32>,
    materials: HashMap<String, u32>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: CacheKind) -> &HashMap<String, u32> {
        match kind {
            CacheKind::Mesh => &self.meshes,
            CacheKind::Material => &self.materials,
        }
    }

    /// Cached index for `name`.
    pub fn get(&self, kind: CacheKind, name: &str) -> Option<u32> {
        self.map(kind).get(name).copied()
    }

    /// Record `name -> index`. The first mapping for a name wins.
    pub fn insert(&mut self, kind: CacheKind, name: &str, index: u32) {
        let map = match kind {
            CacheKind::Mesh => &mut self.meshes,
            CacheKind::Material => &mut self.materials,
        };
        map.entry(name.to_string()).or_insert(index);
    }

    pub fn contains(&self, kind: CacheKind, name: &str) -> bool {
        self.map(kind).contains_key(name)
    }

    /// Number of cached entries of `kind`.
    pub fn len(&self, kind: CacheKind) -> usize {
        self.map(kind).len()
    }
}
