//! Triangle mesh with edge topology.
//!
//! The mesh is the slicer's ingress type: float vertices in millimetres and
//! indexed triangles. Each triangle additionally carries three edge-id
//! slots that are filled when the [`EdgeMap`] is built; the segment chainer
//! uses those ids to stitch plane-intersection segments without geometric
//! search.
//!
//! Mutation marks the topology and cached statistics dirty; `prepare()`
//! rebuilds both so the mesh can then be shared immutably across slicing
//! workers.

pub mod primitives;
pub mod topology;

use std::collections::HashMap;

use glam::Vec3;
use thiserror::Error;

use crate::bounds::BoundingBox3;
pub use topology::{EdgeMap, MeshEdge, NO_TRIANGLE};

/// Sentinel for an unassigned edge slot.
pub const NO_EDGE: u32 = u32::MAX;

/// Indexed triangle: three vertex indices plus the ids of the mesh edges
/// opposite each ordered vertex pair, filled by the topology build.
#[derive(Clone, Copy, Debug)]
pub struct MeshTriangle {
  pub vertices: [u32; 3],
  /// `edges[k]` is the mesh edge for the pair `(vertices[k], vertices[(k+1)%3])`.
  pub edges: [u32; 3],
}

impl MeshTriangle {
  pub fn new(vertices: [u32; 3]) -> Self {
    Self {
      vertices,
      edges: [NO_EDGE; 3],
    }
  }
}

/// Appendable vertex and triangle arrays.
#[derive(Clone, Debug, Default)]
pub struct IndexedTriangleSet {
  pub vertices: Vec<Vec3>,
  pub triangles: Vec<MeshTriangle>,
}

impl IndexedTriangleSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_vertex(&mut self, v: Vec3) -> u32 {
    self.vertices.push(v);
    (self.vertices.len() - 1) as u32
  }

  pub fn add_triangle(&mut self, vertices: [u32; 3]) -> u32 {
    self.triangles.push(MeshTriangle::new(vertices));
    (self.triangles.len() - 1) as u32
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  /// Corner positions of triangle `t`.
  #[inline]
  pub fn triangle_points(&self, t: u32) -> [Vec3; 3] {
    let tri = &self.triangles[t as usize];
    [
      self.vertices[tri.vertices[0] as usize],
      self.vertices[tri.vertices[1] as usize],
      self.vertices[tri.vertices[2] as usize],
    ]
  }
}

/// Mesh validation failures. These indicate caller bugs, not geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
  #[error("triangle {triangle} references vertex {index} but the mesh has {vertex_count} vertices")]
  VertexIndexOutOfRange {
    triangle: u32,
    index: u32,
    vertex_count: usize,
  },

  #[error("triangle {triangle} repeats a vertex index")]
  RepeatedVertex { triangle: u32 },
}

/// Cached mesh summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshStats {
  pub vertex_count: usize,
  pub triangle_count: usize,
  pub bounding_box: BoundingBox3,
}

/// Owning triangle mesh with lazily rebuilt topology and statistics.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
  set: IndexedTriangleSet,
  /// Bit-exact position dedup so shared vertices share an index; without
  /// shared indices the edge map cannot merge coincident edges.
  vertex_lookup: HashMap<[u32; 3], u32>,
  topology: EdgeMap,
  topology_dirty: bool,
  stats: MeshStats,
  stats_dirty: bool,
}

impl TriangleMesh {
  pub fn new() -> Self {
    Self::default()
  }

  /// Ingest an already-indexed vertex/face soup without dedup.
  pub fn from_indexed(vertices: Vec<Vec3>, faces: &[[u32; 3]]) -> Self {
    let mut set = IndexedTriangleSet::new();
    set.vertices = vertices;
    for &f in faces {
      set.add_triangle(f);
    }
    Self {
      set,
      vertex_lookup: HashMap::new(),
      topology: EdgeMap::default(),
      topology_dirty: true,
      stats: MeshStats::default(),
      stats_dirty: true,
    }
  }

  /// Append one triangle given corner positions, deduplicating vertices by
  /// exact float bits.
  pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) -> u32 {
    let ia = self.intern_vertex(a);
    let ib = self.intern_vertex(b);
    let ic = self.intern_vertex(c);
    self.topology_dirty = true;
    self.stats_dirty = true;
    self.set.add_triangle([ia, ib, ic])
  }

  fn intern_vertex(&mut self, v: Vec3) -> u32 {
    let key = [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()];
    if let Some(&idx) = self.vertex_lookup.get(&key) {
      return idx;
    }
    let idx = self.set.add_vertex(v);
    self.vertex_lookup.insert(key, idx);
    idx
  }

  #[inline]
  pub fn set(&self) -> &IndexedTriangleSet {
    &self.set
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.set.vertex_count()
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.set.triangle_count()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.set.triangles.is_empty()
  }

  /// Geometric normal of triangle `t`; zero for degenerate triangles.
  pub fn triangle_normal(&self, t: u32) -> Vec3 {
    let [a, b, c] = self.set.triangle_points(t);
    (b - a).cross(c - a).normalize_or_zero()
  }

  /// Area of triangle `t` in mm².
  pub fn triangle_area(&self, t: u32) -> f32 {
    let [a, b, c] = self.set.triangle_points(t);
    (b - a).cross(c - a).length() * 0.5
  }

  /// Rebuild topology and statistics if anything mutated since the last
  /// call. Required before sharing the mesh with slicing workers.
  pub fn prepare(&mut self) {
    if self.topology_dirty {
      self.topology = EdgeMap::build(&mut self.set);
      self.topology_dirty = false;
    }
    if self.stats_dirty {
      let mut bb = BoundingBox3::empty();
      for v in &self.set.vertices {
        bb.encapsulate(*v);
      }
      self.stats = MeshStats {
        vertex_count: self.set.vertex_count(),
        triangle_count: self.set.triangle_count(),
        bounding_box: bb,
      };
      self.stats_dirty = false;
    }
  }

  /// Edge topology. Call `prepare()` after mutation.
  #[inline]
  pub fn topology(&self) -> &EdgeMap {
    debug_assert!(!self.topology_dirty, "topology read while dirty");
    &self.topology
  }

  /// Cached statistics. Call `prepare()` after mutation.
  #[inline]
  pub fn stats(&self) -> &MeshStats {
    debug_assert!(!self.stats_dirty, "stats read while dirty");
    &self.stats
  }

  /// Mesh bounding box. Call `prepare()` after mutation.
  #[inline]
  pub fn bounding_box(&self) -> BoundingBox3 {
    self.stats().bounding_box
  }

  /// Structural validation: index ranges and repeated vertices.
  pub fn validate(&self) -> Result<(), MeshError> {
    let vertex_count = self.set.vertex_count();
    for (t, tri) in self.set.triangles.iter().enumerate() {
      for &v in &tri.vertices {
        if v as usize >= vertex_count {
          return Err(MeshError::VertexIndexOutOfRange {
            triangle: t as u32,
            index: v,
            vertex_count,
          });
        }
      }
      let [a, b, c] = tri.vertices;
      if a == b || b == c || a == c {
        return Err(MeshError::RepeatedVertex { triangle: t as u32 });
      }
    }
    Ok(())
  }
}
