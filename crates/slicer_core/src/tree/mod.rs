//! SAH-built AABB tree over mesh triangles.
//!
//! Built once per mesh, then shared read-only by slicing workers. Two
//! queries are served: which triangles may straddle a horizontal plane
//! (the per-layer candidate set) and nearest ray hit.
//!
//! The tree is flat: a node array plus a primitive-index array reordered by
//! construction. A node is either internal (left/right child indices) or a
//! leaf (a run `[prim_offset, prim_offset + prim_count)` in the primitive
//! array). A zero left-child discriminates leaves: slot 0 holds the root,
//! which is never anyone's child.

pub mod query;

use glam::Vec3;
use thiserror::Error;

use crate::bounds::BoundingBox3;
use crate::mesh::TriangleMesh;

pub use query::RayHit;

/// Leaf size threshold: ranges at or below this size stop splitting.
pub const MAX_LEAF: usize = 8;

/// Hard recursion cap; a leaf is emitted at this depth regardless of size.
pub const MAX_DEPTH: usize = 20;

/// SAH cost of traversing an internal node.
const TRAVERSAL_COST: f32 = 1.0;

/// SAH cost of one ray-triangle intersection.
const INTERSECT_COST: f32 = 1.25;

/// Number of candidate split positions sampled per axis.
const SPLIT_SAMPLES: usize = 16;

/// Flat tree node.
#[derive(Clone, Copy, Debug)]
pub struct TreeNode {
  pub bounds: BoundingBox3,
  /// Left child index; 0 marks a leaf.
  pub left: u32,
  /// Right child index; unused for leaves.
  pub right: u32,
  /// First primitive of the leaf run.
  pub prim_offset: u32,
  /// Primitive count of the leaf run; 0 for internal nodes.
  pub prim_count: u32,
}

impl TreeNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.left == 0
  }

  fn leaf(bounds: BoundingBox3, offset: usize, count: usize) -> Self {
    Self {
      bounds,
      left: 0,
      right: 0,
      prim_offset: offset as u32,
      prim_count: count as u32,
    }
  }
}

/// Construction summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeStats {
  pub node_count: usize,
  pub leaf_count: usize,
  pub max_depth: usize,
  pub primitive_count: usize,
}

/// Tree validation failures. These indicate construction bugs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
  #[error("node {node} has inconsistent children ({left}, {right})")]
  InconsistentChildren { node: u32, left: u32, right: u32 },

  #[error("leaf {node} range exceeds the primitive array")]
  LeafRangeOutOfBounds { node: u32 },

  #[error("tree depth exceeds the maximum at node {node}")]
  DepthExceeded { node: u32 },

  #[error("node {node} does not bound primitive {primitive}")]
  UnboundedPrimitive { node: u32, primitive: u32 },
}

/// SAH axis-aligned bounding box tree.
#[derive(Clone, Debug, Default)]
pub struct AabbTree {
  nodes: Vec<TreeNode>,
  prims: Vec<u32>,
  stats: TreeStats,
}

impl AabbTree {
  /// Build over every triangle of `mesh`. An empty mesh produces an empty
  /// tree whose queries all return nothing.
  pub fn build(mesh: &TriangleMesh) -> Self {
    let n = mesh.triangle_count();
    if n == 0 {
      return Self::default();
    }

    let mut tri_bounds = Vec::with_capacity(n);
    let mut centroids = Vec::with_capacity(n);
    for t in 0..n as u32 {
      let pts = mesh.set().triangle_points(t);
      let mut bb = BoundingBox3::empty();
      for p in pts {
        bb.encapsulate(p);
      }
      tri_bounds.push(bb);
      centroids.push((pts[0] + pts[1] + pts[2]) / 3.0);
    }

    let mut tree = Self {
      nodes: vec![TreeNode::leaf(BoundingBox3::empty(), 0, 0)],
      prims: (0..n as u32).collect(),
      stats: TreeStats {
        primitive_count: n,
        ..TreeStats::default()
      },
    };
    tree.build_node(0, 0, n, 0, &tri_bounds, &centroids);
    tree.stats.node_count = tree.nodes.len();
    tree
  }

  fn build_node(
    &mut self,
    slot: usize,
    lo: usize,
    hi: usize,
    depth: usize,
    tri_bounds: &[BoundingBox3],
    centroids: &[Vec3],
  ) {
    let count = hi - lo;
    let mut bounds = BoundingBox3::empty();
    for &p in &self.prims[lo..hi] {
      bounds.merge(&tri_bounds[p as usize]);
    }
    self.stats.max_depth = self.stats.max_depth.max(depth);

    if count <= MAX_LEAF || depth >= MAX_DEPTH {
      self.emit_leaf(slot, bounds, lo, count);
      return;
    }

    match best_split(&self.prims[lo..hi], bounds, tri_bounds, centroids) {
      Some((order, split)) => {
        self.prims[lo..hi].copy_from_slice(&order);
        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(TreeNode::leaf(BoundingBox3::empty(), 0, 0));
        self.nodes.push(TreeNode::leaf(BoundingBox3::empty(), 0, 0));
        self.nodes[slot] = TreeNode {
          bounds,
          left: left as u32,
          right: right as u32,
          prim_offset: 0,
          prim_count: 0,
        };
        self.build_node(left, lo, lo + split, depth + 1, tri_bounds, centroids);
        self.build_node(right, lo + split, hi, depth + 1, tri_bounds, centroids);
      }
      None => self.emit_leaf(slot, bounds, lo, count),
    }
  }

  fn emit_leaf(&mut self, slot: usize, bounds: BoundingBox3, lo: usize, count: usize) {
    self.nodes[slot] = TreeNode::leaf(bounds, lo, count);
    self.stats.leaf_count += 1;
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn nodes(&self) -> &[TreeNode] {
    &self.nodes
  }

  #[inline]
  pub fn primitives(&self) -> &[u32] {
    &self.prims
  }

  #[inline]
  pub fn stats(&self) -> &TreeStats {
    &self.stats
  }

  /// Structural validation against the mesh the tree was built from.
  pub fn validate(&self, mesh: &TriangleMesh) -> Result<(), TreeError> {
    if self.nodes.is_empty() {
      return Ok(());
    }
    self.validate_node(0, 0, mesh)
  }

  fn validate_node(&self, node: u32, depth: usize, mesh: &TriangleMesh) -> Result<(), TreeError> {
    if depth > MAX_DEPTH {
      return Err(TreeError::DepthExceeded { node });
    }
    let n = &self.nodes[node as usize];
    if n.is_leaf() {
      let lo = n.prim_offset as usize;
      let hi = lo + n.prim_count as usize;
      if hi > self.prims.len() {
        return Err(TreeError::LeafRangeOutOfBounds { node });
      }
      const EPS: f32 = 1e-4;
      let mut grown = n.bounds;
      grown.min -= Vec3::splat(EPS);
      grown.max += Vec3::splat(EPS);
      for &p in &self.prims[lo..hi] {
        for corner in mesh.set().triangle_points(p) {
          if !grown.contains_point(corner) {
            return Err(TreeError::UnboundedPrimitive { node, primitive: p });
          }
        }
      }
      return Ok(());
    }
    let (left, right) = (n.left, n.right);
    if left == 0
      || right == 0
      || left as usize >= self.nodes.len()
      || right as usize >= self.nodes.len()
    {
      return Err(TreeError::InconsistentChildren { node, left, right });
    }
    for child in [left, right] {
      let cb = self.nodes[child as usize].bounds;
      if cb.is_valid() && !n.bounds.contains_box(&cb, 1e-4) {
        return Err(TreeError::InconsistentChildren { node, left, right });
      }
      self.validate_node(child, depth + 1, mesh)?;
    }
    Ok(())
  }
}

/// Pick the SAH-minimal split for a primitive range.
///
/// Sorts a scratch copy of the range by centroid on each axis, scores
/// sampled split positions with
/// `C = c_t + (A_L·n_L + A_R·n_R) · c_i / A_parent`, and returns the best
/// sorted order plus split index, or `None` when no split beats the leaf
/// cost.
fn best_split(
  range: &[u32],
  parent: BoundingBox3,
  tri_bounds: &[BoundingBox3],
  centroids: &[Vec3],
) -> Option<(Vec<u32>, usize)> {
  let count = range.len();
  let parent_area = parent.surface_area().max(f32::MIN_POSITIVE);
  let leaf_cost = INTERSECT_COST * count as f32;

  let mut best: Option<(Vec<u32>, usize)> = None;
  let mut best_cost = leaf_cost;

  let step = (count / SPLIT_SAMPLES).max(1);
  let mut right_areas = vec![0.0f32; count + 1];

  for axis in 0..3 {
    let mut order = range.to_vec();
    order.sort_by(|&a, &b| {
      let ca = centroids[a as usize][axis];
      let cb = centroids[b as usize][axis];
      ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });

    // Suffix sweep of right-side areas, then a prefix sweep scoring cuts.
    let mut bb = BoundingBox3::empty();
    for i in (0..count).rev() {
      bb.merge(&tri_bounds[order[i] as usize]);
      right_areas[i] = bb.surface_area();
    }

    let mut left_bb = BoundingBox3::empty();
    for k in 1..count {
      left_bb.merge(&tri_bounds[order[k - 1] as usize]);
      if k % step != 0 {
        continue;
      }
      let cost = TRAVERSAL_COST
        + (left_bb.surface_area() * k as f32 + right_areas[k] * (count - k) as f32)
          * INTERSECT_COST
          / parent_area;
      if cost < best_cost {
        best_cost = cost;
        best = Some((order.clone(), k));
      }
    }
  }
  best
}
