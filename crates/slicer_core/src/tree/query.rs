//! Plane and ray queries over the AABB tree.

use glam::Vec3;

use super::AabbTree;
use crate::mesh::TriangleMesh;

/// Reciprocal stand-in for a zero direction component; large enough that
/// any finite slab distance saturates instead of dividing by zero.
const HUGE_RECIP: f32 = 1e30;

/// Minimum accepted ray parameter; hits closer than this are treated as
/// self-intersections and skipped.
const RAY_T_MIN: f32 = 1e-6;

/// Nearest ray-triangle hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
  pub triangle: u32,
  pub distance: f32,
  pub point: Vec3,
  /// Geometric (unnormalized winding) normal of the hit triangle.
  pub normal: Vec3,
}

impl AabbTree {
  /// Triangle indices whose bounding box straddles the plane `z`.
  ///
  /// The box test is conservative: callers refine candidates with the
  /// exact triangle-plane predicate.
  pub fn plane_query(&self, z: f32) -> Vec<u32> {
    let mut out = Vec::new();
    self.plane_query_into(z, &mut out);
    out
  }

  /// `plane_query` into a caller-owned buffer, preserving its capacity.
  pub fn plane_query_into(&self, z: f32, out: &mut Vec<u32>) {
    out.clear();
    if self.nodes.is_empty() {
      return;
    }
    let mut stack = vec![0u32];
    while let Some(idx) = stack.pop() {
      let node = &self.nodes[idx as usize];
      if !node.bounds.straddles_z(z) {
        continue;
      }
      if node.is_leaf() {
        let lo = node.prim_offset as usize;
        let hi = lo + node.prim_count as usize;
        out.extend_from_slice(&self.prims[lo..hi]);
      } else {
        stack.push(node.left);
        stack.push(node.right);
      }
    }
  }

  /// Nearest triangle hit along `origin + t·direction`, `t > 0`.
  pub fn ray_query(&self, mesh: &TriangleMesh, origin: Vec3, direction: Vec3) -> Option<RayHit> {
    if self.nodes.is_empty() {
      return None;
    }
    let inv = Vec3::new(
      safe_recip(direction.x),
      safe_recip(direction.y),
      safe_recip(direction.z),
    );

    let mut best: Option<RayHit> = None;
    let mut stack = vec![0u32];
    while let Some(idx) = stack.pop() {
      let node = &self.nodes[idx as usize];
      let Some(t_enter) = slab_test(node.bounds.min, node.bounds.max, origin, inv) else {
        continue;
      };
      if let Some(hit) = &best {
        if t_enter > hit.distance {
          continue;
        }
      }
      if node.is_leaf() {
        let lo = node.prim_offset as usize;
        let hi = lo + node.prim_count as usize;
        for &t in &self.prims[lo..hi] {
          if let Some(hit) = intersect_triangle(mesh, t, origin, direction) {
            if best.as_ref().map_or(true, |b| hit.distance < b.distance) {
              best = Some(hit);
            }
          }
        }
      } else {
        stack.push(node.left);
        stack.push(node.right);
      }
    }
    best
  }
}

#[inline]
fn safe_recip(d: f32) -> f32 {
  if d.abs() < 1e-20 {
    HUGE_RECIP.copysign(d)
  } else {
    1.0 / d
  }
}

/// Slab test; returns the entry parameter when the ray reaches the box.
fn slab_test(min: Vec3, max: Vec3, origin: Vec3, inv: Vec3) -> Option<f32> {
  let mut t_near = f32::NEG_INFINITY;
  let mut t_far = f32::INFINITY;
  for axis in 0..3 {
    let t0 = (min[axis] - origin[axis]) * inv[axis];
    let t1 = (max[axis] - origin[axis]) * inv[axis];
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    t_near = t_near.max(lo);
    t_far = t_far.min(hi);
    if t_near > t_far {
      return None;
    }
  }
  if t_far < 0.0 {
    return None;
  }
  Some(t_near.max(0.0))
}

/// Möller–Trumbore ray-triangle intersection.
fn intersect_triangle(mesh: &TriangleMesh, t: u32, origin: Vec3, direction: Vec3) -> Option<RayHit> {
  let [a, b, c] = mesh.set().triangle_points(t);
  let e1 = b - a;
  let e2 = c - a;
  let pvec = direction.cross(e2);
  let det = e1.dot(pvec);
  if det.abs() < 1e-12 {
    return None;
  }
  let inv_det = 1.0 / det;
  let tvec = origin - a;
  let u = tvec.dot(pvec) * inv_det;
  if !(0.0..=1.0).contains(&u) {
    return None;
  }
  let qvec = tvec.cross(e1);
  let v = direction.dot(qvec) * inv_det;
  if v < 0.0 || u + v > 1.0 {
    return None;
  }
  let dist = e2.dot(qvec) * inv_det;
  if dist <= RAY_T_MIN {
    return None;
  }
  Some(RayHit {
    triangle: t,
    distance: dist,
    point: origin + direction * dist,
    normal: e1.cross(e2),
  })
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
