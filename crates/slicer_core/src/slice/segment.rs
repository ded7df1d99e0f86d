//! Plane-triangle intersection and the slice segment type.
//!
//! Every candidate triangle from the tree's plane query runs through
//! [`triangle_plane`], which classifies the intersection by how many
//! vertices sit on the plane (within a tolerance) and where the rest lie.
//! Segments carry topology - source triangle, the mesh edge or vertex that
//! produced each endpoint - so the chainer can stitch by connectivity
//! instead of geometric search.
//!
//! Edge crossings interpolate from the lower vertex id to the higher one,
//! so the two triangles sharing an edge compute bit-identical endpoints.

use glam::Vec3;
use smallvec::SmallVec;

use crate::coord::{to_coord, Point2};
use crate::mesh::TriangleMesh;
use crate::tree::AabbTree;

/// Vertex-on-plane tolerance in mm.
pub const Z_EPS: f32 = 1e-5;

/// Relative |Nz| threshold below which a facet counts as vertical.
const VERTICAL_EPS: f32 = 1e-6;

/// Facet classification from the triangle normal's Z sign.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FacetOrientation {
  Up,
  Down,
  Vertical,
  Degenerate,
}

/// One endpoint of a slice segment with its topological provenance.
#[derive(Clone, Copy, Debug)]
pub struct SegmentEnd {
  pub point: Point2,
  /// Mesh edge whose plane crossing produced this endpoint.
  pub edge: Option<u32>,
  /// Mesh vertex this endpoint coincides with.
  pub vertex: Option<u32>,
}

impl SegmentEnd {
  fn on_edge(point: Point2, edge: u32) -> Self {
    Self {
      point,
      edge: Some(edge),
      vertex: None,
    }
  }

  fn on_vertex(point: Point2, vertex: u32, edge: Option<u32>) -> Self {
    Self {
      point,
      edge,
      vertex: Some(vertex),
    }
  }
}

/// Oriented intersection segment with chaining topology.
#[derive(Clone, Copy, Debug)]
pub struct SliceSegment {
  pub a: SegmentEnd,
  pub b: SegmentEnd,
  pub triangle: u32,
  pub orientation: FacetOrientation,
  pub consumed: bool,
}

/// Classification of one triangle against the plane.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrianglePlaneKind {
  /// All vertices strictly on one side.
  None,
  /// Two edge crossings.
  Standard,
  /// One vertex on the plane, the opposite edge crossing it.
  VertexOnPlane,
  /// Two vertices on the plane: the segment runs along that edge.
  EdgeOnPlane,
  /// The whole facet lies in the plane; all three edges are emitted.
  FaceOnPlane,
  /// Zero-area triangle.
  Degenerate,
}

/// Intersection result: classification plus zero to three segments.
#[derive(Clone, Debug)]
pub struct TrianglePlane {
  pub kind: TrianglePlaneKind,
  pub segments: SmallVec<[SliceSegment; 3]>,
}

impl TrianglePlane {
  fn empty(kind: TrianglePlaneKind) -> Self {
    Self {
      kind,
      segments: SmallVec::new(),
    }
  }
}

/// Classify the facet from its geometric normal.
pub fn facet_orientation(mesh: &TriangleMesh, t: u32) -> FacetOrientation {
  let [a, b, c] = mesh.set().triangle_points(t);
  let n = (b - a).cross(c - a);
  let len = n.length();
  if len <= f32::MIN_POSITIVE {
    return FacetOrientation::Degenerate;
  }
  let nz = n.z / len;
  if nz.abs() < VERTICAL_EPS {
    FacetOrientation::Vertical
  } else if nz > 0.0 {
    FacetOrientation::Up
  } else {
    FacetOrientation::Down
  }
}

/// Intersect triangle `t` with the horizontal plane at `z`.
pub fn triangle_plane(mesh: &TriangleMesh, t: u32, z: f32) -> TrianglePlane {
  let tri = &mesh.set().triangles[t as usize];
  let pts = mesh.set().triangle_points(t);
  let orientation = facet_orientation(mesh, t);

  let d: [f32; 3] = [pts[0].z - z, pts[1].z - z, pts[2].z - z];
  let on: [bool; 3] = [d[0].abs() <= Z_EPS, d[1].abs() <= Z_EPS, d[2].abs() <= Z_EPS];
  let above = |i: usize| !on[i] && d[i] > 0.0;
  let below = |i: usize| !on[i] && d[i] < 0.0;
  let n_on = on.iter().filter(|&&o| o).count();

  if orientation == FacetOrientation::Degenerate {
    // Zero-area triangle: at most the collinear run of on-plane vertices.
    let mut result = TrianglePlane::empty(TrianglePlaneKind::Degenerate);
    let on_ids: SmallVec<[usize; 3]> = (0..3).filter(|&i| on[i]).collect();
    if on_ids.len() >= 2 {
      // The two farthest-apart on-plane corners.
      let mut best = (on_ids[0], on_ids[1]);
      let mut best_d = 0.0f32;
      for i in 0..on_ids.len() {
        for j in (i + 1)..on_ids.len() {
          let dist = pts[on_ids[i]].distance_squared(pts[on_ids[j]]);
          if dist > best_d {
            best_d = dist;
            best = (on_ids[i], on_ids[j]);
          }
        }
      }
      if let Some(seg) = make_segment(
        SegmentEnd::on_vertex(project(pts[best.0]), tri.vertices[best.0], None),
        SegmentEnd::on_vertex(project(pts[best.1]), tri.vertices[best.1], None),
        t,
        orientation,
      ) {
        result.segments.push(seg);
      }
    }
    return result;
  }

  match n_on {
    3 => {
      // Facet lies in the plane: emit all three edges.
      let mut result = TrianglePlane::empty(TrianglePlaneKind::FaceOnPlane);
      for k in 0..3 {
        let i = k;
        let j = (k + 1) % 3;
        if let Some(seg) = make_segment(
          SegmentEnd::on_vertex(project(pts[i]), tri.vertices[i], Some(tri.edges[k])),
          SegmentEnd::on_vertex(project(pts[j]), tri.vertices[j], Some(tri.edges[k])),
          t,
          orientation,
        ) {
          result.segments.push(seg);
        }
      }
      result
    }
    2 => {
      let k = (0..3)
        .find(|&k| on[k] && on[(k + 1) % 3])
        .expect("two on-plane vertices share an edge");
      let i = k;
      let j = (k + 1) % 3;
      let mut result = TrianglePlane::empty(TrianglePlaneKind::EdgeOnPlane);
      if let Some(seg) = make_segment(
        SegmentEnd::on_vertex(project(pts[i]), tri.vertices[i], Some(tri.edges[k])),
        SegmentEnd::on_vertex(project(pts[j]), tri.vertices[j], Some(tri.edges[k])),
        t,
        orientation,
      ) {
        result.segments.push(seg);
      }
      result
    }
    1 => {
      let v = (0..3).find(|&i| on[i]).unwrap();
      let i = (v + 1) % 3;
      let j = (v + 2) % 3;
      if (above(i) && below(j)) || (below(i) && above(j)) {
        // The edge opposite the on-plane vertex crosses.
        let opposite_edge = i; // edge slot for the pair (i, j)
        let crossing = interpolate_edge(mesh, tri.vertices[i], tri.vertices[j], z);
        let mut result = TrianglePlane::empty(TrianglePlaneKind::VertexOnPlane);
        if let Some(seg) = make_segment(
          SegmentEnd::on_vertex(project(pts[v]), tri.vertices[v], None),
          SegmentEnd::on_edge(crossing, tri.edges[opposite_edge]),
          t,
          orientation,
        ) {
          result.segments.push(seg.oriented(mesh, t));
        }
        result
      } else {
        // Plane only grazes the vertex.
        TrianglePlane::empty(TrianglePlaneKind::None)
      }
    }
    _ => {
      let n_above = (0..3).filter(|&i| above(i)).count();
      let n_below = (0..3).filter(|&i| below(i)).count();
      if n_above == 0 || n_below == 0 {
        return TrianglePlane::empty(TrianglePlaneKind::None);
      }
      // Exactly two of the three edges cross the plane.
      let mut ends: SmallVec<[SegmentEnd; 2]> = SmallVec::new();
      for k in 0..3 {
        let i = k;
        let j = (k + 1) % 3;
        if (above(i) && below(j)) || (below(i) && above(j)) {
          let crossing = interpolate_edge(mesh, tri.vertices[i], tri.vertices[j], z);
          ends.push(SegmentEnd::on_edge(crossing, tri.edges[k]));
        }
      }
      debug_assert_eq!(ends.len(), 2, "standard intersection must cross two edges");
      let mut result = TrianglePlane::empty(TrianglePlaneKind::Standard);
      if ends.len() == 2 {
        if let Some(seg) = make_segment(ends[0], ends[1], t, orientation) {
          result.segments.push(seg.oriented(mesh, t));
        }
      }
      result
    }
  }
}

/// Collect the segments for one layer plane, dropping zero-length output.
pub fn collect_segments(mesh: &TriangleMesh, tree: &AabbTree, z: f32) -> Vec<SliceSegment> {
  let mut segments = Vec::new();
  for t in tree.plane_query(z) {
    segments.extend(triangle_plane(mesh, t, z).segments);
  }
  segments
}

impl SliceSegment {
  /// Orient so the material side sits on the left: the segment direction
  /// follows `ẑ × n̂` of the facet. Loops then come out mostly CCW before
  /// the final normalization.
  fn oriented(mut self, mesh: &TriangleMesh, t: u32) -> Self {
    let n = mesh.triangle_normal(t);
    let want = Vec3::Z.cross(n);
    let dir_x = (self.b.point.x - self.a.point.x) as f64;
    let dir_y = (self.b.point.y - self.a.point.y) as f64;
    if dir_x * want.x as f64 + dir_y * (want.y as f64) < 0.0 {
      std::mem::swap(&mut self.a, &mut self.b);
    }
    self
  }
}

#[inline]
fn project(p: Vec3) -> Point2 {
  Point2::new(to_coord(p.x as f64), to_coord(p.y as f64))
}

/// Build a segment, discarding zero-length results.
fn make_segment(
  a: SegmentEnd,
  b: SegmentEnd,
  triangle: u32,
  orientation: FacetOrientation,
) -> Option<SliceSegment> {
  if a.point == b.point {
    return None;
  }
  Some(SliceSegment {
    a,
    b,
    triangle,
    orientation,
    consumed: false,
  })
}

/// Möller-style edge interpolation at the plane, canonicalized from the
/// lower vertex id so shared edges reproduce the same point bit-for-bit.
/// A near-zero Z extent falls back to the edge midpoint.
fn interpolate_edge(mesh: &TriangleMesh, va: u32, vb: u32, z: f32) -> Point2 {
  let (lo, hi) = if va <= vb { (va, vb) } else { (vb, va) };
  let a = mesh.set().vertices[lo as usize];
  let b = mesh.set().vertices[hi as usize];
  let dz = b.z as f64 - a.z as f64;
  let t = if dz.abs() < 1e-12 {
    0.5
  } else {
    ((z as f64 - a.z as f64) / dz).clamp(0.0, 1.0)
  };
  Point2::new(
    to_coord(a.x as f64 + t * (b.x - a.x) as f64),
    to_coord(a.y as f64 + t * (b.y - a.y) as f64),
  )
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod segment_test;
