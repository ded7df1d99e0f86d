//! Segment chaining: stitch oriented plane-intersection segments into
//! closed polygon loops.
//!
//! Three phases run in strict priority order:
//!
//! 1. Topology chaining - follow shared mesh edge ids, then shared mesh
//!    vertex ids. Unambiguous whenever the mesh is manifold at the plane.
//! 2. Exact endpoint chaining - join open polylines whose endpoints
//!    coincide within a sub-micron tolerance, in any of the four
//!    orientations. Covers triangles that meet only at a vertex and
//!    topology lost at layer boundaries.
//! 3. Gap closure - the last resort for dirty meshes; bridges endpoint
//!    gaps up to the configured maximum with distance/angle scoring.
//!
//! Phases 2 and 3 iterate to a fixed point with an iteration cap equal to
//! the number of open polylines, so termination is structural.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::config::GapConfig;
use crate::coord::Point2;
use crate::polygon::Polygon;

use super::gap;
use super::segment::{FacetOrientation, SegmentEnd, SliceSegment};

/// Loop-closure tolerance: 1 µm.
pub const LOOP_EPS: i64 = 1_000;
const LOOP_EPS_SQ: i128 = (LOOP_EPS as i128) * (LOOP_EPS as i128);

/// Phase-2 exact-match tolerance: 0.5 µm, strictly inside the loop
/// tolerance so gap closure still sees micron-level gaps.
const EXACT_EPS: i64 = 500;
const EXACT_EPS_SQ: i128 = (EXACT_EPS as i128) * (EXACT_EPS as i128);

/// Chaining outcome for one layer.
#[derive(Clone, Debug, Default)]
pub struct ChainResult {
  /// Closed loops, re-oriented counter-clockwise.
  pub polygons: Vec<Polygon>,
  /// Open polylines left after all three phases; not printable.
  pub open_discarded: usize,
  /// Connections made by phase-3 gap closure.
  pub gaps_closed: usize,
}

/// Topology of one open end of a growing polyline.
#[derive(Clone, Copy, Debug, Default)]
struct EndTopo {
  edge: Option<u32>,
  vertex: Option<u32>,
}

impl From<SegmentEnd> for EndTopo {
  fn from(end: SegmentEnd) -> Self {
    Self {
      edge: end.edge,
      vertex: end.vertex,
    }
  }
}

struct OpenPolyline {
  points: Vec<Point2>,
  head: EndTopo,
  tail: EndTopo,
  orientation: FacetOrientation,
  closed: bool,
}

impl OpenPolyline {
  fn head_point(&self) -> Point2 {
    self.points[0]
  }

  fn tail_point(&self) -> Point2 {
    *self.points.last().unwrap()
  }

  fn reverse(&mut self) {
    self.points.reverse();
    std::mem::swap(&mut self.head, &mut self.tail);
  }

  /// Close if the open ends meet within `tol_sq`; drops the duplicated
  /// closing point.
  fn try_close(&mut self, tol_sq: i128) -> bool {
    if self.points.len() < 3 {
      return false;
    }
    if self.head_point().distance_sq(self.tail_point()) <= tol_sq {
      if self.head_point() == self.tail_point() {
        self.points.pop();
      }
      self.closed = self.points.len() >= 3;
      return self.closed;
    }
    false
  }
}

/// Chain a layer's segments into closed polygons.
pub fn chain_segments(segments: &mut [SliceSegment], gap_config: &GapConfig) -> ChainResult {
  let mut result = ChainResult::default();
  if segments.is_empty() {
    return result;
  }

  let mut polylines = phase1_topology(segments);
  phase2_exact(&mut polylines);
  result.gaps_closed = phase3_gaps(&mut polylines, gap_config);

  for pl in polylines {
    if pl.closed && pl.points.len() >= 3 {
      let mut polygon = Polygon::from_points(pl.points);
      if polygon.signed_area_x2() != 0 {
        polygon.make_ccw();
        result.polygons.push(polygon);
      } else {
        result.open_discarded += 1;
      }
    } else if !pl.points.is_empty() {
      result.open_discarded += 1;
    }
  }
  result
}

// =============================================================================
// Phase 1: topology chaining
// =============================================================================

fn phase1_topology(segments: &mut [SliceSegment]) -> Vec<OpenPolyline> {
  // Lookup maps from topology key to segment indices.
  let mut by_edge: HashMap<u32, SmallVec<[u32; 4]>> = HashMap::new();
  let mut by_vertex: HashMap<u32, SmallVec<[u32; 4]>> = HashMap::new();
  for (i, seg) in segments.iter().enumerate() {
    for end in [&seg.a, &seg.b] {
      if let Some(e) = end.edge {
        by_edge.entry(e).or_default().push(i as u32);
      }
      if let Some(v) = end.vertex {
        by_vertex.entry(v).or_default().push(i as u32);
      }
    }
  }

  let mut polylines = Vec::new();

  for seed in 0..segments.len() {
    if segments[seed].consumed {
      continue;
    }
    segments[seed].consumed = true;
    let mut pl = OpenPolyline {
      points: vec![segments[seed].a.point, segments[seed].b.point],
      head: segments[seed].a.into(),
      tail: segments[seed].b.into(),
      orientation: segments[seed].orientation,
      closed: false,
    };

    // Extend at the tail; when stuck, flip once and grow the other way.
    let mut flips = 0;
    loop {
      if pl.try_close(LOOP_EPS_SQ) {
        break;
      }
      match find_topology_neighbor(segments, &by_edge, &by_vertex, &pl) {
        Some((next, matched_is_a)) => {
          segments[next as usize].consumed = true;
          let seg = &segments[next as usize];
          let (near, far) = if matched_is_a {
            (seg.a, seg.b)
          } else {
            (seg.b, seg.a)
          };
          if near.point != pl.tail_point() {
            pl.points.push(near.point);
          }
          pl.points.push(far.point);
          pl.tail = far.into();
          flips = 0;
        }
        None => {
          if flips >= 1 {
            break;
          }
          pl.reverse();
          flips += 1;
        }
      }
    }
    polylines.push(pl);
  }
  polylines
}

/// Best unconsumed segment touching the polyline's tail topology.
///
/// Edge matches outrank vertex matches; among equals, a matching facet
/// orientation tag wins, then the geometrically closest matched end.
fn find_topology_neighbor(
  segments: &[SliceSegment],
  by_edge: &HashMap<u32, SmallVec<[u32; 4]>>,
  by_vertex: &HashMap<u32, SmallVec<[u32; 4]>>,
  pl: &OpenPolyline,
) -> Option<(u32, bool)> {
  let tail_point = pl.tail_point();

  let scan = |candidates: &SmallVec<[u32; 4]>, edge_key: Option<u32>, vertex_key: Option<u32>| {
    let mut best: Option<(u32, bool, i128, bool)> = None;
    for &i in candidates {
      let seg = &segments[i as usize];
      if seg.consumed {
        continue;
      }
      for (end, is_a) in [(&seg.a, true), (&seg.b, false)] {
        let matched = (edge_key.is_some() && end.edge == edge_key)
          || (vertex_key.is_some() && end.vertex == vertex_key);
        if !matched {
          continue;
        }
        let dist = end.point.distance_sq(tail_point);
        let same_orient = seg.orientation == pl.orientation;
        let better = match &best {
          None => true,
          Some((_, _, best_dist, best_orient)) => {
            if same_orient != *best_orient {
              same_orient
            } else {
              dist < *best_dist
            }
          }
        };
        if better {
          best = Some((i, is_a, dist, same_orient));
        }
      }
    }
    best.map(|(i, is_a, _, _)| (i, is_a))
  };

  if let Some(edge) = pl.tail.edge {
    if let Some(candidates) = by_edge.get(&edge) {
      if let Some(found) = scan(candidates, Some(edge), None) {
        return Some(found);
      }
    }
  }
  if let Some(vertex) = pl.tail.vertex {
    if let Some(candidates) = by_vertex.get(&vertex) {
      if let Some(found) = scan(candidates, None, Some(vertex)) {
        return Some(found);
      }
    }
  }
  None
}

// =============================================================================
// Phase 2: exact endpoint chaining
// =============================================================================

fn phase2_exact(polylines: &mut Vec<OpenPolyline>) {
  let max_rounds = polylines.len().max(1);
  for _ in 0..max_rounds {
    let mut merged_any = false;
    for i in 0..polylines.len() {
      if polylines[i].closed || polylines[i].points.is_empty() {
        continue;
      }
      for j in (i + 1)..polylines.len() {
        if polylines[j].closed || polylines[j].points.is_empty() {
          continue;
        }
        if try_exact_merge(polylines, i, j) {
          merged_any = true;
          if polylines[i].try_close(LOOP_EPS_SQ) {
            break;
          }
        }
      }
    }
    if !merged_any {
      break;
    }
  }
  polylines.retain(|pl| !pl.points.is_empty());
}

/// Try all four orientations of joining `j` onto `i` with the exact
/// tolerance; on success `j` is emptied in place.
fn try_exact_merge(polylines: &mut [OpenPolyline], i: usize, j: usize) -> bool {
  let (ih, it) = (polylines[i].head_point(), polylines[i].tail_point());
  let (jh, jt) = (polylines[j].head_point(), polylines[j].tail_point());

  let orientation = if it.distance_sq(jh) <= EXACT_EPS_SQ {
    0 // tail(i) -> head(j)
  } else if it.distance_sq(jt) <= EXACT_EPS_SQ {
    1 // tail(i) -> tail(j): reverse j
  } else if ih.distance_sq(jt) <= EXACT_EPS_SQ {
    2 // tail(j) -> head(i): reverse both roles
  } else if ih.distance_sq(jh) <= EXACT_EPS_SQ {
    3 // head(i) -> head(j): reverse i
  } else {
    return false;
  };

  // Normalize every case to tail(i) -> head(j); reverse() also swaps the
  // end topology, so reading j's tail afterwards is always correct.
  match orientation {
    1 => polylines[j].reverse(),
    2 => {
      polylines[i].reverse();
      polylines[j].reverse();
    }
    3 => polylines[i].reverse(),
    _ => {}
  }

  polylines[i].tail = polylines[j].tail;
  let mut donor = std::mem::take(&mut polylines[j].points);
  polylines[j].closed = false;
  if polylines[i].tail_point() == donor[0] {
    donor.remove(0);
  }
  polylines[i].points.extend(donor);
  true
}

// =============================================================================
// Phase 3: gap closure
// =============================================================================

fn phase3_gaps(polylines: &mut Vec<OpenPolyline>, config: &GapConfig) -> usize {
  let mut items: Vec<Vec<Point2>> = Vec::new();
  let mut closed: Vec<bool> = Vec::new();
  let mut slots: Vec<usize> = Vec::new();
  for (idx, pl) in polylines.iter().enumerate() {
    if !pl.closed && pl.points.len() >= 2 {
      items.push(pl.points.clone());
      closed.push(false);
      slots.push(idx);
    }
  }

  let mut gaps_closed = 0;
  if items.len() >= 2 {
    gaps_closed = gap::close_gaps(&mut items, &mut closed, config);
    if gaps_closed > 0 {
      for ((item, is_closed), slot) in items.into_iter().zip(closed).zip(slots) {
        let pl = &mut polylines[slot];
        pl.points = item;
        pl.closed = is_closed && pl.points.len() >= 3;
        pl.head = EndTopo::default();
        pl.tail = EndTopo::default();
      }
      polylines.retain(|pl| !pl.points.is_empty());
    }
  }

  // A lone open polyline whose own ends sit within the gap limit still
  // becomes a loop: the implicit closing edge bridges the gap.
  let gap_units = crate::coord::to_coord(config.max_gap_mm);
  let gap_sq = (gap_units as i128) * (gap_units as i128);
  for pl in polylines.iter_mut() {
    if !pl.closed && pl.points.len() >= 3 && pl.try_close(gap_sq) {
      gaps_closed += 1;
    }
  }
  gaps_closed
}

#[cfg(test)]
#[path = "chain_test.rs"]
mod chain_test;
