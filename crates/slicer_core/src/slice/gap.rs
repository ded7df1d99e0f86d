//! Gap closure: scored endpoint pairing over a spatial grid.
//!
//! Open point chains are indexed by their endpoints in a uniform grid whose
//! cell size equals the maximum bridgeable gap, so every admissible partner
//! sits in the endpoint's cell or one of the eight neighbours. Candidate
//! connections are scored by distance and tangent alignment and taken
//! greedily, best first, re-scoring after every merge.
//!
//! Used twice: as phase 3 of segment chaining and as the stand-alone
//! post-pass over already-formed open polylines.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::config::GapConfig;
use crate::coord::{to_coord, Coord, Point2};
use crate::polygon::Polyline;

use super::chain::LOOP_EPS;

/// Weight of the distance term in the connection score.
const DISTANCE_WEIGHT: f64 = 0.6;

/// Weight of the angle term in the connection score.
const ANGLE_WEIGHT: f64 = 0.4;

// =============================================================================
// Spatial grid
// =============================================================================

/// Uniform hash grid over endpoint positions.
struct SpatialGrid {
  cell: Coord,
  cells: HashMap<(i64, i64), SmallVec<[u32; 4]>>,
}

impl SpatialGrid {
  fn new(cell: Coord) -> Self {
    Self {
      cell: cell.max(1),
      cells: HashMap::new(),
    }
  }

  #[inline]
  fn key(&self, p: Point2) -> (i64, i64) {
    (p.x.div_euclid(self.cell), p.y.div_euclid(self.cell))
  }

  fn insert(&mut self, p: Point2, id: u32) {
    self.cells.entry(self.key(p)).or_default().push(id);
  }

  /// Visit ids in the point's cell and its eight neighbours.
  fn visit_neighborhood(&self, p: Point2, mut f: impl FnMut(u32)) {
    let (cx, cy) = self.key(p);
    for dx in -1..=1 {
      for dy in -1..=1 {
        if let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) {
          for &id in ids {
            f(id);
          }
        }
      }
    }
  }
}

// =============================================================================
// Scoring
// =============================================================================

#[derive(Clone, Copy)]
struct Endpoint {
  item: u32,
  /// True for the chain's tail (last point), false for its head.
  is_tail: bool,
  point: Point2,
  /// Unit direction pointing out of the chain at this endpoint.
  tangent: (f64, f64),
}

fn endpoint(items: &[Vec<Point2>], item: u32, is_tail: bool) -> Endpoint {
  let pts = &items[item as usize];
  let (p, q) = if is_tail {
    (pts[pts.len() - 1], pts[pts.len() - 2])
  } else {
    (pts[0], pts[1])
  };
  let dx = (p.x - q.x) as f64;
  let dy = (p.y - q.y) as f64;
  let len = (dx * dx + dy * dy).sqrt();
  let tangent = if len > 0.0 { (dx / len, dy / len) } else { (0.0, 0.0) };
  Endpoint {
    item,
    is_tail,
    point: p,
    tangent,
  }
}

/// Score a candidate connection, or `None` when it violates the distance
/// or angle limit. Lower is better.
fn score_connection(a: &Endpoint, b: &Endpoint, config: &GapConfig) -> Option<f64> {
  let max_gap = to_coord(config.max_gap_mm);
  let dist_sq = a.point.distance_sq(b.point);
  if dist_sq > (max_gap as i128) * (max_gap as i128) {
    return None;
  }
  let dist = (dist_sq as f64).sqrt();
  let distance_cost = (dist / max_gap as f64).min(1.0);

  let vx = (b.point.x - a.point.x) as f64;
  let vy = (b.point.y - a.point.y) as f64;
  let vlen = (vx * vx + vy * vy).sqrt();
  let max_angle = config.max_angle_deg.to_radians();

  let angle_cost = if vlen > 0.0 {
    // Leaving a along its tangent, arriving at b against its tangent.
    let angle_a = angle_between(a.tangent, (vx / vlen, vy / vlen));
    let angle_b = angle_between((-b.tangent.0, -b.tangent.1), (vx / vlen, vy / vlen));
    let worst = angle_a.max(angle_b);
    if worst > max_angle {
      return None;
    }
    (worst / max_angle).min(1.0)
  } else {
    0.0
  };

  Some(DISTANCE_WEIGHT * distance_cost + ANGLE_WEIGHT * angle_cost)
}

#[inline]
fn angle_between(a: (f64, f64), b: (f64, f64)) -> f64 {
  let dot = (a.0 * b.0 + a.1 * b.1).clamp(-1.0, 1.0);
  dot.acos()
}

// =============================================================================
// Greedy closure
// =============================================================================

/// Close gaps between open point chains in place.
///
/// `closed[i]` marks chains that must not participate and is set when a
/// merged chain loops back on itself within the gap threshold. Consumed
/// source chains are emptied in place. Returns the number of connections
/// made.
pub(crate) fn close_gaps(
  items: &mut [Vec<Point2>],
  closed: &mut [bool],
  config: &GapConfig,
) -> usize {
  debug_assert_eq!(items.len(), closed.len());
  let max_gap = to_coord(config.max_gap_mm);
  let mut gaps_closed = 0;

  // Each round merges the globally best pair; the endpoint set changes, so
  // the grid is rebuilt. Bounded by the number of chains.
  for _ in 0..items.len() {
    let mut endpoints: Vec<Endpoint> = Vec::new();
    let mut grid = SpatialGrid::new(max_gap);
    for (i, pts) in items.iter().enumerate() {
      if closed[i] || pts.len() < 2 {
        continue;
      }
      for is_tail in [false, true] {
        let e = endpoint(items, i as u32, is_tail);
        grid.insert(e.point, endpoints.len() as u32);
        endpoints.push(e);
      }
    }
    if endpoints.len() < 4 {
      break;
    }

    let mut best: Option<(f64, u32, u32)> = None;
    for (ia, a) in endpoints.iter().enumerate() {
      grid.visit_neighborhood(a.point, |ib| {
        if ib as usize <= ia {
          return;
        }
        let b = &endpoints[ib as usize];
        if a.item == b.item {
          return;
        }
        if let Some(score) = score_connection(a, b, config) {
          if best.map_or(true, |(s, _, _)| score < s) {
            best = Some((score, ia as u32, ib as u32));
          }
        }
      });
    }

    let Some((_, ia, ib)) = best else {
      break;
    };
    let a = endpoints[ia as usize];
    let b = endpoints[ib as usize];
    merge_chains(items, a, b);
    gaps_closed += 1;

    // Self-closure check for the merged chain.
    let target = a.item as usize;
    let pts = &mut items[target];
    if pts.len() >= 3 {
      let gap_sq = (max_gap as i128) * (max_gap as i128);
      let head = pts[0];
      let tail = *pts.last().unwrap();
      if head.distance_sq(tail) <= gap_sq {
        if head == tail {
          pts.pop();
        }
        closed[target] = pts.len() >= 3;
      }
    }
  }
  gaps_closed
}

/// Concatenate chain `b.item` onto chain `a.item` in the orientation that
/// joins the two matched endpoints without duplicating a shared point.
fn merge_chains(items: &mut [Vec<Point2>], a: Endpoint, b: Endpoint) {
  let mut donor = std::mem::take(&mut items[b.item as usize]);
  if b.is_tail {
    donor.reverse();
  }
  let target = &mut items[a.item as usize];
  if !a.is_tail {
    target.reverse();
  }
  if target.last() == donor.first() {
    donor.remove(0);
  }
  target.extend(donor);
}

// =============================================================================
// Stand-alone post-pass
// =============================================================================

/// Repair pass over already-formed open chains.
///
/// A polyline participates when its endpoints are farther apart than the
/// loop tolerance; chains whose ends already coincide are complete loops
/// and stay untouched. Merged-away source chains are emptied in place and
/// compacted out of the array. Returns the number of gaps closed.
pub fn close_polygon_gaps(polylines: &mut Vec<Polyline>, config: &GapConfig) -> usize {
  let loop_eps_sq = (LOOP_EPS as i128) * (LOOP_EPS as i128);

  let mut items: Vec<Vec<Point2>> = Vec::new();
  let mut closed: Vec<bool> = Vec::new();
  let mut slots: Vec<usize> = Vec::new();
  for (idx, polyline) in polylines.iter().enumerate() {
    let pts = polyline.points();
    if pts.len() < 2 {
      continue;
    }
    let open = pts[0].distance_sq(*pts.last().unwrap()) > loop_eps_sq;
    if open {
      items.push(pts.to_vec());
      closed.push(false);
      slots.push(idx);
    }
  }
  if items.len() < 2 {
    return 0;
  }

  let gaps_closed = close_gaps(&mut items, &mut closed, config);
  if gaps_closed == 0 {
    return 0;
  }

  for (item, slot) in items.into_iter().zip(slots) {
    *polylines.get_mut(slot).unwrap() = Polyline::from_points(item);
  }
  polylines.retain(|p| !p.is_empty());
  gaps_closed
}

#[cfg(test)]
#[path = "gap_test.rs"]
mod gap_test;
