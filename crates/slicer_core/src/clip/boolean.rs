//! Polygon boolean operations.
//!
//! Sutherland–Hodgman clipping with bounding-box rejection. Difference
//! decomposes the clip into per-edge half-planes, producing disjoint
//! outside pieces; the decomposition is exact for convex clips.

use crate::coord::{rounded_div, Point2};
use crate::polygon::Polygon;
use crate::predicates::orientation_sign;

use super::{offset, ClipConfig, MIN_AREA_MM2};

/// Boolean operation selector.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BooleanOp {
  Union,
  Intersection,
  Difference,
  Xor,
}

/// Apply `op` between subject and clip polygon sets.
pub fn boolean(
  subject: &[Polygon],
  clip: &[Polygon],
  op: BooleanOp,
  config: &ClipConfig,
) -> Vec<Polygon> {
  match op {
    BooleanOp::Intersection => intersection(subject, clip),
    BooleanOp::Difference => difference(subject, clip, config),
    BooleanOp::Union => union(subject, clip),
    BooleanOp::Xor => {
      let mut out = difference(subject, clip, config);
      out.extend(difference(clip, subject, config));
      out
    }
  }
}

/// Pairwise Sutherland–Hodgman intersection with bbox rejection.
fn intersection(subject: &[Polygon], clip: &[Polygon]) -> Vec<Polygon> {
  let mut out = Vec::new();
  for s in subject {
    let sb = s.bounding_box();
    for c in clip {
      if !sb.overlaps(&c.bounding_box()) {
        continue;
      }
      if let Some(mut r) = sutherland_hodgman(s, c) {
        if r.area().abs() >= MIN_AREA_MM2 {
          r.make_ccw();
          out.push(r);
        }
      }
    }
  }
  out
}

/// Subtract every clip polygon from every subject polygon.
///
/// Clips are expanded by the safety offset first so boundaries coincident
/// with the subject cannot survive as slivers.
fn difference(subject: &[Polygon], clip: &[Polygon], config: &ClipConfig) -> Vec<Polygon> {
  let clips: Vec<Polygon> = if config.safety_offset_mm > 0.0 {
    // The safety pass must not simplify anything away.
    let widen = ClipConfig {
      decimation_factor: 0.0,
      ..config.clone()
    };
    clip
      .iter()
      .map(|c| {
        let mut ccw = c.clone();
        ccw.make_ccw();
        offset::offset(std::slice::from_ref(&ccw), config.safety_offset_mm, &widen)
          .into_iter()
          .next()
          .unwrap_or(ccw)
      })
      .collect()
  } else {
    clip.to_vec()
  };

  let mut pieces: Vec<Polygon> = subject.to_vec();
  for c in &clips {
    let cb = c.bounding_box();
    let mut next = Vec::with_capacity(pieces.len());
    for piece in &pieces {
      if !piece.bounding_box().overlaps(&cb) {
        next.push(piece.clone());
        continue;
      }
      next.extend(subtract_one(piece, c));
    }
    pieces = next;
  }
  pieces.retain(|p| p.len() >= 3 && p.area().abs() >= MIN_AREA_MM2);
  pieces
}

/// Concatenating union. Inputs are expected to be disjoint; overlapping
/// regions are passed through untouched (documented core limitation).
fn union(subject: &[Polygon], clip: &[Polygon]) -> Vec<Polygon> {
  let mut out: Vec<Polygon> = Vec::with_capacity(subject.len() + clip.len());
  out.extend(subject.iter().cloned());
  out.extend(clip.iter().cloned());
  out.retain(|p| p.len() >= 3 && p.area().abs() >= MIN_AREA_MM2);
  out
}

/// Clip `subject` to the inside of `clip` with Sutherland–Hodgman.
/// Exact for convex clips.
fn sutherland_hodgman(subject: &Polygon, clip: &Polygon) -> Option<Polygon> {
  let mut clip_ccw = clip.clone();
  clip_ccw.make_ccw();
  let edges = clip_ccw.points();
  if edges.len() < 3 {
    return None;
  }

  let mut current = subject.points().to_vec();
  for i in 0..edges.len() {
    let a = edges[i];
    let b = edges[(i + 1) % edges.len()];
    current = clip_halfplane(&current, a, b, true);
    if current.len() < 3 {
      return None;
    }
  }
  Some(Polygon::from_points(current))
}

/// Subtract a single convex clip from one subject polygon, emitting the
/// disjoint outside pieces.
fn subtract_one(subject: &Polygon, clip: &Polygon) -> Vec<Polygon> {
  let mut clip_ccw = clip.clone();
  clip_ccw.make_ccw();
  let edges = clip_ccw.points();
  if edges.len() < 3 {
    return vec![subject.clone()];
  }

  let mut pieces = Vec::new();
  let mut current = subject.points().to_vec();
  for i in 0..edges.len() {
    let a = edges[i];
    let b = edges[(i + 1) % edges.len()];
    let outside = clip_halfplane(&current, a, b, false);
    if outside.len() >= 3 {
      let mut piece = Polygon::from_points(outside);
      if piece.area().abs() >= MIN_AREA_MM2 {
        piece.make_ccw();
        pieces.push(piece);
      }
    }
    current = clip_halfplane(&current, a, b, true);
    if current.len() < 3 {
      break;
    }
  }
  pieces
}

/// Keep the part of a ring on one side of the infinite line `a → b`.
/// `keep_left` keeps the CCW-inside (left) side, boundary inclusive either
/// way.
fn clip_halfplane(points: &[Point2], a: Point2, b: Point2, keep_left: bool) -> Vec<Point2> {
  let inside = |p: Point2| {
    let side = orientation_sign(a, b, p);
    if keep_left {
      side >= 0
    } else {
      side <= 0
    }
  };

  let mut out = Vec::with_capacity(points.len() + 4);
  for i in 0..points.len() {
    let cur = points[i];
    let nxt = points[(i + 1) % points.len()];
    let cur_in = inside(cur);
    let nxt_in = inside(nxt);
    if cur_in {
      out.push(cur);
    }
    if cur_in != nxt_in {
      out.push(line_crossing(cur, nxt, a, b));
    }
  }
  out.dedup();
  if out.len() > 1 && out.first() == out.last() {
    out.pop();
  }
  out
}

/// Intersection of segment `p → q` with the infinite line `a → b`. The
/// caller guarantees the endpoints straddle the line, so the denominator is
/// non-zero.
fn line_crossing(p: Point2, q: Point2, a: Point2, b: Point2) -> Point2 {
  let r = q - p;
  let e = b - a;
  let denom = (r.x as i128) * (e.y as i128) - (r.y as i128) * (e.x as i128);
  debug_assert!(denom != 0, "line_crossing on parallel segment");
  let t_num = ((a.x - p.x) as i128) * (e.y as i128) - ((a.y - p.y) as i128) * (e.x as i128);
  Point2::new(
    p.x + rounded_div(t_num * r.x as i128, denom) as i64,
    p.y + rounded_div(t_num * r.y as i128, denom) as i64,
  )
}

#[cfg(test)]
#[path = "boolean_test.rs"]
mod boolean_test;
