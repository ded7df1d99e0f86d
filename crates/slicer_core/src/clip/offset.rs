//! Morphological offsetting: inward/outward displacement of polygon
//! boundaries, open-path inflation, and the opening/closing combinations.
//!
//! Corners are joined per [`ClipConfig::join_type`]: mitered with the
//! `1/cos(θ/2)` scale capped by the miter limit, rounded with an arc whose
//! resolution follows the decimation factor, or squared with a bevel. Open
//! paths inflate to closed outlines with butt, square or round end caps.

use smallvec::SmallVec;

use crate::coord::{from_coord, to_coord, Point2};
use crate::polygon::{Polygon, Polyline};

use super::{ClipConfig, EndType, JoinType, MIN_AREA_MM2};

type Vec2 = (f64, f64);

/// Offset every polygon by `distance_mm`: positive grows a CCW contour,
/// negative shrinks it. Collapsed results (orientation flip or area under
/// the threshold) are dropped.
pub fn offset(polygons: &[Polygon], distance_mm: f64, config: &ClipConfig) -> Vec<Polygon> {
  polygons
    .iter()
    .filter_map(|p| offset_polygon(p, distance_mm, config))
    .collect()
}

/// Inflate open paths into closed outlines of half-width `radius_mm`,
/// capped per [`ClipConfig::end_type`]. A closed end type falls back to
/// butt caps; polygon offsetting handles genuinely closed rings.
pub fn offset_polylines(
  polylines: &[Polyline],
  radius_mm: f64,
  config: &ClipConfig,
) -> Vec<Polygon> {
  polylines
    .iter()
    .filter_map(|pl| inflate_polyline(pl, radius_mm.abs(), config))
    .collect()
}

/// Morphological opening: shrink then grow. Removes polygons narrower than
/// `2·distance_mm`.
pub fn opening(polygons: &[Polygon], distance_mm: f64, config: &ClipConfig) -> Vec<Polygon> {
  let shrunk = offset(polygons, -distance_mm, config);
  offset(&shrunk, distance_mm, config)
}

/// Morphological closing: grow then shrink. Fills gaps narrower than
/// `2·distance_mm`.
pub fn closing(polygons: &[Polygon], distance_mm: f64, config: &ClipConfig) -> Vec<Polygon> {
  let grown = offset(polygons, distance_mm, config);
  offset(&grown, -distance_mm, config)
}

/// Offset of a single polygon.
///
/// Walks the vertices, computes the outward normals of the two incident
/// edges, and emits join points per the configured join type. Zero-length
/// edges and reflex corners beyond the miter limit fall back to a single
/// unit-normal displacement.
fn offset_polygon(polygon: &Polygon, distance_mm: f64, config: &ClipConfig) -> Option<Polygon> {
  let points = polygon.points();
  let n = points.len();
  if n < 3 {
    return None;
  }
  let was_ccw = polygon.is_ccw();

  let mm: Vec<Vec2> = points.iter().map(|p| p.to_mm()).collect();
  let mut out: Vec<Vec2> = Vec::with_capacity(n + 8);

  for i in 0..n {
    let p = mm[(i + n - 1) % n];
    let v = mm[i];
    let q = mm[(i + 1) % n];

    let n1 = edge_normal(p, v, was_ccw);
    let n2 = edge_normal(v, q, was_ccw);
    match (n1, n2) {
      (Some(n1), Some(n2)) => join_corner(v, n1, n2, distance_mm, was_ccw, config, &mut out),
      (Some(n1), None) => out.push(displace(v, n1, distance_mm)),
      (None, Some(n2)) => out.push(displace(v, n2, distance_mm)),
      (None, None) => {}
    }
  }

  finish_polygon(out, Some(was_ccw), config)
}

/// Emit the offset point(s) for one corner.
///
/// The offset sweeps around the corner when the normals rotate with the
/// displacement direction (convex corners growing, reflex corners
/// shrinking); only swept corners take the round/square treatment, all
/// others reduce to the mitered point.
fn join_corner(
  v: Vec2,
  n1: Vec2,
  n2: Vec2,
  distance: f64,
  ccw: bool,
  config: &ClipConfig,
  out: &mut Vec<Vec2>,
) {
  let cross = n1.0 * n2.1 - n1.1 * n2.0;
  // Outward normals rotate with the traversal at convex corners; the
  // offset sweeps there when growing, and at reflex corners when
  // shrinking.
  let sweeps = if ccw {
    cross * distance > 0.0
  } else {
    cross * distance < 0.0
  };

  if sweeps {
    match config.join_type {
      JoinType::Miter => out.push(miter_point(v, n1, n2, distance, config)),
      JoinType::Square => {
        out.push(displace(v, n1, distance));
        out.push(displace(v, n2, distance));
      }
      JoinType::Round => {
        let points: SmallVec<[Vec2; 8]> = arc_points(n1, n2, config);
        out.extend(points.into_iter().map(|d| displace(v, d, distance)));
      }
    }
  } else {
    out.push(miter_point(v, n1, n2, distance, config));
  }
}

/// Single mitered offset point; corners whose scale would exceed the
/// miter limit fall back to a single edge-normal offset.
fn miter_point(v: Vec2, n1: Vec2, n2: Vec2, distance: f64, config: &ClipConfig) -> Vec2 {
  let mx = n1.0 + n2.0;
  let my = n1.1 + n2.1;
  let mlen = (mx * mx + my * my).sqrt();
  if mlen < 1e-12 {
    // Edges fold back on themselves; offset along one edge normal.
    return displace(v, n1, distance);
  }
  let dot = (n1.0 * n2.0 + n1.1 * n2.1).clamp(-1.0, 1.0);
  // cos(θ/2) from the half-angle identity.
  let cos_half = ((1.0 + dot) * 0.5).max(0.0).sqrt();
  if cos_half <= 1e-12 || 1.0 / cos_half > config.miter_limit {
    return displace(v, n1, distance);
  }
  let scale = 1.0 / cos_half;
  displace(v, (mx / mlen * scale, my / mlen * scale), distance)
}

/// Unit directions sweeping the short way from `n1` to `n2`, both ends
/// inclusive. Arc resolution follows the decimation factor: coarser
/// simplification tolerates coarser arcs.
fn arc_points(n1: Vec2, n2: Vec2, config: &ClipConfig) -> SmallVec<[Vec2; 8]> {
  let a1 = n1.1.atan2(n1.0);
  let mut sweep = n2.1.atan2(n2.0) - a1;
  if sweep > std::f64::consts::PI {
    sweep -= std::f64::consts::TAU;
  } else if sweep < -std::f64::consts::PI {
    sweep += std::f64::consts::TAU;
  }

  let step = max_arc_step(config);
  let segments = (sweep.abs() / step).ceil().max(1.0) as usize;
  let mut points = SmallVec::new();
  for k in 0..=segments {
    let a = a1 + sweep * k as f64 / segments as f64;
    points.push((a.cos(), a.sin()));
  }
  points
}

/// Largest arc step (radians) whose chord deviation stays within the
/// decimation factor.
fn max_arc_step(config: &ClipConfig) -> f64 {
  let decimation = config.decimation_factor.clamp(1e-4, 0.5);
  (2.0 * (1.0 - decimation).acos()).max(0.05)
}

#[inline]
fn displace(v: Vec2, dir: Vec2, distance: f64) -> Vec2 {
  (v.0 + distance * dir.0, v.1 + distance * dir.1)
}

/// Unit normal of the edge `p → q` pointing out of a CCW polygon (into a
/// CW one when `ccw` is false, which keeps hole offsets symmetric).
/// `None` for zero-length edges.
fn edge_normal(p: Vec2, q: Vec2, ccw: bool) -> Option<Vec2> {
  let ex = q.0 - p.0;
  let ey = q.1 - p.1;
  let len = (ex * ex + ey * ey).sqrt();
  if len < 1e-12 {
    return None;
  }
  if ccw {
    Some((ey / len, -ex / len))
  } else {
    Some((-ey / len, ex / len))
  }
}

/// Convert raw offset points into a validated polygon: simplify, reject
/// collapses (orientation flip where an expectation exists, or area below
/// the threshold).
fn finish_polygon(points: Vec<Vec2>, expect_ccw: Option<bool>, config: &ClipConfig) -> Option<Polygon> {
  if points.len() < 3 {
    return None;
  }
  let mut result = Polygon::from_points(
    points
      .into_iter()
      .map(|(x, y)| Point2::new(to_coord(x), to_coord(y)))
      .collect(),
  );
  if config.decimation_factor > 0.0 {
    result = simplify(&result, config.decimation_factor);
  }
  if result.len() < 3 || result.area().abs() < MIN_AREA_MM2 {
    return None;
  }
  if let Some(ccw) = expect_ccw {
    if result.is_ccw() != ccw {
      return None;
    }
  }
  Some(result)
}

// =============================================================================
// Open-path inflation
// =============================================================================

/// Inflate one open path into a CCW outline: down the right flank, around
/// the far cap, back up the left flank, around the near cap.
fn inflate_polyline(polyline: &Polyline, radius: f64, config: &ClipConfig) -> Option<Polygon> {
  if radius <= 0.0 {
    return None;
  }
  let mut mm: Vec<Vec2> = polyline.points().iter().map(|p| p.to_mm()).collect();
  mm.dedup_by(|a, b| {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt() < 1e-9
  });
  if mm.len() < 2 {
    return None;
  }

  let reversed: Vec<Vec2> = mm.iter().rev().copied().collect();
  let mut out: Vec<Vec2> = Vec::with_capacity(mm.len() * 2 + 16);
  walk_flank(&mm, radius, config, &mut out);
  cap_end(&mm, radius, config, &mut out);
  walk_flank(&reversed, radius, config, &mut out);
  cap_end(&reversed, radius, config, &mut out);

  finish_polygon(out, None, config).map(|mut p| {
    p.make_ccw();
    p
  })
}

/// Right-flank offsets for a forward traversal, joins included.
fn walk_flank(mm: &[Vec2], radius: f64, config: &ClipConfig, out: &mut Vec<Vec2>) {
  let first_normal = edge_normal(mm[0], mm[1], true).expect("deduped edge");
  out.push(displace(mm[0], first_normal, radius));
  for i in 1..mm.len() - 1 {
    let n1 = edge_normal(mm[i - 1], mm[i], true).expect("deduped edge");
    let n2 = edge_normal(mm[i], mm[i + 1], true).expect("deduped edge");
    join_corner(mm[i], n1, n2, radius, true, config, out);
  }
  let last = mm.len() - 1;
  let last_normal = edge_normal(mm[last - 1], mm[last], true).expect("deduped edge");
  out.push(displace(mm[last], last_normal, radius));
}

/// End cap at the last point of a forward traversal, sweeping from the
/// right flank across the travel direction to the left flank.
fn cap_end(mm: &[Vec2], radius: f64, config: &ClipConfig, out: &mut Vec<Vec2>) {
  let last = mm.len() - 1;
  let n_right = edge_normal(mm[last - 1], mm[last], true).expect("deduped edge");
  let n_left = (-n_right.0, -n_right.1);
  let end = mm[last];

  match config.end_type {
    EndType::OpenButt | EndType::Closed => {}
    EndType::OpenSquare => {
      // Travel direction is the right normal rotated 90° CCW.
      let dir = (-n_right.1, n_right.0);
      out.push(displace(end, (n_right.0 + dir.0, n_right.1 + dir.1), radius));
      out.push(displace(end, (n_left.0 + dir.0, n_left.1 + dir.1), radius));
    }
    EndType::OpenRound => {
      // Half-circle from the right flank to the left, interior ends
      // excluded (the flank walks already emitted them).
      let points = arc_points(n_right, (-n_right.1, n_right.0), config);
      out.extend(points.iter().skip(1).map(|&d| displace(end, d, radius)));
      let points = arc_points((-n_right.1, n_right.0), n_left, config);
      out.extend(
        points
          .iter()
          .skip(1)
          .take(points.len().saturating_sub(2))
          .map(|&d| displace(end, d, radius)),
      );
    }
  }
}

/// Drop vertices whose removal deviates from the chord by less than
/// `decimation_factor` of the chord length. Never reduces below a
/// triangle.
fn simplify(polygon: &Polygon, decimation_factor: f64) -> Polygon {
  let points = polygon.points();
  let n = points.len();
  if n <= 3 {
    return polygon.clone();
  }
  let mut keep: Vec<Point2> = Vec::with_capacity(n);
  for i in 0..n {
    let prev = *keep.last().unwrap_or(&points[(i + n - 1) % n]);
    let v = points[i];
    let next = points[(i + 1) % n];
    if keep.len() + (n - i) <= 3 {
      // Keep the remainder; a polygon needs three vertices.
      keep.push(v);
      continue;
    }
    let chord = from_coord(prev.distance_to(next));
    let deviation = from_coord(crate::coord::coord_sqrt(
      crate::predicates::point_segment_distance_sq(v, prev, next),
    ));
    if deviation >= decimation_factor * chord {
      keep.push(v);
    }
  }
  if keep.len() < 3 {
    polygon.clone()
  } else {
    Polygon::from_points(keep)
  }
}

#[cfg(test)]
#[path = "offset_test.rs"]
mod offset_test;
