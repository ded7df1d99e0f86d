//! Infill generation: pattern-line families clipped to the layer's fill
//! region.
//!
//! The fill region is the inward offset of every contour by
//! `wall_count · wall_thickness` minus the outward offset of every hole by
//! the same amount. Patterns generate an unclipped line family across the
//! region's bounding box; each candidate line is then cut at every region
//! edge and interior pieces are kept by midpoint sampling.

use crate::bounds::BoundingBox2;
use crate::clip::{boolean, offset, BooleanOp};
use crate::config::{InfillPattern, PrintConfig};
use crate::coord::{from_coord, Point2};
use crate::polygon::{ExPolygon, Polygon};
use crate::predicates::{segment_intersection, SegmentIntersection};
use crate::slice::Layer;
use smallvec::SmallVec;

use super::{extrusion_rate, Move, MoveKind, Path, PathType};

/// Fill region pieces for one layer region: inset contour minus outset
/// holes.
pub fn infill_region(ex: &ExPolygon, config: &PrintConfig) -> Vec<ExPolygon> {
  let inset = config.wall_count as f64 * config.wall_thickness;

  let contours = if inset > 0.0 {
    offset::offset(std::slice::from_ref(&ex.contour), -inset, &config.clip)
  } else {
    vec![ex.contour.clone()]
  };
  if contours.is_empty() {
    return Vec::new();
  }

  let mut grown_holes: Vec<Polygon> = Vec::new();
  for hole in &ex.holes {
    let mut ccw = hole.clone();
    ccw.make_ccw();
    if inset > 0.0 {
      grown_holes.extend(offset::offset(std::slice::from_ref(&ccw), inset, &config.clip));
    } else {
      grown_holes.push(ccw);
    }
  }

  let pieces = if grown_holes.is_empty() {
    contours
  } else {
    boolean::boolean(&contours, &grown_holes, BooleanOp::Difference, &config.clip)
  };
  pieces.into_iter().map(ExPolygon::from_contour).collect()
}

/// Generate infill paths for one layer.
pub fn generate_infill(layer: &Layer, config: &PrintConfig) -> Vec<Path> {
  let density = config.infill_density();
  if density <= 0.0 {
    return Vec::new();
  }
  let line_width = config.infill.line_width;
  let spacing = line_width / density;
  let rate = extrusion_rate(line_width, config.layer_height, config.nozzle_diameter);

  let mut paths = Vec::new();
  for ex in &layer.slices {
    for region in infill_region(ex, config) {
      let bbox = region.bounding_box();
      if !bbox.is_valid() {
        continue;
      }
      for angle in pattern_angles(config.infill.pattern, config.infill.angle_deg, layer.index) {
        for (a, b) in pattern_lines(&bbox, angle, spacing, line_width) {
          for (s, e) in clip_line_to_region(a, b, &region) {
            let mut path = Path::new(PathType::Infill, layer.index, false);
            path.push(Move {
              kind: MoveKind::Extrude,
              start: s,
              end: e,
              speed_mm_s: config.infill.speed_mm_s,
              extrusion_rate: rate,
              z_mm: layer.z,
            });
            paths.push(path);
          }
        }
      }
    }
  }
  paths
}

/// Line-family directions for a pattern, degrees.
fn pattern_angles(pattern: InfillPattern, base_deg: f64, layer_index: usize) -> SmallVec<[f64; 3]> {
  match pattern {
    InfillPattern::Rectilinear => {
      let mut angles = SmallVec::new();
      angles.push(base_deg + (layer_index % 2) as f64 * 90.0);
      angles
    }
    InfillPattern::Grid => SmallVec::from_slice(&[base_deg, base_deg + 90.0]),
    InfillPattern::Honeycomb => {
      SmallVec::from_slice(&[base_deg, base_deg + 60.0, base_deg + 120.0])
    }
  }
}

/// Evenly distributed parallel lines covering the box at the given angle.
///
/// The family spans `extent − line_width`, leaving half a line width of
/// margin at both sides, with `⌈span/spacing⌉ + 1` lines spread evenly so
/// the effective spacing never exceeds the requested one.
fn pattern_lines(
  bbox: &BoundingBox2,
  angle_deg: f64,
  spacing_mm: f64,
  line_width_mm: f64,
) -> Vec<(Point2, Point2)> {
  let (sin, cos) = angle_deg.to_radians().sin_cos();
  let dir = (cos, sin);
  let normal = (-sin, cos);

  let corners = [
    bbox.min.to_mm(),
    (from_coord(bbox.max.x), from_coord(bbox.min.y)),
    bbox.max.to_mm(),
    (from_coord(bbox.min.x), from_coord(bbox.max.y)),
  ];
  let project = |axis: (f64, f64), p: (f64, f64)| axis.0 * p.0 + axis.1 * p.1;
  let mut n_lo = f64::INFINITY;
  let mut n_hi = f64::NEG_INFINITY;
  let mut d_lo = f64::INFINITY;
  let mut d_hi = f64::NEG_INFINITY;
  for c in corners {
    n_lo = n_lo.min(project(normal, c));
    n_hi = n_hi.max(project(normal, c));
    d_lo = d_lo.min(project(dir, c));
    d_hi = d_hi.max(project(dir, c));
  }

  let span = (n_hi - n_lo) - line_width_mm;
  if span < 0.0 {
    return Vec::new();
  }
  let count = (span / spacing_mm).ceil() as usize + 1;
  let step = if count > 1 { span / (count - 1) as f64 } else { 0.0 };

  // Overshoot the box so clipping sees clean crossings.
  let d_lo = d_lo - spacing_mm;
  let d_hi = d_hi + spacing_mm;

  let mut lines = Vec::with_capacity(count);
  for k in 0..count {
    let off = n_lo + line_width_mm / 2.0 + k as f64 * step;
    let a = (
      normal.0 * off + dir.0 * d_lo,
      normal.1 * off + dir.1 * d_lo,
    );
    let b = (
      normal.0 * off + dir.0 * d_hi,
      normal.1 * off + dir.1 * d_hi,
    );
    lines.push((Point2::from_mm(a.0, a.1), Point2::from_mm(b.0, b.1)));
  }
  lines
}

/// Intersect one candidate line with the region, keeping interior pieces.
///
/// All edge crossings plus the line's own endpoints are sorted along the
/// line; each gap between consecutive cuts is kept when its midpoint lies
/// inside the region.
fn clip_line_to_region(a: Point2, b: Point2, region: &ExPolygon) -> Vec<(Point2, Point2)> {
  let dx = (b.x - a.x) as f64;
  let dy = (b.y - a.y) as f64;
  let len_sq = dx * dx + dy * dy;
  if len_sq == 0.0 {
    return Vec::new();
  }
  let param = |p: Point2| ((p.x - a.x) as f64 * dx + (p.y - a.y) as f64 * dy) / len_sq;

  let mut cuts: Vec<f64> = vec![0.0, 1.0];
  let mut rings: Vec<&Polygon> = vec![&region.contour];
  rings.extend(region.holes.iter());
  for ring in rings {
    let pts = ring.points();
    for i in 0..pts.len() {
      let e1 = pts[i];
      let e2 = pts[(i + 1) % pts.len()];
      match segment_intersection(a, b, e1, e2) {
        SegmentIntersection::Point(p) => cuts.push(param(p)),
        SegmentIntersection::CollinearOverlap(p, q) => {
          cuts.push(param(p));
          cuts.push(param(q));
        }
        SegmentIntersection::None => {}
      }
    }
  }

  cuts.sort_by(|x, y| x.partial_cmp(y).unwrap());
  cuts.dedup_by(|x, y| (*x - *y).abs() < 1e-12);

  let point_at = |t: f64| {
    Point2::new(
      a.x + (t * dx).round() as i64,
      a.y + (t * dy).round() as i64,
    )
  };

  let mut pieces = Vec::new();
  for w in cuts.windows(2) {
    let (t0, t1) = (w[0], w[1]);
    if t1 <= t0 {
      continue;
    }
    let mid = point_at((t0 + t1) / 2.0);
    if region.contains_point(mid) {
      let s = point_at(t0);
      let e = point_at(t1);
      if s != e {
        pieces.push((s, e));
      }
    }
  }
  pieces
}

#[cfg(test)]
#[path = "infill_test.rs"]
mod infill_test;
