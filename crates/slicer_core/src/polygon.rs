//! Polygon data model: simple polygons, polygons with holes, open polylines.
//!
//! A [`Polygon`] is an ordered point sequence with an implicit closing edge;
//! the sign of its area encodes orientation (positive = counter-clockwise).
//! An [`ExPolygon`] is one CCW contour plus zero or more CW holes, the
//! per-layer currency of the slicer. A [`Polyline`] is open.

use crate::bounds::BoundingBox2;
use crate::coord::{from_coord, Coord, Point2, COORD_SCALE};
use crate::predicates::point_in_polygon;

// =============================================================================
// Polygon
// =============================================================================

/// Closed polygon over exact points. The edge from the last point back to
/// the first is implicit; fewer than 3 points is degenerate.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Polygon {
  points: Vec<Point2>,
}

impl Polygon {
  pub fn new() -> Self {
    Self { points: Vec::new() }
  }

  pub fn from_points(points: Vec<Point2>) -> Self {
    Self { points }
  }

  /// Axis-aligned rectangle, counter-clockwise.
  pub fn rectangle(min: Point2, max: Point2) -> Self {
    Self {
      points: vec![
        min,
        Point2::new(max.x, min.y),
        max,
        Point2::new(min.x, max.y),
      ],
    }
  }

  /// Regular polygonal approximation of a circle, counter-clockwise.
  pub fn circle(center: Point2, radius_mm: f64, segments: usize) -> Self {
    let segments = segments.max(3);
    let r = radius_mm * COORD_SCALE;
    let mut points = Vec::with_capacity(segments);
    for i in 0..segments {
      let angle = std::f64::consts::TAU * i as f64 / segments as f64;
      points.push(Point2::new(
        center.x + (r * angle.cos()).round() as Coord,
        center.y + (r * angle.sin()).round() as Coord,
      ));
    }
    Self { points }
  }

  #[inline]
  pub fn points(&self) -> &[Point2] {
    &self.points
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn add_point(&mut self, p: Point2) {
    self.points.push(p);
  }

  /// Twice the signed area in squared coordinate units. Exact.
  pub fn signed_area_x2(&self) -> i128 {
    let n = self.points.len();
    if n < 3 {
      return 0;
    }
    let mut sum: i128 = 0;
    for i in 0..n {
      let a = self.points[i];
      let b = self.points[(i + 1) % n];
      sum += (a.x as i128) * (b.y as i128) - (b.x as i128) * (a.y as i128);
    }
    sum
  }

  /// Signed area in mm². Positive for counter-clockwise winding.
  pub fn area(&self) -> f64 {
    (self.signed_area_x2() as f64) * 0.5 / (COORD_SCALE * COORD_SCALE)
  }

  #[inline]
  pub fn is_ccw(&self) -> bool {
    self.signed_area_x2() > 0
  }

  pub fn reverse(&mut self) {
    self.points.reverse();
  }

  pub fn make_ccw(&mut self) {
    if self.signed_area_x2() < 0 {
      self.reverse();
    }
  }

  pub fn make_cw(&mut self) {
    if self.signed_area_x2() > 0 {
      self.reverse();
    }
  }

  pub fn bounding_box(&self) -> BoundingBox2 {
    BoundingBox2::from_points(&self.points)
  }

  pub fn translate(&mut self, dx: Coord, dy: Coord) {
    for p in &mut self.points {
      p.x += dx;
      p.y += dy;
    }
  }

  /// Scale about the origin.
  pub fn scale(&mut self, factor: f64) {
    for p in &mut self.points {
      p.x = (p.x as f64 * factor).round() as Coord;
      p.y = (p.y as f64 * factor).round() as Coord;
    }
  }

  /// Boundary-inclusive containment.
  pub fn contains_point(&self, p: Point2) -> bool {
    point_in_polygon(p, &self.points)
  }

  /// Perimeter length in mm.
  pub fn perimeter(&self) -> f64 {
    let n = self.points.len();
    if n < 2 {
      return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
      let a = self.points[i];
      let b = self.points[(i + 1) % n];
      total += from_coord(a.distance_to(b));
    }
    total
  }

  pub fn into_points(self) -> Vec<Point2> {
    self.points
  }
}

// =============================================================================
// ExPolygon
// =============================================================================

/// Polygon with holes: one CCW contour, zero or more CW holes.
///
/// The constructor enforces orientation. Holes are expected to lie inside
/// the contour and be pairwise disjoint; validators may assume it.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ExPolygon {
  pub contour: Polygon,
  pub holes: Vec<Polygon>,
}

impl ExPolygon {
  pub fn new(mut contour: Polygon, mut holes: Vec<Polygon>) -> Self {
    contour.make_ccw();
    for hole in &mut holes {
      hole.make_cw();
    }
    Self { contour, holes }
  }

  pub fn from_contour(mut contour: Polygon) -> Self {
    contour.make_ccw();
    Self {
      contour,
      holes: Vec::new(),
    }
  }

  /// Net area in mm²: contour minus holes. Non-negative for a well-formed
  /// expolygon.
  pub fn area(&self) -> f64 {
    // Hole areas are negative (CW), so adding them subtracts.
    self.contour.area() + self.holes.iter().map(Polygon::area).sum::<f64>()
  }

  pub fn bounding_box(&self) -> BoundingBox2 {
    self.contour.bounding_box()
  }

  /// Inside the contour and not inside any hole.
  pub fn contains_point(&self, p: Point2) -> bool {
    if !self.contour.contains_point(p) {
      return false;
    }
    !self.holes.iter().any(|h| h.contains_point(p))
  }

  /// Structural invariants: CCW contour with at least three points, CW
  /// holes, every hole inside the contour with its box contained in the
  /// contour's box.
  pub fn is_valid(&self) -> bool {
    if self.contour.len() < 3 || !self.contour.is_ccw() {
      return false;
    }
    let outer_box = self.contour.bounding_box();
    for hole in &self.holes {
      if hole.len() < 3 || hole.is_ccw() {
        return false;
      }
      if !outer_box.contains_box(&hole.bounding_box()) {
        return false;
      }
      if !self.contour.contains_point(hole.points()[0]) {
        return false;
      }
    }
    true
  }
}

// =============================================================================
// Polyline
// =============================================================================

/// Open point sequence; no implicit closing edge.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Polyline {
  points: Vec<Point2>,
}

impl Polyline {
  pub fn new() -> Self {
    Self { points: Vec::new() }
  }

  pub fn from_points(points: Vec<Point2>) -> Self {
    Self { points }
  }

  #[inline]
  pub fn points(&self) -> &[Point2] {
    &self.points
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  #[inline]
  pub fn first(&self) -> Option<Point2> {
    self.points.first().copied()
  }

  #[inline]
  pub fn last(&self) -> Option<Point2> {
    self.points.last().copied()
  }

  pub fn push(&mut self, p: Point2) {
    self.points.push(p);
  }

  pub fn reverse(&mut self) {
    self.points.reverse();
  }

  pub fn clear(&mut self) {
    self.points.clear();
  }

  /// Total length in mm.
  pub fn length(&self) -> f64 {
    self
      .points
      .windows(2)
      .map(|w| from_coord(w[0].distance_to(w[1])))
      .sum()
  }

  pub fn into_points(self) -> Vec<Point2> {
    self.points
  }

  pub fn points_mut(&mut self) -> &mut Vec<Point2> {
    &mut self.points
  }
}

// =============================================================================
// Hole classification
// =============================================================================

/// Group closed loops into expolygons by containment depth.
///
/// Even nesting depth makes a loop a contour, odd depth makes it a hole of
/// the smallest containing loop. Input orientation is ignored; output
/// orientation is normalized (contours CCW, holes CW).
pub fn assemble_expolygons(polygons: Vec<Polygon>) -> Vec<ExPolygon> {
  let polygons: Vec<Polygon> = polygons.into_iter().filter(|p| p.len() >= 3).collect();
  if polygons.is_empty() {
    return Vec::new();
  }

  let bboxes: Vec<BoundingBox2> = polygons.iter().map(Polygon::bounding_box).collect();
  let abs_areas: Vec<f64> = polygons.iter().map(|p| p.area().abs()).collect();

  // For each loop, the set of other loops containing it decides its depth;
  // the smallest container is its direct parent.
  let n = polygons.len();
  let mut parent: Vec<Option<usize>> = vec![None; n];
  let mut depth: Vec<usize> = vec![0; n];
  for i in 0..n {
    let probe = polygons[i].points()[0];
    let mut best: Option<usize> = None;
    for j in 0..n {
      if i == j || !bboxes[j].contains_box(&bboxes[i]) {
        continue;
      }
      if polygons[j].contains_point(probe) {
        depth[i] += 1;
        if best.map_or(true, |b| abs_areas[j] < abs_areas[b]) {
          best = Some(j);
        }
      }
    }
    parent[i] = best;
  }

  let mut result: Vec<ExPolygon> = Vec::new();
  let mut contour_slot: Vec<Option<usize>> = vec![None; n];
  // Contours first so holes can find their slots.
  for i in 0..n {
    if depth[i] % 2 == 0 {
      let mut contour = polygons[i].clone();
      contour.make_ccw();
      contour_slot[i] = Some(result.len());
      result.push(ExPolygon {
        contour,
        holes: Vec::new(),
      });
    }
  }
  for i in 0..n {
    if depth[i] % 2 == 1 {
      if let Some(slot) = parent[i].and_then(|p| contour_slot[p]) {
        let mut hole = polygons[i].clone();
        hole.make_cw();
        result[slot].holes.push(hole);
      }
    }
  }
  result
}

#[cfg(test)]
#[path = "polygon_test.rs"]
mod polygon_test;
