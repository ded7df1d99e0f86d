//! Axis-aligned bounding boxes.
//!
//! [`BoundingBox2`] lives in the exact coordinate domain and backs polygon
//! queries and clipping rejection. [`BoundingBox3`] is float-valued and backs
//! the mesh and the AABB tree, where the inputs are float vertices anyway.
//!
//! Both start inverted from `empty()` and restore `min <= max` on the first
//! `include`/`encapsulate`.

use glam::Vec3;

use crate::coord::{Coord, Point2};

// =============================================================================
// BoundingBox2 - exact planar box
// =============================================================================

/// Exact 2D bounding box over scaled-integer points.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoundingBox2 {
  pub min: Point2,
  pub max: Point2,
}

impl BoundingBox2 {
  /// Box with inverted extents, ready for `include`.
  pub fn empty() -> Self {
    Self {
      min: Point2::new(Coord::MAX, Coord::MAX),
      max: Point2::new(Coord::MIN, Coord::MIN),
    }
  }

  pub fn new(min: Point2, max: Point2) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y,
      "BoundingBox2 min must be <= max on both axes"
    );
    Self { min, max }
  }

  /// Tightest box around a point set. Empty input yields `empty()`.
  pub fn from_points(points: &[Point2]) -> Self {
    let mut bb = Self::empty();
    for &p in points {
      bb.include(p);
    }
    bb
  }

  /// Expand to include a point.
  #[inline]
  pub fn include(&mut self, p: Point2) {
    self.min.x = self.min.x.min(p.x);
    self.min.y = self.min.y.min(p.y);
    self.max.x = self.max.x.max(p.x);
    self.max.y = self.max.y.max(p.y);
  }

  /// Expand to include another box.
  #[inline]
  pub fn merge(&mut self, other: &BoundingBox2) {
    if other.is_valid() {
      self.include(other.min);
      self.include(other.max);
    }
  }

  /// True once at least one point has been included.
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.min.x <= self.max.x && self.min.y <= self.max.y
  }

  /// Overlap test; touching boundaries count as overlapping.
  #[inline]
  pub fn overlaps(&self, other: &BoundingBox2) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }

  /// Containment test, boundary inclusive.
  #[inline]
  pub fn contains(&self, p: Point2) -> bool {
    p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
  }

  /// True when `other` lies entirely within this box.
  #[inline]
  pub fn contains_box(&self, other: &BoundingBox2) -> bool {
    self.contains(other.min) && self.contains(other.max)
  }

  #[inline]
  pub fn size(&self) -> (Coord, Coord) {
    (self.max.x - self.min.x, self.max.y - self.min.y)
  }

  #[inline]
  pub fn center(&self) -> Point2 {
    Point2::new(
      self.min.x + (self.max.x - self.min.x) / 2,
      self.min.y + (self.max.y - self.min.y) / 2,
    )
  }

  /// Grow symmetrically by `margin` on both axes.
  pub fn inflate(&mut self, margin: Coord) {
    self.min.x -= margin;
    self.min.y -= margin;
    self.max.x += margin;
    self.max.y += margin;
  }
}

impl Default for BoundingBox2 {
  fn default() -> Self {
    Self::empty()
  }
}

// =============================================================================
// BoundingBox3 - float spatial box
// =============================================================================

/// Float 3D bounding box used by the mesh and the AABB tree.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundingBox3 {
  pub min: Vec3,
  pub max: Vec3,
}

impl BoundingBox3 {
  /// Box with inverted extents, ready for `encapsulate`.
  pub fn empty() -> Self {
    Self {
      min: Vec3::splat(f32::INFINITY),
      max: Vec3::splat(f32::NEG_INFINITY),
    }
  }

  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "BoundingBox3 min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Expand to include a point.
  #[inline]
  pub fn encapsulate(&mut self, p: Vec3) {
    self.min = self.min.min(p);
    self.max = self.max.max(p);
  }

  /// Expand to include another box.
  #[inline]
  pub fn merge(&mut self, other: &BoundingBox3) {
    self.min = self.min.min(other.min);
    self.max = self.max.max(other.max);
  }

  /// True once at least one point has been encapsulated.
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
  }

  /// Overlap test; touching boundaries count as overlapping.
  #[inline]
  pub fn overlaps(&self, other: &BoundingBox3) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  /// Containment test, boundary inclusive.
  #[inline]
  pub fn contains_point(&self, p: Vec3) -> bool {
    p.x >= self.min.x
      && p.x <= self.max.x
      && p.y >= self.min.y
      && p.y <= self.max.y
      && p.z >= self.min.z
      && p.z <= self.max.z
  }

  /// True when `other` lies entirely within this box (with `eps` slack).
  #[inline]
  pub fn contains_box(&self, other: &BoundingBox3, eps: f32) -> bool {
    other.min.x >= self.min.x - eps
      && other.min.y >= self.min.y - eps
      && other.min.z >= self.min.z - eps
      && other.max.x <= self.max.x + eps
      && other.max.y <= self.max.y + eps
      && other.max.z <= self.max.z + eps
  }

  /// True when the horizontal plane at `z` cuts this box, boundary inclusive.
  #[inline]
  pub fn straddles_z(&self, z: f32) -> bool {
    self.min.z <= z && self.max.z >= z
  }

  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  /// Surface area of the box, the quantity the SAH cost model scores.
  #[inline]
  pub fn surface_area(&self) -> f32 {
    if !self.is_valid() {
      return 0.0;
    }
    let d = self.size();
    2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
  }
}

impl Default for BoundingBox3 {
  fn default() -> Self {
    Self::empty()
  }
}

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;
