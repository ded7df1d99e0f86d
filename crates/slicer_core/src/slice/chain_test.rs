use glam::Vec3;

use super::*;
use crate::config::GapConfig;
use crate::coord::to_coord;
use crate::mesh::primitives::{cuboid, uv_sphere};
use crate::slice::segment::collect_segments;
use crate::tree::AabbTree;

fn p(x: f64, y: f64) -> Point2 {
  Point2::new(to_coord(x), to_coord(y))
}

/// Bare segment with no topology; only phases 2 and 3 can touch it.
fn bare_segment(a: Point2, b: Point2) -> SliceSegment {
  SliceSegment {
    a: SegmentEnd {
      point: a,
      edge: None,
      vertex: None,
    },
    b: SegmentEnd {
      point: b,
      edge: None,
      vertex: None,
    },
    triangle: 0,
    orientation: FacetOrientation::Vertical,
    consumed: false,
  }
}

#[test]
fn test_phase1_cube_layer_closes_one_loop() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  let mut segments = collect_segments(&cube, &tree, 5.0);
  assert_eq!(segments.len(), 8);

  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.polygons.len(), 1);
  assert_eq!(result.open_discarded, 0);
  assert_eq!(result.gaps_closed, 0);
  let poly = &result.polygons[0];
  assert!(poly.is_ccw());
  assert!((poly.area() - 100.0).abs() < 1e-6);
}

#[test]
fn test_phase1_sphere_layer_closes_ring() {
  let sphere = uv_sphere(Vec3::ZERO, 5.0, 32, 16);
  let tree = AabbTree::build(&sphere);
  // A plane between rings produces clean standard segments only.
  let mut segments = collect_segments(&sphere, &tree, 0.123);
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.polygons.len(), 1);
  assert_eq!(result.open_discarded, 0);
  let area = result.polygons[0].area();
  let expected = std::f64::consts::PI * 25.0;
  // 32-gon cross-section of a faceted sphere.
  assert!((area - expected).abs() / expected < 0.05, "area {}", area);
}

#[test]
fn test_chaining_is_deterministic() {
  let sphere = uv_sphere(Vec3::ZERO, 5.0, 32, 16);
  let tree = AabbTree::build(&sphere);
  let run = || {
    let mut segments = collect_segments(&sphere, &tree, 1.37);
    chain_segments(&mut segments, &GapConfig::default())
  };
  let a = run();
  let b = run();
  assert_eq!(a.polygons.len(), b.polygons.len());
  for (pa, pb) in a.polygons.iter().zip(&b.polygons) {
    assert_eq!(pa.points(), pb.points());
  }
}

#[test]
fn test_phase2_joins_exact_endpoints() {
  // Four topology-free segments forming a square with exact endpoints.
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(10.0, 0.0)),
    bare_segment(p(10.0, 0.0), p(10.0, 10.0)),
    bare_segment(p(10.0, 10.0), p(0.0, 10.0)),
    bare_segment(p(0.0, 10.0), p(0.0, 0.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.polygons.len(), 1);
  assert_eq!(result.gaps_closed, 0);
  assert!((result.polygons[0].area() - 100.0).abs() < 1e-9);
}

#[test]
fn test_phase2_handles_reversed_segments() {
  // Same square but with two segments flipped; all four join orientations
  // get exercised.
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(10.0, 0.0)),
    bare_segment(p(10.0, 10.0), p(10.0, 0.0)),
    bare_segment(p(10.0, 10.0), p(0.0, 10.0)),
    bare_segment(p(0.0, 0.0), p(0.0, 10.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.polygons.len(), 1);
  assert!((result.polygons[0].area().abs() - 100.0).abs() < 1e-9);
}

#[test]
fn test_phase3_bridges_micron_gap() {
  // Two collinear segments 1 µm apart: beyond the exact tolerance, well
  // within the gap limit.
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(5.0, 0.0)),
    bare_segment(p(5.001, 0.0), p(10.0, 0.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.gaps_closed, 1);
  // The merged polyline cannot loop (its far ends are 10 mm apart), so it
  // is discarded as unprintable - but the gap was bridged.
  assert_eq!(result.open_discarded, 1);
  assert!(result.polygons.is_empty());
}

#[test]
fn test_phase3_closes_square_with_gap() {
  // Square with one 0.5 mm notch: three exact joins and one bridged gap.
  let mut segments = vec![
    bare_segment(p(0.5, 0.0), p(10.0, 0.0)),
    bare_segment(p(10.0, 0.0), p(10.0, 10.0)),
    bare_segment(p(10.0, 10.0), p(0.0, 10.0)),
    bare_segment(p(0.0, 10.0), p(0.0, 0.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.polygons.len(), 1);
  assert_eq!(result.open_discarded, 0);
  let area = result.polygons[0].area();
  // The bridge runs straight across the notch.
  assert!((area - 100.0).abs() < 3.0, "area {}", area);
}

#[test]
fn test_gap_beyond_limit_stays_open() {
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(5.0, 0.0)),
    bare_segment(p(7.5, 0.0), p(12.0, 0.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.gaps_closed, 0);
  assert_eq!(result.open_discarded, 2);
}

#[test]
fn test_gap_exactly_at_limit_accepted() {
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(5.0, 0.0)),
    bare_segment(p(7.0, 0.0), p(12.0, 0.0)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.gaps_closed, 1);
}

#[test]
fn test_gap_angle_limit_rejects_sharp_turn() {
  // Candidate bridge leaves the first chain at ~63° off its tangent.
  let mut segments = vec![
    bare_segment(p(0.0, 0.0), p(5.0, 0.0)),
    bare_segment(p(5.3, -3.0), p(5.3, -0.6)),
  ];
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert_eq!(result.gaps_closed, 0);
}

#[test]
fn test_empty_input() {
  let mut segments: Vec<SliceSegment> = Vec::new();
  let result = chain_segments(&mut segments, &GapConfig::default());
  assert!(result.polygons.is_empty());
  assert_eq!(result.open_discarded, 0);
  assert_eq!(result.gaps_closed, 0);
}

#[test]
fn test_output_polygons_are_ccw() {
  let sphere = uv_sphere(Vec3::new(0.0, 0.0, 0.0), 4.0, 24, 12);
  let tree = AabbTree::build(&sphere);
  for z in [-2.3, -0.7, 0.4, 1.9, 3.1] {
    let mut segments = collect_segments(&sphere, &tree, z);
    let result = chain_segments(&mut segments, &GapConfig::default());
    for poly in &result.polygons {
      assert!(poly.is_ccw());
      assert!(poly.area() > 0.0);
    }
  }
}
