use glam::Vec3;

use super::*;
use crate::mesh::primitives::{cuboid, uv_sphere};

fn cube_config() -> PrintConfig {
  PrintConfig {
    layer_height: 2.0,
    first_layer_height: 2.0,
    ..PrintConfig::default()
  }
}

#[test]
fn test_layer_planes_cube() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  cube.prepare();
  let planes = layer_planes(&cube, &cube_config());
  assert_eq!(planes, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
}

#[test]
fn test_layer_planes_first_layer_height() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(1.0));
  cube.prepare();
  let cfg = PrintConfig {
    layer_height: 0.2,
    first_layer_height: 0.3,
    ..PrintConfig::default()
  };
  let planes = layer_planes(&cube, &cfg);
  assert!((planes[0] - 0.15).abs() < 1e-9);
  assert!((planes[1] - 0.4).abs() < 1e-9);
  assert!((planes[2] - 0.6).abs() < 1e-9);
}

#[test]
fn test_layer_planes_empty_mesh() {
  let mut mesh = crate::mesh::TriangleMesh::new();
  mesh.prepare();
  assert!(layer_planes(&mesh, &PrintConfig::default()).is_empty());
}

#[test]
fn test_cube_ten_mm_two_mm_layers() {
  // Unit scenario: 10×10×10 mm cube at 2 mm layers gives 5 layers, the
  // middle one with ~100 mm² of area, and a reconstructed volume within
  // 30% of 1000 mm³.
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let result = slice_mesh(&mut cube, &cube_config());

  assert_eq!(result.layers.len(), 5);
  assert_eq!(result.stats.layer_count, 5);
  let middle = &result.layers[2];
  assert_eq!(middle.slices.len(), 1);
  assert!((middle.z - 5.0).abs() < 1e-9);
  assert!((middle.slices[0].area() - 100.0).abs() < 1e-6);

  let volume: f64 = result
    .layers
    .iter()
    .map(|l| l.slices.iter().map(ExPolygon::area).sum::<f64>() * 2.0)
    .sum();
  assert!((volume - 1000.0).abs() / 1000.0 < 0.3, "volume {}", volume);
}

#[test]
fn test_cube_layers_are_identical_squares() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let result = slice_mesh(&mut cube, &cube_config());
  for layer in &result.layers {
    assert_eq!(layer.slices.len(), 1);
    assert!(layer.slices[0].holes.is_empty());
    assert!(layer.slices[0].contour.is_ccw());
    assert!((layer.slices[0].area() - 100.0).abs() < 1e-6);
  }
  assert_eq!(result.stats.open_discarded, 0);
  assert_eq!(result.stats.gaps_closed, 0);
}

#[test]
fn test_slicing_is_deterministic() {
  let mut sphere = uv_sphere(Vec3::new(5.0, 5.0, 5.0), 4.0, 32, 16);
  let cfg = PrintConfig::default();
  let a = slice_mesh(&mut sphere, &cfg);
  let b = slice_mesh(&mut sphere, &cfg);
  assert_eq!(a.layers.len(), b.layers.len());
  for (la, lb) in a.layers.iter().zip(&b.layers) {
    assert_eq!(la.slices.len(), lb.slices.len());
    for (ea, eb) in la.slices.iter().zip(&lb.slices) {
      assert_eq!(ea.contour.points(), eb.contour.points());
    }
  }
}

#[test]
fn test_sphere_layer_areas_follow_cross_sections() {
  let mut sphere = uv_sphere(Vec3::new(0.0, 0.0, 5.0), 5.0, 48, 24);
  let cfg = PrintConfig {
    layer_height: 1.0,
    first_layer_height: 1.0,
    ..PrintConfig::default()
  };
  let result = slice_mesh(&mut sphere, &cfg);
  assert_eq!(result.layers.len(), 10);
  for layer in &result.layers {
    let h = layer.z - 5.0;
    let expected = std::f64::consts::PI * (25.0 - h * h);
    let actual: f64 = layer.slices.iter().map(ExPolygon::area).sum();
    // Faceting flattens the poles; mid-sphere layers track closely.
    let tolerance = if h.abs() > 4.0 { 0.30 } else { 0.05 };
    assert!(
      (actual - expected).abs() / expected < tolerance,
      "z {} expected {} actual {}",
      layer.z,
      expected,
      actual
    );
  }
}

#[test]
fn test_parallel_matches_sequential() {
  let mut sphere = uv_sphere(Vec3::new(5.0, 5.0, 5.0), 4.5, 32, 16);
  let cfg = PrintConfig::default();
  let sequential = slice_mesh(&mut sphere, &cfg);
  let parallel = slice_mesh_parallel(&mut sphere, &cfg, &CancelToken::new());

  assert_eq!(sequential.layers.len(), parallel.layers.len());
  for (a, b) in sequential.layers.iter().zip(&parallel.layers) {
    assert_eq!(a.index, b.index);
    assert_eq!(a.slices.len(), b.slices.len());
    for (ea, eb) in a.slices.iter().zip(&b.slices) {
      assert_eq!(ea.contour.points(), eb.contour.points());
    }
  }
}

#[test]
fn test_cancelled_token_stops_immediately() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let cancel = CancelToken::new();
  cancel.cancel();
  let result = slice_mesh_parallel(&mut cube, &cube_config(), &cancel);
  assert!(result.layers.is_empty());
}

#[test]
fn test_two_disjoint_solids_slice_separately() {
  let a = cuboid(Vec3::ZERO, Vec3::splat(5.0));
  let b = cuboid(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(5.0));
  let mut mesh = crate::mesh::TriangleMesh::new();
  for src in [&a, &b] {
    for t in 0..src.triangle_count() as u32 {
      let [p0, p1, p2] = src.set().triangle_points(t);
      mesh.add_triangle(p0, p1, p2);
    }
  }
  let cfg = PrintConfig {
    layer_height: 1.0,
    first_layer_height: 1.0,
    ..PrintConfig::default()
  };
  let result = slice_mesh(&mut mesh, &cfg);
  assert_eq!(result.layers.len(), 5);
  for layer in &result.layers {
    assert_eq!(layer.slices.len(), 2);
    let total: f64 = layer.slices.iter().map(ExPolygon::area).sum();
    assert!((total - 50.0).abs() < 1e-6);
  }
}

#[test]
fn test_empty_mesh_slices_to_nothing() {
  let mut mesh = crate::mesh::TriangleMesh::new();
  let result = slice_mesh(&mut mesh, &PrintConfig::default());
  assert!(result.layers.is_empty());
  assert_eq!(result.stats.layer_count, 0);
}

#[test]
fn test_stats_accumulate() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let result = slice_mesh(&mut cube, &cube_config());
  // 5 layers × 8 candidate side triangles and 8 segments each.
  assert_eq!(result.stats.candidate_triangles, 40);
  assert_eq!(result.stats.segments, 40);
  assert_eq!(result.stats.polygons, 5);
}

#[test]
fn test_dump_contours_format() {
  let mut cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let result = slice_mesh(&mut cube, &cube_config());
  let dump = result.layers[0].dump_contours();
  assert!(dump.starts_with("layer 0 z=1.000"));
  assert!(dump.contains("contour:"));
  assert!(dump.contains("(10.000, 10.000)"));
}
