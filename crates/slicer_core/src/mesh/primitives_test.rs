use glam::Vec3;

use super::*;

#[test]
fn test_cuboid_counts() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  assert_eq!(cube.vertex_count(), 8);
  assert_eq!(cube.triangle_count(), 12);
  assert_eq!(cube.validate(), Ok(()));
}

#[test]
fn test_cuboid_bounding_box() {
  let cube = cuboid(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(2.0, 4.0, 6.0));
  let bb = cube.bounding_box();
  assert_eq!(bb.min, Vec3::new(-1.0, -2.0, -3.0));
  assert_eq!(bb.max, Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_cuboid_normals_point_outward() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(2.0));
  let center = Vec3::splat(1.0);
  for t in 0..cube.triangle_count() as u32 {
    let pts = cube.set().triangle_points(t);
    let centroid = (pts[0] + pts[1] + pts[2]) / 3.0;
    let n = cube.triangle_normal(t);
    assert!(
      n.dot(centroid - center) > 0.0,
      "triangle {} normal points inward",
      t
    );
  }
}

#[test]
fn test_sphere_closed_manifold() {
  let sphere = uv_sphere(Vec3::ZERO, 5.0, 16, 8);
  assert_eq!(sphere.validate(), Ok(()));
  assert_eq!(sphere.topology().boundary_edge_count(), 0);
  assert_eq!(sphere.topology().non_manifold_edges(), 0);
}

#[test]
fn test_sphere_bounding_box() {
  let sphere = uv_sphere(Vec3::new(1.0, 2.0, 3.0), 5.0, 24, 12);
  let bb = sphere.bounding_box();
  assert!((bb.min.z - (-2.0)).abs() < 1e-5);
  assert!((bb.max.z - 8.0).abs() < 1e-5);
  // Equator reaches the full radius in X and Y.
  assert!((bb.max.x - 6.0).abs() < 1e-3);
  assert!((bb.min.y - (-3.0)).abs() < 1e-3);
}

#[test]
fn test_sphere_minimum_tessellation_clamped() {
  let sphere = uv_sphere(Vec3::ZERO, 1.0, 1, 1);
  assert!(sphere.triangle_count() > 0);
  assert_eq!(sphere.validate(), Ok(()));
}
