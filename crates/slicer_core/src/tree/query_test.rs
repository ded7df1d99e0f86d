use glam::Vec3;

use super::super::AabbTree;
use crate::mesh::primitives::{cuboid, uv_sphere};

#[test]
fn test_ray_hits_cube_face() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  let hit = tree
    .ray_query(&cube, Vec3::new(5.0, 5.0, 20.0), Vec3::new(0.0, 0.0, -1.0))
    .expect("ray straight down must hit the top face");
  assert!((hit.distance - 10.0).abs() < 1e-4);
  assert!((hit.point.z - 10.0).abs() < 1e-4);
  // Top face winding gives a +Z geometric normal.
  assert!(hit.normal.normalize().z > 0.99);
}

#[test]
fn test_ray_nearest_of_two_faces() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  // Through the solid: nearest hit is the near face, not the far one.
  let hit = tree
    .ray_query(&cube, Vec3::new(-5.0, 5.0, 5.0), Vec3::X)
    .unwrap();
  assert!((hit.distance - 5.0).abs() < 1e-4);
  assert!((hit.point.x - 0.0).abs() < 1e-4);
}

#[test]
fn test_ray_miss() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  assert!(tree
    .ray_query(&cube, Vec3::new(20.0, 20.0, 20.0), Vec3::Z)
    .is_none());
  // Pointing away from the cube.
  assert!(tree
    .ray_query(&cube, Vec3::new(5.0, 5.0, 20.0), Vec3::Z)
    .is_none());
}

#[test]
fn test_ray_origin_inside_hits_exit_face() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  let hit = tree
    .ray_query(&cube, Vec3::splat(5.0), Vec3::new(0.0, -1.0, 0.0))
    .unwrap();
  assert!((hit.distance - 5.0).abs() < 1e-4);
  assert!((hit.point.y - 0.0).abs() < 1e-4);
}

#[test]
fn test_ray_axis_parallel_zero_components() {
  // Zero direction components exercise the huge-reciprocal clamp.
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  let hit = tree
    .ray_query(&cube, Vec3::new(5.0, -3.0, 5.0), Vec3::Y)
    .unwrap();
  assert!((hit.distance - 3.0).abs() < 1e-4);
}

#[test]
fn test_ray_sphere_distance() {
  let sphere = uv_sphere(Vec3::ZERO, 5.0, 64, 32);
  let tree = AabbTree::build(&sphere);
  let hit = tree
    .ray_query(&sphere, Vec3::new(0.0, 0.0, 20.0), Vec3::new(0.0, 0.0, -1.0))
    .unwrap();
  // Faceted sphere: the pole lies exactly on the surface.
  assert!((hit.distance - 15.0).abs() < 0.05);
}

#[test]
fn test_ray_against_diagonal() {
  let cube = cuboid(Vec3::ZERO, Vec3::splat(10.0));
  let tree = AabbTree::build(&cube);
  let dir = Vec3::new(1.0, 1.0, 1.0).normalize();
  // First face crossed inside its bounds is x = 0, at (0, 1, 2).
  let hit = tree.ray_query(&cube, Vec3::new(-5.0, -4.0, -3.0), dir).unwrap();
  let expected = 5.0 * 3.0f32.sqrt();
  assert!((hit.distance - expected).abs() < 1e-3);
  assert!(hit.point.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-3));
}
