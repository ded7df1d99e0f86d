//! Primitive mesh builders for tests, benches and callers that need a
//! quick solid.

use glam::Vec3;

use super::TriangleMesh;

/// Axis-aligned closed box from `min` with edge lengths `size`.
pub fn cuboid(min: Vec3, size: Vec3) -> TriangleMesh {
  let max = min + size;
  let corners = [
    Vec3::new(min.x, min.y, min.z),
    Vec3::new(max.x, min.y, min.z),
    Vec3::new(max.x, max.y, min.z),
    Vec3::new(min.x, max.y, min.z),
    Vec3::new(min.x, min.y, max.z),
    Vec3::new(max.x, min.y, max.z),
    Vec3::new(max.x, max.y, max.z),
    Vec3::new(min.x, max.y, max.z),
  ];
  // Outward winding per face.
  const FACES: [[usize; 3]; 12] = [
    [0, 2, 1],
    [0, 3, 2], // bottom, -Z
    [4, 5, 6],
    [4, 6, 7], // top, +Z
    [0, 1, 5],
    [0, 5, 4], // -Y
    [1, 2, 6],
    [1, 6, 5], // +X
    [2, 3, 7],
    [2, 7, 6], // +Y
    [3, 0, 4],
    [3, 4, 7], // -X
  ];

  let mut mesh = TriangleMesh::new();
  for f in FACES {
    mesh.add_triangle(corners[f[0]], corners[f[1]], corners[f[2]]);
  }
  mesh.prepare();
  mesh
}

/// Closed UV sphere with `slices` meridians and `stacks` parallels.
pub fn uv_sphere(center: Vec3, radius: f32, slices: usize, stacks: usize) -> TriangleMesh {
  let slices = slices.max(3);
  let stacks = stacks.max(2);

  // Precompute the ring grid so shared positions are bit-identical and
  // vertex dedup merges them.
  let mut rings: Vec<Vec<Vec3>> = Vec::with_capacity(stacks + 1);
  for i in 0..=stacks {
    // Exact pole points; trig at the poles would produce signed zeros
    // that defeat bit-exact vertex dedup.
    if i == 0 {
      rings.push(vec![center + Vec3::new(0.0, 0.0, radius); slices]);
      continue;
    }
    if i == stacks {
      rings.push(vec![center - Vec3::new(0.0, 0.0, radius); slices]);
      continue;
    }
    let phi = std::f32::consts::PI * i as f32 / stacks as f32;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let mut ring = Vec::with_capacity(slices);
    for j in 0..slices {
      let theta = std::f32::consts::TAU * j as f32 / slices as f32;
      let (sin_theta, cos_theta) = theta.sin_cos();
      ring.push(
        center
          + Vec3::new(
            radius * sin_phi * cos_theta,
            radius * sin_phi * sin_theta,
            radius * cos_phi,
          ),
      );
    }
    rings.push(ring);
  }

  let mut mesh = TriangleMesh::new();
  for i in 0..stacks {
    for j in 0..slices {
      let jn = (j + 1) % slices;
      let a = rings[i][j];
      let b = rings[i + 1][j];
      let c = rings[i + 1][jn];
      let d = rings[i][jn];
      // Pole rings collapse one triangle of the quad.
      if i != 0 {
        mesh.add_triangle(a, b, d);
      }
      if i != stacks - 1 {
        mesh.add_triangle(b, c, d);
      }
    }
  }
  mesh.prepare();
  mesh
}

#[cfg(test)]
#[path = "primitives_test.rs"]
mod primitives_test;
