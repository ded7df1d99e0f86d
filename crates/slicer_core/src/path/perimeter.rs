//! Perimeter (wall) generation: concentric inward offsets of each layer
//! region.
//!
//! Wall `i` runs at inset `i·wall_thickness + wall_thickness/2` from the
//! region boundary - contours offset inward, holes outward into the
//! material - so wall centrelines sit half a line width inside the surface.
//! The outermost wall prints slower for surface finish.

use crate::clip::offset;
use crate::config::PrintConfig;
use crate::polygon::Polygon;
use crate::slice::Layer;

use super::{extrusion_rate, Move, MoveKind, Path, PathType};

/// Generate all wall paths for one layer.
pub fn generate_perimeters(layer: &Layer, config: &PrintConfig) -> Vec<Path> {
  let mut paths = Vec::new();
  let rate = extrusion_rate(
    config.extrusion_width,
    config.layer_height,
    config.nozzle_diameter,
  );

  for ex in &layer.slices {
    for wall in 0..config.wall_count {
      let inset = wall as f64 * config.wall_thickness + config.wall_thickness / 2.0;
      let kind = if wall == 0 {
        PathType::PerimeterOuter
      } else {
        PathType::PerimeterInner
      };
      let speed = if wall == 0 {
        config.outer_wall_speed_mm_s
      } else {
        config.inner_wall_speed_mm_s
      };

      // Contour walls shrink inward.
      for ring in offset::offset(std::slice::from_ref(&ex.contour), -inset, &config.clip) {
        push_ring(&mut paths, &ring, layer, kind, speed, rate);
      }

      // Hole walls grow away from the cavity; orientation is restored to
      // CW afterwards so hole paths keep their winding.
      for hole in &ex.holes {
        let mut ccw = hole.clone();
        ccw.make_ccw();
        for mut ring in offset::offset(std::slice::from_ref(&ccw), inset, &config.clip) {
          ring.make_cw();
          push_ring(&mut paths, &ring, layer, kind, speed, rate);
        }
      }
    }
  }
  paths
}

fn push_ring(
  paths: &mut Vec<Path>,
  ring: &Polygon,
  layer: &Layer,
  kind: PathType,
  speed: f64,
  rate: f64,
) {
  let points = ring.points();
  if points.len() < 3 {
    return;
  }
  let mut path = Path::new(kind, layer.index, true);
  for w in points.windows(2) {
    path.push(Move {
      kind: MoveKind::Extrude,
      start: w[0],
      end: w[1],
      speed_mm_s: speed,
      extrusion_rate: rate,
      z_mm: layer.z,
    });
  }
  paths.push(path);
}

#[cfg(test)]
#[path = "perimeter_test.rs"]
mod perimeter_test;
