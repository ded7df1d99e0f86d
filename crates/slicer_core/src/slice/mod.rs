//! The slicing pipeline: mesh to per-layer polygons.
//!
//! ```text
//! TriangleMesh ──► AabbTree ──► per-plane query ──► triangle_plane ──► segments
//!                                                                        │
//!      Layer { z, ExPolygon[] } ◄── assemble_expolygons ◄── chain_segments
//! ```
//!
//! Each layer is a pure function of (mesh, tree, config, z), so the batch
//! entry point runs one rayon task per layer over the shared read-only mesh
//! and tree, collecting disjoint outputs in ascending-z order. Cancellation
//! is cooperative at layer granularity.

pub mod chain;
pub mod gap;
pub mod segment;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use web_time::Instant;

use crate::config::PrintConfig;
use crate::coord::from_coord;
use crate::mesh::TriangleMesh;
use crate::polygon::{assemble_expolygons, ExPolygon};
use crate::tree::AabbTree;

pub use chain::{chain_segments, ChainResult};
pub use gap::close_polygon_gaps;
pub use segment::{
  collect_segments, facet_orientation, triangle_plane, FacetOrientation, SegmentEnd, SliceSegment,
  TrianglePlane, TrianglePlaneKind,
};

/// One slice plane's output.
#[derive(Clone, Debug, Default)]
pub struct Layer {
  pub index: usize,
  /// Plane height in mm.
  pub z: f64,
  pub slices: Vec<ExPolygon>,
}

impl Layer {
  /// Plain-text contour dump (points in mm) for layer debugging.
  pub fn dump_contours(&self) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "layer {} z={:.3}", self.index, self.z);
    for ex in &self.slices {
      let _ = write!(out, "contour:");
      for p in ex.contour.points() {
        let _ = write!(out, " ({:.3}, {:.3})", from_coord(p.x), from_coord(p.y));
      }
      let _ = writeln!(out);
      for hole in &ex.holes {
        let _ = write!(out, "hole:");
        for p in hole.points() {
          let _ = write!(out, " ({:.3}, {:.3})", from_coord(p.x), from_coord(p.y));
        }
        let _ = writeln!(out);
      }
    }
    out
  }
}

/// Counters accumulated over a slicing run.
#[derive(Clone, Copy, Debug, Default)]
pub struct SliceStats {
  pub layer_count: usize,
  /// Triangles returned by the tree's plane queries (pre-refinement).
  pub candidate_triangles: usize,
  pub segments: usize,
  pub polygons: usize,
  /// Open polylines discarded as unprintable.
  pub open_discarded: usize,
  pub gaps_closed: usize,
  /// Wall-clock time of the whole run in microseconds.
  pub slice_time_us: u64,
}

/// Ordered layers plus run statistics.
#[derive(Clone, Debug, Default)]
pub struct SliceResult {
  pub layers: Vec<Layer>,
  pub stats: SliceStats,
}

/// Cooperative cancellation flag, checked between layers.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::Relaxed);
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Relaxed)
  }
}

/// Slice plane heights for a mesh extent: the first layer is
/// `first_layer_height` tall, later layers `layer_height`; every layer is
/// sampled at its mid-height.
pub fn layer_planes(mesh: &TriangleMesh, config: &PrintConfig) -> Vec<f64> {
  let bb = mesh.bounding_box();
  if !bb.is_valid() {
    return Vec::new();
  }
  let min_z = bb.min.z as f64;
  let max_z = bb.max.z as f64;
  let mut planes = Vec::new();
  let mut bottom = min_z;
  let mut height = config.first_layer_height.max(1e-6);
  loop {
    let plane = bottom + height * 0.5;
    if plane >= max_z {
      break;
    }
    planes.push(plane);
    bottom += height;
    height = config.layer_height.max(1e-6);
  }
  planes
}

/// Per-layer tallies folded into [`SliceStats`].
#[derive(Clone, Copy, Debug, Default)]
struct LayerTally {
  candidates: usize,
  segments: usize,
  polygons: usize,
  open_discarded: usize,
  gaps_closed: usize,
}

/// Slice one plane. Pure: shares the mesh and tree read-only.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(z = z)))]
fn slice_layer(
  mesh: &TriangleMesh,
  tree: &AabbTree,
  index: usize,
  z: f64,
  config: &PrintConfig,
) -> (Layer, LayerTally) {
  let candidates = tree.plane_query(z as f32);
  let mut segments: Vec<SliceSegment> = Vec::with_capacity(candidates.len());
  for &t in &candidates {
    segments.extend(triangle_plane(mesh, t, z as f32).segments);
  }

  let chained = chain_segments(&mut segments, &config.gap);
  let tally = LayerTally {
    candidates: candidates.len(),
    segments: segments.len(),
    polygons: chained.polygons.len(),
    open_discarded: chained.open_discarded,
    gaps_closed: chained.gaps_closed,
  };
  let layer = Layer {
    index,
    z,
    slices: assemble_expolygons(chained.polygons),
  };
  (layer, tally)
}

/// Slice the whole mesh sequentially.
///
/// The mesh is taken mutably only to rebuild topology and statistics if
/// they are stale; slicing itself is read-only.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn slice_mesh(mesh: &mut TriangleMesh, config: &PrintConfig) -> SliceResult {
  mesh.prepare();
  let start = Instant::now();
  let mesh = &*mesh;
  let tree = AabbTree::build(mesh);

  let mut result = SliceResult::default();
  for (index, z) in layer_planes(mesh, config).into_iter().enumerate() {
    let (layer, tally) = slice_layer(mesh, &tree, index, z, config);
    fold_tally(&mut result.stats, &tally);
    result.layers.push(layer);
  }
  result.stats.layer_count = result.layers.len();
  result.stats.slice_time_us = start.elapsed().as_micros() as u64;
  result
}

/// Slice with one rayon task per layer.
///
/// Layers are independent; outputs are collected in ascending-z order.
/// When the token fires, layers not yet started are skipped and the result
/// is truncated to the completed prefix.
pub fn slice_mesh_parallel(
  mesh: &mut TriangleMesh,
  config: &PrintConfig,
  cancel: &CancelToken,
) -> SliceResult {
  mesh.prepare();
  slice_prepared(mesh, config, cancel)
}

/// [`slice_mesh_parallel`] over a mesh whose topology and statistics are
/// already prepared, e.g. one shared through an `Arc`.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn slice_prepared(
  mesh: &TriangleMesh,
  config: &PrintConfig,
  cancel: &CancelToken,
) -> SliceResult {
  let start = Instant::now();
  let tree = AabbTree::build(mesh);
  let planes = layer_planes(mesh, config);

  let outcomes: Vec<Option<(Layer, LayerTally)>> = planes
    .par_iter()
    .enumerate()
    .map(|(index, &z)| {
      if cancel.is_cancelled() {
        return None;
      }
      Some(slice_layer(mesh, &tree, index, z, config))
    })
    .collect();

  let mut result = SliceResult::default();
  for outcome in outcomes {
    let Some((layer, tally)) = outcome else {
      break;
    };
    fold_tally(&mut result.stats, &tally);
    result.layers.push(layer);
  }
  result.stats.layer_count = result.layers.len();
  result.stats.slice_time_us = start.elapsed().as_micros() as u64;
  result
}

fn fold_tally(stats: &mut SliceStats, tally: &LayerTally) {
  stats.candidate_triangles += tally.candidates;
  stats.segments += tally.segments;
  stats.polygons += tally.polygons;
  stats.open_discarded += tally.open_discarded;
  stats.gaps_closed += tally.gaps_closed;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
