//! slicer_core - engine-independent 3D-printing slicer geometry.
//!
//! This crate converts a closed triangle mesh into a stack of 2D contour
//! layers and machine tool-paths. The pipeline:
//!
//! - exact scaled-integer planar geometry with robust predicates
//! - an SAH-built AABB tree for sub-linear plane and ray queries
//! - plane-triangle intersection with full degenerate-case handling
//! - three-phase segment chaining into closed polygon contours
//! - polygon booleans and morphological offsetting
//! - perimeter and infill tool-path generation
//!
//! # Example
//!
//! ```ignore
//! use slicer_core::{mesh::primitives, slice_mesh, PrintConfig};
//!
//! let mut mesh = primitives::cuboid(glam::Vec3::ZERO, glam::Vec3::splat(10.0));
//! let result = slice_mesh(&mut mesh, &PrintConfig::default());
//!
//! println!("{} layers, {} segments chained",
//!     result.layers.len(), result.stats.segments);
//! ```

pub mod bounds;
pub mod clip;
pub mod config;
pub mod coord;
pub mod mesh;
pub mod path;
pub mod polygon;
pub mod predicates;
pub mod queue;
pub mod slice;
pub mod tree;

// Re-export commonly used items
pub use bounds::{BoundingBox2, BoundingBox3};
pub use clip::{boolean, offset, BooleanOp, ClipConfig, EndType, JoinType};
pub use config::{GapConfig, InfillConfig, InfillPattern, PrintConfig};
pub use coord::{from_coord, to_coord, Coord, Point2, Point3};
pub use mesh::{MeshError, TriangleMesh};
pub use path::{
  extrusion_rate, GcodeEmitter, Move, MoveKind, Path, PathOrderer, PathSink, PathType,
};
pub use polygon::{assemble_expolygons, ExPolygon, Polygon, Polyline};
pub use queue::{AsyncSlicer, SliceCompletion, SliceRequest, SlicingStage};
pub use slice::{
  close_polygon_gaps, slice_mesh, slice_mesh_parallel, slice_prepared, CancelToken, Layer,
  SliceResult, SliceStats,
};
pub use tree::{AabbTree, RayHit, TreeError, TreeStats};
