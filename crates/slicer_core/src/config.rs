//! Print settings consumed by the slicing pipeline.
//!
//! Plain cloneable structs with documented defaults; parsing any on-disk
//! format is a collaborator concern.

use crate::clip::ClipConfig;

/// Infill pattern selector.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InfillPattern {
  /// Parallel lines, direction alternating 90° between layers.
  #[default]
  Rectilinear,
  /// Two rectilinear families 90° apart on every layer.
  Grid,
  /// Three rectilinear families 60° apart.
  Honeycomb,
}

/// Infill generation settings.
#[derive(Clone, Debug)]
pub struct InfillConfig {
  /// Fill density in [0, 1]; 0 disables infill, 1 is solid.
  pub density: f64,
  pub pattern: InfillPattern,
  /// Width of one infill line in mm.
  pub line_width: f64,
  /// Base pattern angle in degrees.
  pub angle_deg: f64,
  /// Print speed for infill moves, mm/s.
  pub speed_mm_s: f64,
}

impl Default for InfillConfig {
  fn default() -> Self {
    Self {
      density: 0.2,
      pattern: InfillPattern::default(),
      line_width: 0.4,
      angle_deg: 45.0,
      speed_mm_s: 60.0,
    }
  }
}

/// Gap-closing limits shared by chaining phase 3 and the polygon repair
/// pass.
#[derive(Clone, Debug)]
pub struct GapConfig {
  /// Largest endpoint gap that may be bridged, mm.
  pub max_gap_mm: f64,
  /// Largest tangent deviation accepted for a bridge, degrees.
  pub max_angle_deg: f64,
}

impl Default for GapConfig {
  fn default() -> Self {
    Self {
      max_gap_mm: 2.0,
      max_angle_deg: 45.0,
    }
  }
}

/// Complete print configuration.
#[derive(Clone, Debug)]
pub struct PrintConfig {
  /// Layer height for all layers after the first, mm.
  pub layer_height: f64,
  /// Height of the first layer, mm.
  pub first_layer_height: f64,

  /// Nozzle bore diameter, mm.
  pub nozzle_diameter: f64,
  /// Default extrusion width, mm.
  pub extrusion_width: f64,

  /// Number of concentric walls per contour.
  pub wall_count: usize,
  /// Centreline spacing between adjacent walls, mm.
  pub wall_thickness: f64,

  /// Non-printing move speed, mm/s.
  pub travel_speed_mm_s: f64,
  /// Outermost wall speed, mm/s; slower for surface finish.
  pub outer_wall_speed_mm_s: f64,
  /// Inner wall speed, mm/s.
  pub inner_wall_speed_mm_s: f64,

  pub infill: InfillConfig,
  pub gap: GapConfig,
  pub clip: ClipConfig,
}

impl Default for PrintConfig {
  fn default() -> Self {
    Self {
      layer_height: 0.2,
      first_layer_height: 0.3,
      nozzle_diameter: 0.4,
      extrusion_width: 0.45,
      wall_count: 2,
      wall_thickness: 0.45,
      travel_speed_mm_s: 150.0,
      outer_wall_speed_mm_s: 25.0,
      inner_wall_speed_mm_s: 50.0,
      infill: InfillConfig::default(),
      gap: GapConfig::default(),
      clip: ClipConfig::default(),
    }
  }
}

impl PrintConfig {
  /// Clamped infill density.
  pub fn infill_density(&self) -> f64 {
    self.infill.density.clamp(0.0, 1.0)
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
