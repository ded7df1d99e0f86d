use super::*;

#[test]
fn test_defaults_match_documented_values() {
  let cfg = PrintConfig::default();
  assert_eq!(cfg.layer_height, 0.2);
  assert_eq!(cfg.first_layer_height, 0.3);
  assert_eq!(cfg.wall_count, 2);
  assert_eq!(cfg.gap.max_gap_mm, 2.0);
  assert_eq!(cfg.gap.max_angle_deg, 45.0);
  assert_eq!(cfg.clip.safety_offset_mm, 1e-5);
  assert_eq!(cfg.clip.miter_limit, 3.0);
  assert_eq!(cfg.clip.decimation_factor, 0.005);
  assert_eq!(cfg.infill.pattern, InfillPattern::Rectilinear);
}

#[test]
fn test_infill_density_clamped() {
  let mut cfg = PrintConfig::default();
  cfg.infill.density = 1.5;
  assert_eq!(cfg.infill_density(), 1.0);
  cfg.infill.density = -0.25;
  assert_eq!(cfg.infill_density(), 0.0);
  cfg.infill.density = 0.2;
  assert_eq!(cfg.infill_density(), 0.2);
}
