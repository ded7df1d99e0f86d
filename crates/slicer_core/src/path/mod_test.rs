use super::*;
use crate::coord::to_coord;

fn p(x: f64, y: f64) -> Point2 {
  Point2::new(to_coord(x), to_coord(y))
}

fn extrude(start: Point2, end: Point2) -> Move {
  Move {
    kind: MoveKind::Extrude,
    start,
    end,
    speed_mm_s: 50.0,
    extrusion_rate: 0.1,
    z_mm: 0.2,
  }
}

#[test]
fn test_move_length() {
  let m = extrude(p(0.0, 0.0), p(3.0, 4.0));
  assert!((m.length() - 5.0).abs() < 1e-9);
}

#[test]
fn test_path_caches_total_length() {
  let mut path = Path::new(PathType::PerimeterOuter, 3, true);
  assert_eq!(path.total_length(), 0.0);
  path.push(extrude(p(0.0, 0.0), p(10.0, 0.0)));
  path.push(extrude(p(10.0, 0.0), p(10.0, 10.0)));
  assert!((path.total_length() - 20.0).abs() < 1e-9);
  assert_eq!(path.moves().len(), 2);
  assert_eq!(path.layer_index, 3);
  assert!(path.closed);
}

#[test]
fn test_closed_path_endpoints_distinct() {
  // A closed square path: four corners, three explicit moves, implicit
  // closing edge.
  let corners = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
  let mut path = Path::new(PathType::PerimeterOuter, 0, true);
  for w in corners.windows(2) {
    path.push(extrude(w[0], w[1]));
  }
  let first = path.moves().first().unwrap().start;
  let last = path.moves().last().unwrap().end;
  assert_ne!(first, last);
}

#[test]
fn test_extrusion_rate_model() {
  // 0.45 wide, 0.2 high, 0.4 nozzle: rectangle core plus rounded caps.
  let rate = extrusion_rate(0.45, 0.2, 0.4);
  let expected = 0.2 * (0.45 - 0.2) + std::f64::consts::PI * 0.01;
  assert!((rate - expected).abs() < 1e-12);
}

#[test]
fn test_extrusion_rate_floors_width_at_nozzle() {
  // A requested width below the nozzle bore extrudes at bore width.
  assert_eq!(extrusion_rate(0.2, 0.2, 0.4), extrusion_rate(0.4, 0.2, 0.4));
}

#[test]
fn test_extrusion_rate_grows_with_width() {
  assert!(extrusion_rate(0.8, 0.2, 0.4) > extrusion_rate(0.45, 0.2, 0.4));
}

struct CollectingSink(Vec<Path>);

impl PathSink for CollectingSink {
  fn accept(&mut self, path: Path) {
    self.0.push(path);
  }
}

#[test]
fn test_path_sink_contract() {
  let mut sink = CollectingSink(Vec::new());
  let mut path = Path::new(PathType::Skirt, 0, true);
  path.push(extrude(p(0.0, 0.0), p(5.0, 0.0)));
  sink.accept(path);
  assert_eq!(sink.0.len(), 1);
  assert_eq!(sink.0[0].kind, PathType::Skirt);
}
