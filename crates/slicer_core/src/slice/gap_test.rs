use super::*;
use crate::config::GapConfig;
use crate::coord::to_coord;

fn p(x: f64, y: f64) -> Point2 {
  Point2::new(to_coord(x), to_coord(y))
}

fn chain(points: &[(f64, f64)]) -> Vec<Point2> {
  points.iter().map(|&(x, y)| p(x, y)).collect()
}

#[test]
fn test_close_gaps_merges_collinear_chains() {
  let mut items = vec![
    chain(&[(0.0, 0.0), (5.0, 0.0)]),
    chain(&[(5.5, 0.0), (10.0, 0.0)]),
  ];
  let mut closed = vec![false, false];
  let n = close_gaps(&mut items, &mut closed, &GapConfig::default());
  assert_eq!(n, 1);
  // Donor emptied in place, target holds the merged chain.
  let merged: Vec<&Vec<Point2>> = items.iter().filter(|c| !c.is_empty()).collect();
  assert_eq!(merged.len(), 1);
  assert_eq!(merged[0].len(), 4);
}

#[test]
fn test_close_gaps_respects_distance_limit() {
  let mut items = vec![
    chain(&[(0.0, 0.0), (5.0, 0.0)]),
    chain(&[(7.5, 0.0), (12.0, 0.0)]),
  ];
  let mut closed = vec![false, false];
  let n = close_gaps(&mut items, &mut closed, &GapConfig::default());
  assert_eq!(n, 0);
  assert!(items.iter().all(|c| !c.is_empty()));
}

#[test]
fn test_close_gaps_respects_angle_limit() {
  // The bridge would turn ~63° off the first chain's tangent.
  let mut items = vec![
    chain(&[(0.0, 0.0), (5.0, 0.0)]),
    chain(&[(5.3, -3.0), (5.3, -0.6)]),
  ];
  let mut closed = vec![false, false];
  let n = close_gaps(&mut items, &mut closed, &GapConfig::default());
  assert_eq!(n, 0);
}

#[test]
fn test_close_gaps_picks_best_candidate() {
  // Two partners in range; the nearer, straighter one must win.
  let mut items = vec![
    chain(&[(0.0, 0.0), (5.0, 0.0)]),
    chain(&[(5.2, 0.0), (8.0, 0.0)]),
    chain(&[(6.5, 0.2), (9.0, 0.6)]),
  ];
  let mut closed = vec![false, false, false];
  close_gaps(&mut items, &mut closed, &GapConfig::default());
  // Chain 1 was consumed by chain 0.
  assert!(items[1].is_empty());
  assert_eq!(items[0][..3].to_vec(), chain(&[(0.0, 0.0), (5.0, 0.0), (5.2, 0.0)]));
}

#[test]
fn test_close_gaps_quartered_square_self_closes() {
  // Four corner pieces of a CCW 10 mm square with 0.2 mm gaps mid-edge.
  let mut items = vec![
    chain(&[(0.0, 5.1), (0.0, 0.0), (4.9, 0.0)]),
    chain(&[(5.1, 0.0), (10.0, 0.0), (10.0, 4.9)]),
    chain(&[(10.0, 5.1), (10.0, 10.0), (5.1, 10.0)]),
    chain(&[(4.9, 10.0), (0.0, 10.0), (0.0, 5.1)]),
  ];
  let mut closed = vec![false; 4];
  let n = close_gaps(&mut items, &mut closed, &GapConfig::default());
  // Three merges; the final junction closes the loop in place.
  assert_eq!(n, 3);
  let survivors: Vec<usize> = (0..4).filter(|&i| !items[i].is_empty()).collect();
  assert_eq!(survivors.len(), 1);
  assert!(closed[survivors[0]]);
  // 12 corner points minus the one duplicate at the coincident junction.
  assert_eq!(items[survivors[0]].len(), 11);
}

#[test]
fn test_close_polygon_gaps_repairs_split_ring() {
  // Two open halves of a ring.
  let mut polylines = vec![
    Polyline::from_points(chain(&[(0.0, 0.1), (0.0, 0.0), (10.0, 0.0), (10.0, 0.1)])),
    Polyline::from_points(chain(&[(10.0, 0.4), (10.0, 10.0), (0.0, 10.0), (0.0, 0.4)])),
  ];
  let n = close_polygon_gaps(&mut polylines, &GapConfig::default());
  assert_eq!(n, 1);
  // Source compacted out of the array.
  assert_eq!(polylines.len(), 1);
  assert_eq!(polylines[0].len(), 8);
}

#[test]
fn test_close_polygon_gaps_skips_complete_loops() {
  // A chain whose ends already coincide is a complete loop and stays
  // untouched.
  let mut polylines = vec![
    Polyline::from_points(chain(&[
      (0.0, 0.0),
      (5.0, 0.0),
      (5.0, 5.0),
      (0.0, 5.0),
      (0.0, 0.0),
    ])),
    Polyline::from_points(chain(&[(20.0, 0.0), (25.0, 0.0)])),
  ];
  let n = close_polygon_gaps(&mut polylines, &GapConfig::default());
  assert_eq!(n, 0);
  assert_eq!(polylines.len(), 2);
}

#[test]
fn test_close_gaps_ignores_closed_and_short_chains() {
  let mut items = vec![
    chain(&[(0.0, 0.0), (5.0, 0.0)]),
    chain(&[(5.2, 0.0), (9.0, 0.0)]),
  ];
  let mut closed = vec![true, false];
  let n = close_gaps(&mut items, &mut closed, &GapConfig::default());
  assert_eq!(n, 0);
}
