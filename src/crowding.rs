//! Crowding distance within a front.

use crate::{score::Scores, sorting::Ranking};

/// Crowding distance of a member. Larger is less crowded.
pub type CrowdingDistance = f64;

/// Computes the crowding distance of every point of one front, in point
/// order. Boundary points of each objective get `INFINITY`; an objective
/// with zero range contributes nothing.
pub fn crowding_distances<const N: usize>(
  points: &[Scores<N>],
) -> Vec<CrowdingDistance> {
  let len = points.len();
  if len <= 2 {
    return vec![CrowdingDistance::INFINITY; len];
  }
  let mut distances = vec![0.0; len];
  let mut order: Vec<usize> = (0..len).collect();
  for o_idx in 0..N {
    order.sort_by(|&a, &b| {
      points[a][o_idx]
        .total_cmp(&points[b][o_idx])
        .then(a.cmp(&b))
    });
    let min = points[order[0]][o_idx];
    let max = points[order[len - 1]][o_idx];
    let range = max - min;
    if !(range > 0.0 && range.is_finite()) {
      continue;
    }
    distances[order[0]] = CrowdingDistance::INFINITY;
    distances[order[len - 1]] = CrowdingDistance::INFINITY;
    for w in order.windows(3) {
      let (prev, idx, next) = (w[0], w[1], w[2]);
      distances[idx] += (points[next][o_idx] - points[prev][o_idx]) / range;
    }
  }
  distances
}

/// Crowding distances of all items of a ranking, each computed within its
/// own front, in item order.
pub fn distances_by_front<const N: usize>(
  ranking: &Ranking,
  scores: &[Scores<N>],
) -> Vec<CrowdingDistance> {
  let mut distances = vec![0.0; scores.len()];
  for front in ranking.fronts() {
    let points: Vec<_> = front.iter().map(|&idx| scores[idx]).collect();
    for (&idx, distance) in front.iter().zip(crowding_distances(&points)) {
      distances[idx] = distance;
    }
  }
  distances
}
