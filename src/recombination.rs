//! Recombination of parent genotypes.

use rand::Rng;

use crate::codec::Genotype;

/// Uniform crossover applied with probability `p_c` per pair of parents.
///
/// A recombined pair swaps each gene independently with probability 0.5.
/// Genes move as whole domain indices, so children always decode.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct UniformCrossover {
  probability: f64,
}

impl UniformCrossover {
  /// # Panics
  ///
  /// Panics if `probability` is outside `[0, 1]`.
  pub fn new(probability: f64) -> Self {
    assert!(
      (0.0..=1.0).contains(&probability),
      "crossover probability must be within [0, 1]"
    );
    Self { probability }
  }

  /// Produces two children. Unrecombined children are copies of their
  /// parents.
  pub fn recombine<R: Rng>(
    &self,
    a: &Genotype,
    b: &Genotype,
    rng: &mut R,
  ) -> [Genotype; 2] {
    let (mut x, mut y) = (*a, *b);
    if rng.gen_bool(self.probability) {
      for (gx, gy) in x.iter_mut().zip(y.iter_mut()) {
        if rng.gen_bool(0.5) {
          std::mem::swap(gx, gy);
        }
      }
    }
    [x, y]
  }
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;

  const A: Genotype = [0; 9];
  const B: Genotype = [1; 9];

  #[test]
  fn test_children_take_genes_from_parents() {
    let crossover = UniformCrossover::new(1.0);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
      let [x, y] = crossover.recombine(&A, &B, &mut rng);
      for i in 0..9 {
        // every gene goes to exactly one child
        assert_eq!(x[i] + y[i], 1);
      }
    }
  }

  #[test]
  fn test_recombination_mixes_genes() {
    let crossover = UniformCrossover::new(1.0);
    let mut rng = StdRng::seed_from_u64(3);
    let mixed = (0..50)
      .map(|_| crossover.recombine(&A, &B, &mut rng))
      .filter(|[x, _]| x != &A && x != &B)
      .count();
    assert!(mixed > 40);
  }

  #[test]
  fn test_zero_probability_clones() {
    let crossover = UniformCrossover::new(0.0);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
      assert_eq!(crossover.recombine(&A, &B, &mut rng), [A, B]);
    }
  }

  #[test]
  #[should_panic]
  fn test_invalid_probability() {
    UniformCrossover::new(1.5);
  }
}
