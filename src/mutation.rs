//! Mutation of genotypes.

use rand::Rng;

use crate::codec::{Codec, Gene, Genotype};

/// Resets each gene to a uniformly drawn index of its domain with
/// probability `p_m`, independently per gene.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ResetMutation {
  probability: f64,
}

impl ResetMutation {
  /// # Panics
  ///
  /// Panics if `probability` is outside `[0, 1]`.
  pub fn new(probability: f64) -> Self {
    assert!(
      (0.0..=1.0).contains(&probability),
      "mutation probability must be within [0, 1]"
    );
    Self { probability }
  }

  /// Mutates `genotype` in place. Every written index is within its gene's
  /// domain.
  pub fn mutate<R: Rng>(
    &self,
    genotype: &mut Genotype,
    codec: &Codec,
    rng: &mut R,
  ) {
    for gene in Gene::ALL {
      if rng.gen_bool(self.probability) {
        genotype[gene.position()] = codec.random_gene(gene, rng);
      }
    }
  }
}
