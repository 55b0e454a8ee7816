//! Candidate codec: maps fixed-length genotypes to beam designs and back.
//!
//! A genotype is an array of indices, one per [`Gene`], each pointing into
//! that gene's ordered domain. Any genotype whose indices are within their
//! domains decodes to a valid [`Candidate`], so operators that only ever
//! write in-range indices can never produce an out-of-bounds design.

use std::fmt;

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
  candidate::Candidate,
  error::DomainError,
  problem::ProblemDefinition,
};

/// Number of genes in a genotype.
pub const GENE_NUM: usize = 9;

/// Index into a gene's domain.
pub type GeneIndex = usize;

/// A point in index space. Gene order follows [`Gene::ALL`].
pub type Genotype = [GeneIndex; GENE_NUM];

/// Named position in a genotype.
#[derive(
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Debug,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Gene {
  Width,
  Depth,
  BarCount,
  BarDiameter,
  Layers,
  StirrupDiameter,
  StirrupSpacing,
  ConcreteGrade,
  SteelGrade,
}

impl Gene {
  /// All genes in genotype order.
  pub const ALL: [Gene; GENE_NUM] = [
    Gene::Width,
    Gene::Depth,
    Gene::BarCount,
    Gene::BarDiameter,
    Gene::Layers,
    Gene::StirrupDiameter,
    Gene::StirrupSpacing,
    Gene::ConcreteGrade,
    Gene::SteelGrade,
  ];

  /// Position of the gene in a genotype.
  pub const fn position(self) -> usize {
    self as usize
  }

  fn value_of(self, candidate: &Candidate) -> u32 {
    match self {
      Gene::Width => candidate.width,
      Gene::Depth => candidate.depth,
      Gene::BarCount => candidate.bar_count,
      Gene::BarDiameter => candidate.bar_diameter,
      Gene::Layers => candidate.layers,
      Gene::StirrupDiameter => candidate.stirrup_diameter,
      Gene::StirrupSpacing => candidate.stirrup_spacing,
      Gene::ConcreteGrade => candidate.concrete_grade,
      Gene::SteelGrade => candidate.steel_grade,
    }
  }
}

impl fmt::Display for Gene {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Gene::Width => "width",
      Gene::Depth => "depth",
      Gene::BarCount => "bar_count",
      Gene::BarDiameter => "bar_diameter",
      Gene::Layers => "layers",
      Gene::StirrupDiameter => "stirrup_diameter",
      Gene::StirrupSpacing => "stirrup_spacing",
      Gene::ConcreteGrade => "concrete_grade",
      Gene::SteelGrade => "steel_grade",
    };
    f.write_str(name)
  }
}

/// Ordered gene domains of one problem.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Codec {
  domains: [Vec<u32>; GENE_NUM],
}

impl Codec {
  /// Builds the codec from a validated problem definition.
  pub fn new(problem: &ProblemDefinition) -> Self {
    let g = &problem.geometry;
    let m = &problem.materials;
    Self {
      domains: [
        g.width.values(),
        g.depth.values(),
        g.bar_count.values(),
        g.bar_diameter.values(),
        g.layers.values(),
        g.stirrup_diameter.values(),
        g.stirrup_spacing.values(),
        m.concrete_grades.clone(),
        m.steel_grades.clone(),
      ],
    }
  }

  /// Ordered values of a gene.
  pub fn domain(&self, gene: Gene) -> &[u32] {
    &self.domains[gene.position()]
  }

  /// Number of values of each gene, in genotype order.
  pub fn domain_sizes(&self) -> [usize; GENE_NUM] {
    std::array::from_fn(|i| self.domains[i].len())
  }

  /// Number of distinct candidates in the design space, saturating at
  /// `u128::MAX`.
  pub fn cardinality(&self) -> u128 {
    self
      .domains
      .iter()
      .fold(1u128, |acc, d| acc.saturating_mul(d.len() as u128))
  }

  /// Decodes a genotype into its candidate.
  pub fn decode(&self, genotype: &Genotype) -> Result<Candidate, DomainError> {
    let value = |gene: Gene| -> Result<u32, DomainError> {
      let domain = self.domain(gene);
      let index = genotype[gene.position()];
      domain
        .get(index)
        .copied()
        .ok_or(DomainError::GeneOutOfRange {
          gene,
          index,
          len: domain.len(),
        })
    };
    Ok(Candidate {
      width: value(Gene::Width)?,
      depth: value(Gene::Depth)?,
      bar_count: value(Gene::BarCount)?,
      bar_diameter: value(Gene::BarDiameter)?,
      layers: value(Gene::Layers)?,
      stirrup_diameter: value(Gene::StirrupDiameter)?,
      stirrup_spacing: value(Gene::StirrupSpacing)?,
      concrete_grade: value(Gene::ConcreteGrade)?,
      steel_grade: value(Gene::SteelGrade)?,
    })
  }

  /// Encodes a candidate back into its genotype.
  pub fn encode(&self, candidate: &Candidate) -> Result<Genotype, DomainError> {
    let mut genotype = [0; GENE_NUM];
    for gene in Gene::ALL {
      let value = gene.value_of(candidate);
      genotype[gene.position()] = self
        .domain(gene)
        .iter()
        .position(|&v| v == value)
        .ok_or(DomainError::ValueNotInDomain { gene, value })?;
    }
    Ok(genotype)
  }

  /// Draws a uniformly random index for one gene.
  pub fn random_gene<R: Rng>(&self, gene: Gene, rng: &mut R) -> GeneIndex {
    rng.gen_range(0..self.domain(gene).len())
  }

  /// Draws a uniformly random genotype.
  pub fn random_genotype<R: Rng>(&self, rng: &mut R) -> Genotype {
    Gene::ALL.map(|gene| self.random_gene(gene, &mut *rng))
  }

  /// Iterates over every genotype of the design space in lexicographic
  /// index order.
  pub fn genotypes(&self) -> impl Iterator<Item = Genotype> + '_ {
    self
      .domains
      .iter()
      .map(|d| 0..d.len())
      .multi_cartesian_product()
      .map(|indices| {
        let mut genotype = [0; GENE_NUM];
        genotype.copy_from_slice(&indices);
        genotype
      })
  }
}
