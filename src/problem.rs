//! Problem definition: the fixed inputs of a design search.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{codec::Gene, error::ValidationError};

/// How the beam is supported. Drives the span/depth serviceability limit.
#[derive(
  Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportCondition {
  #[default]
  SimplySupported,
  Continuous,
  Cantilever,
}

/// Factored design actions.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Loading {
  /// Factored bending moment in kN·m.
  pub moment: f64,
  /// Factored shear force in kN.
  pub shear: f64,
}

/// Evenly stepped values `min, min + step, ..., max`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DiscreteRange {
  pub min: u32,
  pub max: u32,
  pub step: u32,
}

impl DiscreteRange {
  /// Creates a range, checking that it describes at least one value.
  pub fn new(min: u32, max: u32, step: u32) -> Result<Self, ValidationError> {
    let range = Self { min, max, step };
    range.check()?;
    Ok(range)
  }

  fn check(&self) -> Result<(), ValidationError> {
    if self.step == 0 || self.min > self.max {
      return Err(ValidationError::InvalidRange {
        min: self.min,
        max: self.max,
        step: self.step,
      });
    }
    Ok(())
  }

  fn values(&self) -> Vec<u32> {
    (self.min..=self.max).step_by(self.step as usize).collect()
  }
}

/// Values a single gene may take, either as a stepped range or as an
/// explicit standardized list. The list order is the gene order.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainSpec {
  Range(DiscreteRange),
  Values(Vec<u32>),
}

impl DomainSpec {
  /// Expands the domain into its ordered list of values.
  pub fn values(&self) -> Vec<u32> {
    match self {
      Self::Range(range) => range.values(),
      Self::Values(values) => values.clone(),
    }
  }

  fn validate(&self, gene: Gene) -> Result<(), ValidationError> {
    if let Self::Range(range) = self {
      range.check()?;
    }
    let values = self.values();
    if values.is_empty() {
      return Err(ValidationError::EmptyDomain { gene });
    }
    let mut seen = HashSet::with_capacity(values.len());
    for value in values {
      if value == 0 {
        return Err(ValidationError::NonPositiveDomainValue { gene });
      }
      if !seen.insert(value) {
        return Err(ValidationError::DuplicateDomainValue { gene, value });
      }
    }
    Ok(())
  }
}

impl From<DiscreteRange> for DomainSpec {
  fn from(range: DiscreteRange) -> Self {
    Self::Range(range)
  }
}

impl From<Vec<u32>> for DomainSpec {
  fn from(values: Vec<u32>) -> Self {
    Self::Values(values)
  }
}

impl<const N: usize> From<[u32; N]> for DomainSpec {
  fn from(values: [u32; N]) -> Self {
    Self::Values(values.to_vec())
  }
}

/// Material grades offered to the search.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Materials {
  /// Concrete grades by characteristic strength `fck` in MPa.
  pub concrete_grades: Vec<u32>,
  /// Steel grades by yield strength `fy` in MPa.
  pub steel_grades: Vec<u32>,
}

/// Section and reinforcement domains. All lengths in mm.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, TypedBuilder)]
pub struct GeometryBounds {
  #[builder(setter(into))]
  pub width: DomainSpec,
  #[builder(setter(into))]
  pub depth: DomainSpec,
  #[builder(setter(into))]
  pub bar_count: DomainSpec,
  #[builder(setter(into))]
  pub bar_diameter: DomainSpec,
  #[builder(default = DomainSpec::Values(vec![1]), setter(into))]
  #[serde(default = "single_layer")]
  pub layers: DomainSpec,
  #[builder(setter(into))]
  pub stirrup_diameter: DomainSpec,
  #[builder(setter(into))]
  pub stirrup_spacing: DomainSpec,
}

fn single_layer() -> DomainSpec {
  DomainSpec::Values(vec![1])
}

/// Unit costs. Currency is whatever the caller uses consistently.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, TypedBuilder)]
pub struct CostRates {
  /// Cost per m³ of concrete, keyed by `fck`.
  pub concrete_per_m3: BTreeMap<u32, f64>,
  /// Cost per kg of reinforcing steel.
  pub steel_per_kg: f64,
  /// Cost per m² of formwork contact area.
  pub formwork_per_m2: f64,
  /// Labour cost per kg of reinforcement fixed.
  pub labor_per_kg: f64,
  /// Reinforcement ratio above which labour is considered congested.
  #[builder(default = default_congestion_threshold())]
  #[serde(default = "default_congestion_threshold")]
  pub congestion_threshold: f64,
  /// Labour multiplier applied once the threshold is exceeded.
  #[builder(default = default_congestion_multiplier())]
  #[serde(default = "default_congestion_multiplier")]
  pub congestion_multiplier: f64,
}

/// Embodied carbon intensities, in kgCO2e per unit.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, TypedBuilder)]
pub struct CarbonRates {
  /// kgCO2e per m³ of concrete, keyed by `fck`.
  pub concrete_per_m3: BTreeMap<u32, f64>,
  /// kgCO2e per kg of reinforcing steel.
  pub steel_per_kg: f64,
  /// kgCO2e per m² of formwork.
  #[builder(default = 0.0)]
  #[serde(default)]
  pub formwork_per_m2: f64,
}

/// Everything that stays fixed for a run.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, TypedBuilder)]
pub struct ProblemDefinition {
  /// Effective span in mm.
  pub span: u32,
  #[builder(default)]
  #[serde(default)]
  pub support: SupportCondition,
  pub loading: Loading,
  /// Clear cover to the stirrups in mm.
  #[builder(default = 25)]
  #[serde(default = "default_cover")]
  pub clear_cover: u32,
  pub materials: Materials,
  pub geometry: GeometryBounds,
  pub cost_rates: CostRates,
  pub carbon_rates: CarbonRates,
}

fn default_cover() -> u32 {
  25
}

fn default_congestion_threshold() -> f64 {
  0.025
}

fn default_congestion_multiplier() -> f64 {
  1.25
}

impl ProblemDefinition {
  /// Checks the definition for consistency. Domains must be non-empty lists
  /// of unique positive values and every offered grade must be priced.
  pub fn validate(&self) -> Result<(), ValidationError> {
    ValidationError::positive("span", f64::from(self.span))?;
    ValidationError::positive("loading.moment", self.loading.moment)?;
    ValidationError::non_negative("loading.shear", self.loading.shear)?;

    let g = &self.geometry;
    for (gene, domain) in [
      (Gene::Width, &g.width),
      (Gene::Depth, &g.depth),
      (Gene::BarCount, &g.bar_count),
      (Gene::BarDiameter, &g.bar_diameter),
      (Gene::Layers, &g.layers),
      (Gene::StirrupDiameter, &g.stirrup_diameter),
      (Gene::StirrupSpacing, &g.stirrup_spacing),
    ] {
      domain.validate(gene)?;
    }
    if let Some(&layers) = g.layers.values().iter().find(|&&l| l > 2) {
      return Err(ValidationError::UnsupportedLayers { value: layers });
    }
    DomainSpec::Values(self.materials.concrete_grades.clone())
      .validate(Gene::ConcreteGrade)?;
    DomainSpec::Values(self.materials.steel_grades.clone())
      .validate(Gene::SteelGrade)?;

    let cost = &self.cost_rates;
    let carbon = &self.carbon_rates;
    for &grade in &self.materials.concrete_grades {
      let rate = cost
        .concrete_per_m3
        .get(&grade)
        .ok_or(ValidationError::MissingRate { table: "cost", grade })?;
      ValidationError::positive("cost_rates.concrete_per_m3", *rate)?;
      let rate = carbon
        .concrete_per_m3
        .get(&grade)
        .ok_or(ValidationError::MissingRate { table: "carbon", grade })?;
      ValidationError::positive("carbon_rates.concrete_per_m3", *rate)?;
    }
    ValidationError::positive("cost_rates.steel_per_kg", cost.steel_per_kg)?;
    ValidationError::non_negative(
      "cost_rates.formwork_per_m2",
      cost.formwork_per_m2,
    )?;
    ValidationError::non_negative(
      "cost_rates.labor_per_kg",
      cost.labor_per_kg,
    )?;
    ValidationError::positive(
      "cost_rates.congestion_threshold",
      cost.congestion_threshold,
    )?;
    if !(cost.congestion_multiplier >= 1.0
      && cost.congestion_multiplier.is_finite())
    {
      return Err(ValidationError::BelowOne {
        field: "cost_rates.congestion_multiplier",
        value: cost.congestion_multiplier,
      });
    }
    ValidationError::positive(
      "carbon_rates.steel_per_kg",
      carbon.steel_per_kg,
    )?;
    ValidationError::non_negative(
      "carbon_rates.formwork_per_m2",
      carbon.formwork_per_m2,
    )?;
    Ok(())
  }
}
