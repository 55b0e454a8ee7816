//! **beam-pareto** is a multi-objective design search engine for
//! reinforced-concrete beams. Given a span, factored actions, material
//! choices and discrete geometry domains, it searches for the set of
//! Pareto-optimal designs trading off **cost**, **section depth** and
//! **embodied carbon**, all three minimized.
//!
//! Here's a [quick start example](#example) for the impatient.
//!
//! The crate is built around a few abstractions:
//! - **Candidate** - a point of the discrete design space: width, depth,
//!   longitudinal bars and their layering, stirrups, concrete and steel
//!   grades. A [`Codec`] maps candidates to fixed-length **genotypes** of
//!   domain indices and back
//! - **Oracle** - an external code-compliance checker. The engine never
//!   looks inside it, it only consumes a feasibility flag and signed margins
//!   per named check. See [`Oracle`]
//! - **Evaluation** - objectives, feasibility and margins of a candidate,
//!   computed once per distinct candidate and cached for the run
//! - **Optimizer** - drives a search to its end and extracts the final
//!   [`ParetoFront`]. Two are provided: [`Nsga2`] and [`Exhaustive`]
//!
//! # Optimizers
//!
//! [`Nsga2`] runs the usual NSGA-II loop over genotypes:
//!   1. **Select** parents by binary tournament on Pareto rank and crowding
//!      distance
//!   2. **Recombine** pairs of parents with uniform crossover
//!   3. **Mutate** each gene by resetting it to a random domain value
//!   4. **Evaluate** new candidates, in parallel, through the oracle
//!   5. **Survive**: merge parents with offspring, re-rank and truncate back
//!      to the population size, front by front
//!
//! The loop stops after a configured number of generations or earlier, once
//! the spread of the best front stays stable for a while. A run can also be
//! consumed generation by generation with [`Nsga2::generations`], paused and
//! resumed, or cancelled between generations with a [`CancellationToken`].
//!
//! [`Exhaustive`] evaluates the whole design space and returns its first
//! front. Use it for small domains or to cross-check the genetic search.
//! [`search`] picks one of them according to [`EngineConfig::mode`].
//!
//! # Feasibility
//!
//! Infeasible designs always rank behind feasible ones. Among infeasible
//! designs, dominance is decided on violation vectors instead of objectives,
//! so the search is pulled towards feasibility before any feasible design is
//! known. When no feasible design is ever evaluated, the run fails with
//! [`EngineError::EmptyFeasibleSet`] carrying the least infeasible candidates
//! for diagnostics.
//!
//! Whatever goes wrong inside an oracle (an error, a panic or a timeout) is
//! turned into an infeasible evaluation and logged. It never aborts a run.
//!
//! # Determinism
//!
//! All randomness comes from a single generator seeded with
//! [`EngineConfig::seed`] and owned by the run. Evaluations are collected by
//! candidate index whatever the [`Execution`] strategy, so two runs with the
//! same problem, configuration and seed produce identical fronts.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use beam_pareto::prelude::*;
//!
//! # fn main() -> Result<(), EngineError> {
//! let problem = ProblemDefinition::builder()
//!   .span(5000)
//!   .loading(Loading {
//!     moment: 120.0,
//!     shear: 80.0,
//!   })
//!   .materials(Materials {
//!     concrete_grades: vec![25, 30, 40],
//!     steel_grades: vec![415, 500],
//!   })
//!   .geometry(
//!     GeometryBounds::builder()
//!       .width([230, 300])
//!       .depth(DiscreteRange::new(350, 750, 50)?)
//!       .bar_count(DiscreteRange::new(2, 6, 1)?)
//!       .bar_diameter([12, 16, 20, 25])
//!       .stirrup_diameter([8, 10])
//!       .stirrup_spacing(DiscreteRange::new(100, 300, 25)?)
//!       .build(),
//!   )
//!   .cost_rates(
//!     CostRates::builder()
//!       .concrete_per_m3(BTreeMap::from([(25, 5500.0), (30, 6000.0), (40, 7000.0)]))
//!       .steel_per_kg(75.0)
//!       .formwork_per_m2(450.0)
//!       .labor_per_kg(12.0)
//!       .build(),
//!   )
//!   .carbon_rates(
//!     CarbonRates::builder()
//!       .concrete_per_m3(BTreeMap::from([(25, 280.0), (30, 310.0), (40, 390.0)]))
//!       .steel_per_kg(1.9)
//!       .build(),
//!   )
//!   .build();
//!
//! // a simplified limit-state checker, good enough for screening
//! let oracle = ScreeningOracle::new(&problem);
//! let config = EngineConfig::builder()
//!   .population_size(60)
//!   .max_generations(80)
//!   .seed(42)
//!   .build();
//!
//! let report = search(problem, config, oracle)?;
//! for member in &report.front {
//!   let o = member.objectives();
//!   println!("{:>5} mm  {:>9.0}  {:>6.1} kgCO2e", o.depth, o.cost, o.carbon);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Any function or closure of type
//! `Fn(&Candidate, &Loading) -> Result<ComplianceResult, OracleError>` can
//! stand in for [`ScreeningOracle`].
//!
//! [`Codec`]: crate::codec::Codec
//! [`Oracle`]: crate::oracle::Oracle
//! [`ParetoFront`]: crate::front::ParetoFront
//! [`Nsga2`]: crate::optimizer::nsga::Nsga2
//! [`Nsga2::generations`]: crate::optimizer::nsga::Nsga2::generations
//! [`Exhaustive`]: crate::optimizer::exhaustive::Exhaustive
//! [`CancellationToken`]: crate::context::CancellationToken
//! [`search`]: crate::optimizer::search
//! [`EngineConfig::mode`]: crate::config::EngineConfig::mode
//! [`EngineConfig::seed`]: crate::config::EngineConfig::seed
//! [`EngineError::EmptyFeasibleSet`]: crate::error::EngineError::EmptyFeasibleSet
//! [`Execution`]: crate::config::Execution
//! [`ScreeningOracle`]: crate::oracle::screening::ScreeningOracle

pub mod candidate;
pub mod codec;
pub mod config;
pub mod context;
pub mod crowding;
pub mod error;
pub mod evaluation;
pub mod front;
pub mod mutation;
pub mod objectives;
pub mod optimizer;
pub mod oracle;
pub mod population;
pub mod problem;
pub mod recombination;
pub mod score;
pub mod selection;
pub mod sorting;
pub mod stats;
pub mod termination;

pub use candidate::Candidate;
pub use config::{EngineConfig, Execution, SearchMode};
pub use error::{EngineError, ValidationError};
pub use front::{FrontMember, ParetoFront};
pub use optimizer::{search, Optimizer, RunReport};
pub use problem::ProblemDefinition;

/// Everything needed to set up and run a search.
pub mod prelude {
  pub use crate::{
    candidate::Candidate,
    config::{EngineConfig, Execution, SearchMode},
    context::CancellationToken,
    error::{EngineError, ValidationError},
    front::{FrontMember, ParetoFront},
    objectives::Objectives,
    optimizer::{
      exhaustive::Exhaustive,
      nsga::{GenerationSnapshot, Nsga2},
      search,
      Optimizer,
      RunReport,
    },
    oracle::{screening::ScreeningOracle, ComplianceResult, Oracle, OracleError},
    problem::{
      CarbonRates,
      CostRates,
      DiscreteRange,
      DomainSpec,
      GeometryBounds,
      Loading,
      Materials,
      ProblemDefinition,
      SupportCondition,
    },
    stats::{GenerationStats, RunLog, StopReason},
  };
}
