//! A lifted-to-propositional STRIPS grounder and heuristic best-first search
//! engine: a fact interner and operator interner underlie a reachability
//! analysis (relational or Datalog back-end), whose output an operator
//! materializer and task assembler turn into a propositional [`task::StripsTask`],
//! which a state space / open list and search driver then solve.

pub mod config;
pub mod demos;
pub mod error;
pub mod facts;
pub mod ground_action;
pub mod heuristics;
pub mod lifted;
pub mod materialize;
pub mod plan;
pub mod reachability;
pub mod relations;
pub mod search;
pub mod task;

use config::{GroundingConfig, SearchConfig};
use lifted::LiftedProblem;
use search::SearchOutcome;
use task::StripsTask;

/// Grounds `problem` into a [`StripsTask`] (C3-C5).
pub fn ground(problem: &LiftedProblem, cfg: &GroundingConfig) -> StripsTask {
    let reach = reachability::compute_reachability(problem, cfg);
    task::assemble(problem, reach, cfg)
}

/// Grounds and searches in one call, the crate's main entry point.
pub fn ground_and_search(problem: &LiftedProblem, grounding: &GroundingConfig, search_cfg: &SearchConfig) -> (SearchOutcome, search::SearchStatistics, StripsTask) {
    let task = ground(problem, grounding);
    let (outcome, stats) = search::search(&task, search_cfg);
    (outcome, stats, task)
}

pub use plan::trivial_plan;
