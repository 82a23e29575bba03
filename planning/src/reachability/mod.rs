//! C3: the reachability engine. Two interchangeable back-ends, dispatched on
//! [`crate::config::Backend`]; both return a [`ReachabilityResult`] built on
//! the same shared join/enumeration routine (`crate::relations`).

pub mod datalog;
pub mod relational;

use crate::config::{Backend, GroundingConfig};
use crate::facts::{DynAtomId, FactInterner};
use crate::ground_action::{GroundActionId, OperatorArgsInterner};
use crate::lifted::LiftedProblem;
use strips_collections::ref_store::RefMap;

pub struct ReachabilityResult {
    pub interner: FactInterner,
    pub operators: OperatorArgsInterner,
    pub reachable: Vec<GroundActionId>,
    /// First iteration at which each dynamic atom was derived, present only
    /// when a layer/atom cap forced early termination tracking (both
    /// back-ends populate it unconditionally here, since it's cheap).
    pub layers: RefMap<DynAtomId, u32>,
    /// Set when `max_layers`/`max_atoms` forced the fixpoint to stop before
    /// reaching true closure (§7: "no silent truncation").
    pub capped: bool,
}

pub fn compute_reachability(problem: &LiftedProblem, cfg: &GroundingConfig) -> ReachabilityResult {
    match cfg.backend {
        Backend::Relational => relational::compute(problem, cfg),
        Backend::Datalog => datalog::compute(problem, cfg),
    }
}
