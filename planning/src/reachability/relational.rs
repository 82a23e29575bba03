//! §4.3.1: the relational back-end. Repeatedly re-enumerates each schema's
//! conjunctive query against the current relations (a naive, not
//! semi-naive, fixpoint — acceptable since §4.3.1 does not mandate
//! incremental evaluation the way §4.3.2 does for the Datalog back-end).

use super::ReachabilityResult;
use crate::config::GroundingConfig;
use crate::facts::FactInterner;
use crate::ground_action::OperatorArgsInterner;
use crate::lifted::LiftedProblem;
use crate::relations::{effect_add_atoms, enumerate_applicable, ground_args, Relations};
use strips_collections::ref_store::RefMap;
use tracing::debug;

pub fn compute(problem: &LiftedProblem, cfg: &GroundingConfig) -> ReachabilityResult {
    let mut relations = Relations::new();
    let mut interner = FactInterner::new();
    let mut operators = OperatorArgsInterner::new();
    let mut layers: RefMap<_, u32> = RefMap::new();

    for atom in &problem.init_static {
        let args = ground_args(atom, &[]);
        relations.seed_static(atom.predicate, &args);
        interner.intern_static(atom.predicate, &args);
    }
    for atom in &problem.init {
        let args = ground_args(atom, &[]);
        relations.seed_dynamic(atom.predicate, &args);
        let (id, _) = interner.intern_dynamic(atom.predicate, &args);
        layers.insert(id, 0);
    }

    let max_layers = cfg.max_layers.unwrap_or(u32::MAX);
    let max_atoms = cfg.max_atoms.unwrap_or(u32::MAX) as usize;

    let mut capped = false;
    let mut layer: u32 = 0;
    loop {
        if layer >= max_layers {
            capped = true;
            break;
        }
        let mut progressed = false;
        for (schema_idx, schema) in problem.actions.iter().enumerate() {
            for binding in enumerate_applicable(problem, schema, &relations) {
                let (_, is_new) = operators.intern(schema_idx, 0, &binding);
                if is_new {
                    progressed = true;
                }
                for atom in effect_add_atoms(schema) {
                    let args = ground_args(atom, &binding);
                    if relations.insert_dynamic(atom.predicate, &args) {
                        progressed = true;
                        let (id, _) = interner.intern_dynamic(atom.predicate, &args);
                        if !layers.contains(id) {
                            layers.insert(id, layer + 1);
                        }
                    }
                }
            }
        }
        if relations.dynamic_atom_count() >= max_atoms {
            capped = true;
            break;
        }
        layer += 1;
        if !progressed {
            break;
        }
    }

    debug!(layer, atoms = relations.dynamic_atom_count(), operators = operators.len(), capped, "relational reachability fixpoint");

    let reachable = operators.finalize();
    ReachabilityResult { interner, operators, reachable, layers, capped }
}
