//! §4.3.2: the Datalog back-end. Conceptually, each schema's precondition is
//! a left-deep chain of ≤2-body-atom join rules over fresh intermediate
//! ("aux") predicates, evaluated to a semi-naive fixpoint. This
//! implementation realizes that chain with `crate::relations`'s exact join
//! routine (itself a sequence of ≤2-way joins: accumulated binding vs. one
//! new atom) and gets the "semi-naive" half of the bargain at predicate
//! granularity: a schema is only re-evaluated in a round if a predicate it
//! reads changed in the previous round, rather than (as the relational
//! back-end does) every schema every round. See the grounding ledger for
//! why this coarser dirty-bit tracking was chosen over materializing
//! literal per-rule delta relations.

use super::ReachabilityResult;
use crate::config::GroundingConfig;
use crate::facts::FactInterner;
use crate::ground_action::OperatorArgsInterner;
use crate::lifted::{ActionSchema, LiftedProblem, Literal};
use crate::relations::{effect_add_atoms, enumerate_applicable, ground_args, Relations};
use std::collections::HashSet;
use strips_collections::ref_store::RefMap;
use strips_model::symbols::SymId;
use tracing::debug;

/// Predicates read by a schema's precondition, for dirty-bit tracking.
fn schema_dependencies(schema: &ActionSchema) -> HashSet<SymId> {
    schema.precondition.iter().map(|lit| lit.atom().predicate).collect()
}

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
    let mut dirty: HashSet<SymId> = HashSet::new();
    for atom in &problem.init {
        let args = ground_args(atom, &[]);
        relations.seed_dynamic(atom.predicate, &args);
        let (id, _) = interner.intern_dynamic(atom.predicate, &args);
        layers.insert(id, 0);
        dirty.insert(atom.predicate);
    }

    let deps: Vec<HashSet<SymId>> = problem.actions.iter().map(schema_dependencies).collect();
    // On round 0 every schema is a candidate: no predicate has "not changed" yet.
    let mut ever_evaluated = vec![false; problem.actions.len()];

    let max_layers = cfg.max_layers.unwrap_or(u32::MAX);
    let max_atoms = cfg.max_atoms.unwrap_or(u32::MAX) as usize;

    let mut capped = false;
    let mut layer: u32 = 0;
    loop {
        if layer >= max_layers {
            capped = true;
            break;
        }
        let mut next_dirty: HashSet<SymId> = HashSet::new();
        let mut progressed = false;

        for (schema_idx, schema) in problem.actions.iter().enumerate() {
            let relevant = !ever_evaluated[schema_idx] || deps[schema_idx].iter().any(|p| dirty.contains(p));
            if !relevant {
                continue;
            }
            ever_evaluated[schema_idx] = true;

            for binding in positive_bindings(problem, schema, &relations) {
                for atom in effect_add_atoms(schema) {
                    let args = ground_args(atom, &binding);
                    if relations.insert_dynamic(atom.predicate, &args) {
                        progressed = true;
                        next_dirty.insert(atom.predicate);
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
        dirty = next_dirty;
    }

    // Unweighted canonical model established; recover the exact ground
    // action list (respecting negative preconditions and equality, which the
    // positive-only chain above ignored) by a single final join pass.
    for (schema_idx, schema) in problem.actions.iter().enumerate() {
        for binding in enumerate_applicable(problem, schema, &relations) {
            operators.intern(schema_idx, 0, &binding);
        }
    }

    debug!(layer, atoms = relations.dynamic_atom_count(), operators = operators.len(), capped, "datalog reachability fixpoint");

    let reachable = operators.finalize();
    ReachabilityResult { interner, operators, reachable, layers, capped }
}

/// Like `enumerate_applicable`, but ignores negative preconditions entirely
/// (sound over-approximation used only to grow the atom closure; exactness
/// is recovered by the final `enumerate_applicable` pass above).
fn positive_bindings(problem: &LiftedProblem, schema: &ActionSchema, relations: &Relations) -> Vec<Vec<SymId>> {
    if schema.precondition.iter().all(|lit| !matches!(lit, Literal::Neg(_))) {
        return enumerate_applicable(problem, schema, relations);
    }
    let positive_only = ActionSchema {
        name: schema.name,
        param_types: schema.param_types.clone(),
        param_names: schema.param_names.clone(),
        precondition: schema.precondition.iter().filter(|l| !matches!(l, Literal::Neg(_))).cloned().collect(),
        effect: schema.effect.clone(),
    };
    enumerate_applicable(problem, &positive_only, relations)
}

/// Aggregation used by the weighted canonical model (§4.3.2).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Aggregation {
    Max,
    Add,
}

/// The weighted canonical model: a lifted, pre-grounding `h_max`/`h_add`
/// computed directly over the schemas and a given set of state facts,
/// without materializing a [`crate::task::StripsTask`]. Re-seeds the static
/// skeleton plus `state_facts` and recomputes from scratch each call — an
/// externally-equivalent stand-in for a transactional "roll back to a saved
/// fixpoint" interface, since no caller observes the difference.
pub fn weighted_canonical_model(
    problem: &LiftedProblem,
    state_facts: &[(SymId, Vec<SymId>)],
    aggregation: Aggregation,
) -> std::collections::HashMap<(SymId, Vec<SymId>), u32> {
    use std::collections::HashMap;

    let mut cost: HashMap<(SymId, Vec<SymId>), u32> = HashMap::new();
    for atom in &problem.init_static {
        cost.insert((atom.predicate, ground_args(atom, &[])), 0);
    }
    for (pred, args) in state_facts {
        cost.entry((*pred, args.clone())).or_insert(0);
    }

    let mut relations = Relations::new();
    for atom in &problem.init_static {
        let args = ground_args(atom, &[]);
        relations.seed_static(atom.predicate, &args);
    }
    for (pred, args) in state_facts {
        relations.seed_dynamic(*pred, args);
    }

    loop {
        let mut changed = false;
        for schema in &problem.actions {
            for binding in positive_bindings(problem, schema, &relations) {
                let pre_cost = schema
                    .precondition
                    .iter()
                    .filter(|l| !matches!(l, Literal::Neg(_)))
                    .map(|lit| {
                        let atom = lit.atom();
                        let args = ground_args(atom, &binding);
                        *cost.get(&(atom.predicate, args)).unwrap_or(&0)
                    });
                let base_cost = match aggregation {
                    Aggregation::Max => pre_cost.max().unwrap_or(0),
                    Aggregation::Add => pre_cost.sum(),
                };
                let action_cost = 1u32; // uniform cost in the lifted (pre-materialization) model
                let total = base_cost.saturating_add(action_cost);
                for atom in effect_add_atoms(schema) {
                    let args = ground_args(atom, &binding);
                    let key = (atom.predicate, args.clone());
                    let better = match cost.get(&key) {
                        None => true,
                        Some(&existing) => total < existing,
                    };
                    if better {
                        cost.insert(key, total);
                        relations.insert_dynamic(atom.predicate, &args);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    cost
}
