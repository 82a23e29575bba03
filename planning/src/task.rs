//! C5: the STRIPS task assembler. Packages the interners and the materialized
//! operators of C4 into the immutable [`StripsTask`] that the search driver
//! (C7) consumes, applying the canonicalizing fact sort, operator
//! de-duplication, conditional-effect merge, and unsolvability short-circuit
//! of §4.5.

use crate::config::GroundingConfig;
use crate::facts::{DynAtomId, FactInterner, GroundAtomKey, StaticAtomId};
use crate::lifted::LiftedProblem;
use crate::materialize::{self, materialize, GroundOperator};
use crate::reachability::ReachabilityResult;
use crate::relations::ground_args;
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefMap;
use strips_model::symbols::SymId;

create_ref_type!(FactId);
create_ref_type!(OperatorId);

#[derive(Clone, Debug)]
pub struct ConditionalEffect {
    pub condition: Vec<FactId>,
    pub neg_condition: Vec<FactId>,
    pub add: Vec<FactId>,
    pub del: Vec<FactId>,
}

#[derive(Clone, Debug)]
pub struct Operator {
    pub precondition: Vec<FactId>,
    pub add: Vec<FactId>,
    pub del: Vec<FactId>,
    pub cost: u32,
    pub conditional: Vec<ConditionalEffect>,
    pub name: String,
    /// Present iff "keep action args" is configured (§6).
    pub schema_args: Option<(usize, Vec<SymId>)>,
}

impl Operator {
    pub fn is_applicable(&self, state: &[FactId]) -> bool {
        self.precondition.iter().all(|f| state.binary_search(f).is_ok())
    }
}

#[derive(Clone, Debug)]
pub struct StripsTask {
    pub num_facts: usize,
    pub fact_display: Vec<String>,
    /// Sorted ascending.
    pub init: Vec<FactId>,
    /// Sorted ascending; every entry must be present for a state to satisfy the goal.
    pub goal: Vec<FactId>,
    pub operators: Vec<Operator>,
    /// §4.5 step 8: set when grounding proved the goal unreachable. In that
    /// case `facts`/`operators` are empty and `goal` is a single fact absent
    /// from `init`, so every consumer observes the same degenerate task
    /// regardless of how unsolvability was detected.
    pub unsolvable: bool,
    /// Set when `max_layers`/`max_atoms` forced the reachability fixpoint to
    /// stop before reaching true closure (§7: "no silent truncation" — a
    /// capped run is a distinct status from a converged one, not a success).
    pub capped: bool,
}

/// JSON-serializable snapshot of a task, for the `ground` binary's
/// `--dump-task` flag (§6: "for inspection only; the on-wire layout is not
/// part of this spec").
#[derive(serde::Serialize)]
pub struct TaskDump {
    pub num_facts: usize,
    pub fact_display: Vec<String>,
    pub init: Vec<usize>,
    pub goal: Vec<usize>,
    pub unsolvable: bool,
    pub capped: bool,
    pub operators: Vec<OperatorDump>,
}

#[derive(serde::Serialize)]
pub struct OperatorDump {
    pub name: String,
    pub precondition: Vec<usize>,
    pub add: Vec<usize>,
    pub del: Vec<usize>,
    pub cost: u32,
    pub conditional_count: usize,
}

impl StripsTask {
    pub fn dump(&self) -> TaskDump {
        TaskDump {
            num_facts: self.num_facts,
            fact_display: self.fact_display.clone(),
            init: self.init.iter().map(|f| usize::from(*f)).collect(),
            goal: self.goal.iter().map(|f| usize::from(*f)).collect(),
            unsolvable: self.unsolvable,
            capped: self.capped,
            operators: self
                .operators
                .iter()
                .map(|op| OperatorDump {
                    name: op.name.clone(),
                    precondition: op.precondition.iter().map(|f| usize::from(*f)).collect(),
                    add: op.add.iter().map(|f| usize::from(*f)).collect(),
                    del: op.del.iter().map(|f| usize::from(*f)).collect(),
                    cost: op.cost,
                    conditional_count: op.conditional.len(),
                })
                .collect(),
        }
    }

    fn unsolvable_task(capped: bool) -> Self {
        StripsTask { num_facts: 1, fact_display: vec!["(false)".to_string()], init: Vec::new(), goal: vec![FactId::from(0usize)], operators: Vec::new(), unsolvable: true, capped }
    }

    pub fn goal_satisfied(&self, state: &[FactId]) -> bool {
        !self.unsolvable && self.goal.iter().all(|f| state.binary_search(f).is_ok())
    }
}

enum FactOrigin {
    Dynamic(DynAtomId),
    Static(StaticAtomId),
}

fn atom_display(problem: &LiftedProblem, key: &GroundAtomKey) -> String {
    let mut s = String::new();
    s.push('(');
    s.push_str(problem.symbols.symbol(key.predicate).as_str());
    for a in &key.args {
        s.push(' ');
        s.push_str(problem.symbols.symbol(*a).as_str());
    }
    s.push(')');
    s
}

fn is_equality(problem: &LiftedProblem, predicate: SymId) -> bool {
    problem.symbols.symbol(predicate).as_str() == crate::lifted::EQUALITY_PREDICATE
}

/// Assembles the immutable task from a reachability result (§4.5). Consumes
/// `reach` since its interner is mutated (function atoms interned, more
/// static atoms interned) in the course of materialization.
pub fn assemble(problem: &LiftedProblem, reach: ReachabilityResult, cfg: &GroundingConfig) -> StripsTask {
    let ReachabilityResult { mut interner, operators: op_interner, reachable, capped, .. } = reach;

    for (atom, value) in &problem.init_functions {
        let args = ground_args(atom, &[]);
        interner.intern_function(atom.predicate, &args, *value);
    }

    let mut materialized: Vec<GroundOperator> = Vec::new();
    for id in &reachable {
        let key = op_interner.key(*id);
        if let Some(op) = materialize(problem, &mut interner, key.schema, &problem.actions[key.schema], &key.args) {
            materialized.push(op);
        }
    }

    // §4.5 steps 1-2: fact table + canonical (lexicographic display) sort.
    let mut entries: Vec<(FactOrigin, String)> = interner
        .dynamic_atoms()
        .map(|(id, key)| (FactOrigin::Dynamic(id), atom_display(problem, key)))
        .collect();
    if cfg.keep_static_facts {
        entries.extend(interner.static_atoms().map(|(id, key)| (FactOrigin::Static(id), atom_display(problem, key))));
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1));

    let mut dyn_to_fact: RefMap<DynAtomId, FactId> = RefMap::new();
    let mut static_to_fact: RefMap<StaticAtomId, FactId> = RefMap::new();
    let mut fact_display = Vec::with_capacity(entries.len());
    for (i, (origin, display)) in entries.into_iter().enumerate() {
        let fid = FactId::from(i);
        match origin {
            FactOrigin::Dynamic(d) => dyn_to_fact.insert(d, fid),
            FactOrigin::Static(s) => static_to_fact.insert(s, fid),
        }
        fact_display.push(display);
    }
    let num_facts = fact_display.len();

    // §4.5 step 3.
    let mut init: Vec<FactId> = problem
        .init
        .iter()
        .filter_map(|atom| {
            let args = ground_args(atom, &[]);
            let id = interner.lookup_dynamic(atom.predicate, &args)?;
            dyn_to_fact.get(id).copied()
        })
        .collect();
    init.sort();

    // §4.5 step 4.
    let mut unsolvable = false;
    let mut goal: Vec<FactId> = Vec::new();
    for lit in &problem.goal {
        let atom = lit.atom();
        let args = ground_args(atom, &[]);
        let wanted = !lit.is_negative();
        if is_equality(problem, atom.predicate) {
            let holds = args.len() == 2 && args[0] == args[1];
            if holds != wanted {
                unsolvable = true;
            }
            continue;
        }
        if problem.is_static(atom.predicate) {
            let holds = materialize::problem_has_static(problem, atom.predicate, &args);
            if holds != wanted {
                unsolvable = true;
            }
            continue;
        }
        debug_assert!(wanted, "negative goal literal on a dynamic predicate is rejected at build time");
        match interner.lookup_dynamic(atom.predicate, &args).and_then(|d| dyn_to_fact.get(d).copied()) {
            Some(f) => goal.push(f),
            None => unsolvable = true,
        }
    }
    goal.sort();
    goal.dedup();

    if unsolvable {
        return StripsTask::unsolvable_task(capped);
    }

    // §4.5 step 5: translate the materialized operators through the permutation.
    let mut ops: Vec<Operator> = materialized
        .into_iter()
        .map(|m| translate_operator(m, &dyn_to_fact, &static_to_fact, cfg))
        .collect();

    // §4.5 step 7, ahead of the cross-operator dedup that keys on content.
    for op in &mut ops {
        merge_conditionals(&mut op.conditional);
    }

    // §4.5 step 6: sort by content first (name only breaks ties among
    // otherwise-identical operators) so every content-duplicate run is
    // contiguous regardless of how the names happen to interleave, then
    // dedup_by merges each run, keeping its first (smallest-name) member.
    ops.sort_by(|a, b| operator_sort_key(a).cmp(&operator_sort_key(b)));
    ops.dedup_by(|a, b| operator_content_eq(a, b));

    if ops.is_empty() && !goal.is_empty() {
        // No operator can ever be applied and the goal is not already true:
        // §8's boundary case ("zero operators and non-empty goal"), folded
        // into the same degenerate representation as grounding-unsolvable.
        if !goal.iter().all(|f| init.binary_search(f).is_ok()) {
            return StripsTask::unsolvable_task(capped);
        }
    }

    StripsTask { num_facts, fact_display, init, goal, operators: ops, unsolvable: false, capped }
}

fn translate_operator(
    m: GroundOperator,
    dyn_to_fact: &RefMap<DynAtomId, FactId>,
    static_to_fact: &RefMap<StaticAtomId, FactId>,
    cfg: &GroundingConfig,
) -> Operator {
    let mut precondition: Vec<FactId> = m.precondition.iter().map(|d| *dyn_to_fact.get(*d).expect("reachable dynamic precondition atom has a fact id")).collect();
    if cfg.keep_static_facts && !cfg.remove_static_facts_from_preconditions {
        precondition.extend(m.static_precondition.iter().filter_map(|s| static_to_fact.get(*s).copied()));
    }
    precondition.sort();
    precondition.dedup();

    let mut add: Vec<FactId> = m.add.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
    let mut del: Vec<FactId> = m.del.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
    add.sort();
    del.sort();

    let conditional = m
        .conditional
        .iter()
        .map(|c| {
            let mut condition: Vec<FactId> = c.condition.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
            let mut neg_condition: Vec<FactId> = c.neg_condition.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
            let mut cadd: Vec<FactId> = c.add.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
            let mut cdel: Vec<FactId> = c.del.iter().map(|d| *dyn_to_fact.get(*d).unwrap()).collect();
            condition.sort();
            neg_condition.sort();
            cadd.sort();
            cdel.sort();
            ConditionalEffect { condition, neg_condition, add: cadd, del: cdel }
        })
        .collect();

    Operator {
        precondition,
        add,
        del,
        cost: m.cost,
        conditional,
        name: m.name,
        schema_args: cfg.keep_action_args.then(|| (m.schema, m.args)),
    }
}

/// §4.5 step 7: branches with identical condition fact-sets are merged by
/// unioning their add/delete sets (the narrow subsumption case §4.4 calls out
/// — the general contradiction/subsumption lattice is not computed).
fn merge_conditionals(effects: &mut Vec<ConditionalEffect>) {
    let mut merged: Vec<ConditionalEffect> = Vec::with_capacity(effects.len());
    'outer: for eff in effects.drain(..) {
        for existing in &mut merged {
            if existing.condition == eff.condition && existing.neg_condition == eff.neg_condition {
                existing.add.extend(eff.add.iter().copied());
                existing.del.extend(eff.del.iter().copied());
                existing.add.sort();
                existing.add.dedup();
                existing.del.sort();
                existing.del.dedup();
                continue 'outer;
            }
        }
        merged.push(eff);
    }
    *effects = merged;
}

type ConditionalKey = (Vec<FactId>, Vec<FactId>, Vec<FactId>, Vec<FactId>);

/// Content first, name last as a tiebreak only — two operators with identical
/// propositional content must sort adjacent to each other regardless of name,
/// or a third, differently-named, differently-contented operator could sort
/// between them and survive the adjacent-only `dedup_by` below.
fn operator_sort_key(op: &Operator) -> (Vec<FactId>, Vec<FactId>, Vec<FactId>, u32, Vec<ConditionalKey>, String) {
    let mut conditional: Vec<ConditionalKey> = op.conditional.iter().map(conditional_key).collect();
    conditional.sort();
    (op.precondition.clone(), op.add.clone(), op.del.clone(), op.cost, conditional, op.name.clone())
}

fn conditional_key(c: &ConditionalEffect) -> ConditionalKey {
    (c.condition.clone(), c.neg_condition.clone(), c.add.clone(), c.del.clone())
}

fn operator_content_eq(a: &Operator, b: &Operator) -> bool {
    a.precondition == b.precondition
        && a.add == b.add
        && a.del == b.del
        && a.cost == b.cost
        && conditional_multiset_eq(&a.conditional, &b.conditional)
}

fn conditional_multiset_eq(a: &[ConditionalEffect], b: &[ConditionalEffect]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<_> = a.iter().map(conditional_key).collect();
    let mut b: Vec<_> = b.iter().map(conditional_key).collect();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroundingConfig;
    use crate::demos;
    use crate::reachability::compute_reachability;

    fn assemble_demo(name: &str, cfg: &GroundingConfig) -> StripsTask {
        let problem = demos::build(name).unwrap();
        assemble(&problem, compute_reachability(&problem, cfg), cfg)
    }

    #[test]
    fn facts_are_sorted_by_display_string() {
        let task = assemble_demo("one-step", &GroundingConfig::default());
        let mut sorted = task.fact_display.clone();
        sorted.sort();
        assert_eq!(task.fact_display, sorted);
    }

    #[test]
    fn operators_are_deduplicated_by_content_not_name() {
        // `noop`'s parameter is never referenced by its precondition or
        // effect, so every object yields a distinct name ("(noop a)",
        // "(noop b)", ...) for the exact same propositional operator.
        let mut b = crate::lifted::LiftedProblemBuilder::new();
        b.declare_predicate("done", &[]);
        b.declare_object("a", "object");
        b.declare_object("b", "object");
        b.declare_object("c", "object");
        b.action("noop").param("x", "object").add("done", &[]);
        b.add_goal_atom(true, "done", &[]);
        let problem = b.build().unwrap();
        let cfg = GroundingConfig::default();
        let task = assemble(&problem, compute_reachability(&problem, &cfg), &cfg);

        assert_eq!(task.operators.len(), 1, "three content-identical groundings must collapse to one operator");
    }

    #[test]
    fn operators_with_interleaved_names_still_dedup_by_content() {
        // "A" and "B" ground to content-identical operators while "AB" sorts
        // between them by name ("(A)" < "(AB)" < "(B)"); a name-primary sort
        // would leave "A" and "B" non-adjacent and `dedup_by` would never see
        // them as consecutive, so only a content-primary sort merges them.
        let mut b = crate::lifted::LiftedProblemBuilder::new();
        b.declare_predicate("done", &[]);
        b.declare_predicate("extra", &[]);
        b.action("A").add("done", &[]);
        b.action("AB").add("extra", &[]);
        b.action("B").add("done", &[]);
        b.add_goal_atom(true, "done", &[]);
        let problem = b.build().unwrap();
        let cfg = GroundingConfig::default();
        let task = assemble(&problem, compute_reachability(&problem, &cfg), &cfg);

        assert_eq!(task.operators.len(), 2, "A and B are content-identical and must merge; AB is distinct");
    }

    #[test]
    fn unsolvable_task_has_the_canonical_degenerate_shape() {
        let task = assemble_demo("unsolvable-grounding", &GroundingConfig::default());
        assert!(task.unsolvable);
        assert_eq!(task.num_facts, 1);
        assert!(task.operators.is_empty());
        assert!(task.init.is_empty());
        assert_eq!(task.goal.len(), 1);
        assert!(!task.goal_satisfied(&task.init));
    }

    #[test]
    fn keep_static_facts_grows_the_fact_table_without_changing_solvability() {
        let without = assemble_demo("choice-with-cost", &GroundingConfig::default());
        let with_static = assemble_demo("choice-with-cost", &GroundingConfig { keep_static_facts: true, ..GroundingConfig::default() });
        assert!(with_static.num_facts >= without.num_facts);
        assert_eq!(with_static.unsolvable, without.unsolvable);
    }
}
