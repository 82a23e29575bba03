//! Shared plumbing for both reachability back-ends (§4.3): a relation store
//! (dynamic + static per-predicate row sets) and a backtracking join that
//! enumerates a schema's satisfying parameter bindings against the current
//! relations. The two back-ends in [`crate::reachability`] differ only in
//! how they drive the dynamic relations to a fixpoint before taking this
//! routine's output as ground truth.

use crate::lifted::{ActionSchema, Atom, EffectLiteral, LiftedProblem, Literal, Term};
use std::collections::{HashMap, HashSet};
use strips_model::symbols::SymId;

pub type Row = smallvec::SmallVec<[SymId; 4]>;

#[derive(Default)]
pub struct Relations {
    dynamic: HashMap<SymId, HashSet<Row>>,
    static_db: HashMap<SymId, HashSet<Row>>,
}

impl Relations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_static(&mut self, predicate: SymId, args: &[SymId]) {
        self.static_db.entry(predicate).or_default().insert(args.iter().copied().collect());
    }

    pub fn seed_dynamic(&mut self, predicate: SymId, args: &[SymId]) -> bool {
        self.dynamic.entry(predicate).or_default().insert(args.iter().copied().collect())
    }

    /// Inserts a dynamic row, returning `true` if it was not already present
    /// (used by the relational back-end to detect fixpoint progress).
    pub fn insert_dynamic(&mut self, predicate: SymId, args: &[SymId]) -> bool {
        self.seed_dynamic(predicate, args)
    }

    pub fn contains_dynamic(&self, predicate: SymId, args: &[SymId]) -> bool {
        self.dynamic.get(&predicate).map(|rows| rows.contains(args)).unwrap_or(false)
    }

    pub fn contains_static(&self, predicate: SymId, args: &[SymId]) -> bool {
        self.static_db.get(&predicate).map(|rows| rows.contains(args)).unwrap_or(false)
    }

    pub fn rows_dynamic(&self, predicate: SymId) -> impl Iterator<Item = &Row> {
        self.dynamic.get(&predicate).into_iter().flatten()
    }

    pub fn rows_static(&self, predicate: SymId) -> impl Iterator<Item = &Row> {
        self.static_db.get(&predicate).into_iter().flatten()
    }

    pub fn dynamic_atom_count(&self) -> usize {
        self.dynamic.values().map(|rows| rows.len()).sum()
    }
}

/// Binds `term` (a schema parameter reference or object constant) against a
/// partial binding; `None` if the parameter is not yet bound.
fn resolved(term: Term, binding: &[Option<SymId>]) -> Option<SymId> {
    match term {
        Term::Object(o) => Some(o),
        Term::Param(i) => binding[i],
    }
}

fn is_equality(problem: &LiftedProblem, predicate: SymId) -> bool {
    problem.symbols.symbol(predicate).as_str() == crate::lifted::EQUALITY_PREDICATE
}

/// Enumerates every complete parameter binding of `schema` satisfying its
/// precondition against the given relations (and the problem's object
/// universe for parameters left unconstrained by any positive atom).
pub fn enumerate_applicable(problem: &LiftedProblem, schema: &ActionSchema, relations: &Relations) -> Vec<Vec<SymId>> {
    let mut results = Vec::new();
    let mut binding: Vec<Option<SymId>> = vec![None; schema.param_types.len()];
    backtrack(problem, schema, relations, &mut binding, &mut results);
    results
}

fn backtrack(
    problem: &LiftedProblem,
    schema: &ActionSchema,
    relations: &Relations,
    binding: &mut Vec<Option<SymId>>,
    results: &mut Vec<Vec<SymId>>,
) {
    if let Some(i) = binding.iter().position(|b| b.is_none()) {
        // Prefer a positive precondition atom that pins parameter `i` given the
        // current partial binding (a join probe); otherwise fall back to
        // iterating every instance of the parameter's declared type.
        if let Some(atom) = find_pinning_atom(schema, i, binding) {
            let candidates = candidate_rows(problem, atom, relations, binding);
            for row in candidates {
                let saved = binding.clone();
                if bind_row(atom, &row, binding) {
                    backtrack(problem, schema, relations, binding, results);
                }
                *binding = saved;
            }
        } else {
            let tpe = schema.param_types[i];
            for obj in problem.symbols.instances_of_type(tpe) {
                binding[i] = Some(obj);
                backtrack(problem, schema, relations, binding, results);
                binding[i] = None;
            }
        }
        return;
    }

    if satisfies_all(problem, schema, relations, binding) {
        results.push(binding.iter().map(|b| b.unwrap()).collect());
    }
}

fn find_pinning_atom<'a>(schema: &'a ActionSchema, param: usize, binding: &[Option<SymId>]) -> Option<&'a Atom> {
    schema.precondition.iter().find_map(|lit| match lit {
        Literal::Pos(atom) => {
            let mentions = atom.args.iter().any(|t| matches!(t, Term::Param(p) if *p == param));
            let ready = atom.args.iter().all(|t| match t {
                Term::Param(p) => *p == param || binding[*p].is_some(),
                Term::Object(_) => true,
            });
            (mentions && ready).then_some(atom)
        }
        Literal::Neg(_) => None,
    })
}

fn candidate_rows(problem: &LiftedProblem, atom: &Atom, relations: &Relations, binding: &[Option<SymId>]) -> Vec<Row> {
    if is_equality(problem, atom.predicate) {
        // Equality is evaluated directly, never via a stored relation.
        return Vec::new();
    }
    let is_static = problem.is_static(atom.predicate);
    let rows: Vec<&Row> = if is_static {
        relations.rows_static(atom.predicate).collect()
    } else {
        relations.rows_dynamic(atom.predicate).collect()
    };
    rows.into_iter()
        .filter(|row| {
            atom.args.iter().enumerate().all(|(i, t)| match t {
                Term::Object(o) => row[i] == *o,
                Term::Param(p) => binding[*p].map(|b| b == row[i]).unwrap_or(true),
            })
        })
        .cloned()
        .collect()
}

fn bind_row(atom: &Atom, row: &Row, binding: &mut Vec<Option<SymId>>) -> bool {
    for (i, t) in atom.args.iter().enumerate() {
        if let Term::Param(p) = t {
            match binding[*p] {
                Some(existing) if existing != row[i] => return false,
                Some(_) => {}
                None => binding[*p] = Some(row[i]),
            }
        }
    }
    true
}

fn satisfies_all(problem: &LiftedProblem, schema: &ActionSchema, relations: &Relations, binding: &[Option<SymId>]) -> bool {
    for lit in &schema.precondition {
        let atom = lit.atom();
        let args: Vec<SymId> = atom.args.iter().map(|t| resolved(*t, binding).unwrap()).collect();
        let holds = if is_equality(problem, atom.predicate) {
            args.len() == 2 && args[0] == args[1]
        } else if problem.is_static(atom.predicate) {
            relations.contains_static(atom.predicate, &args)
        } else {
            relations.contains_dynamic(atom.predicate, &args)
        };
        let wanted = !lit.is_negative();
        if holds != wanted {
            return false;
        }
    }
    true
}

/// Every positive atom that can be added by `schema`'s effect, including
/// conditional branches — used by the reachability fixpoint, which grows the
/// relations by a ground action's possible positive effects regardless of
/// which conditional branches actually fire (a standard reachability
/// over-approximation; precise per-branch semantics are applied later by C4).
pub fn effect_add_atoms(schema: &ActionSchema) -> Vec<&Atom> {
    let mut out = Vec::new();
    collect_add_atoms(&schema.effect, &mut out);
    out
}

fn collect_add_atoms<'a>(effects: &'a [EffectLiteral], out: &mut Vec<&'a Atom>) {
    for e in effects {
        match e {
            EffectLiteral::Add(a) => out.push(a),
            EffectLiteral::When { effects, .. } => collect_add_atoms(effects, out),
            EffectLiteral::Del(_) | EffectLiteral::Increase(_) => {}
        }
    }
}

/// Ground (possibly partial) a lifted atom against a complete binding,
/// returning its object-id argument tuple.
pub fn ground_args(atom: &Atom, binding: &[SymId]) -> Vec<SymId> {
    atom.args
        .iter()
        .map(|t| match t {
            Term::Object(o) => *o,
            Term::Param(i) => binding[*i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifted::LiftedProblemBuilder;

    fn one_step_problem() -> LiftedProblem {
        let mut b = LiftedProblemBuilder::new();
        b.declare_predicate("at", &["object"]);
        b.declare_object("a", "object");
        b.declare_object("b", "object");
        b.action("move").param("x", "object").param("y", "object").pre(true, "at", &["x"]).add("at", &["y"]).del("at", &["x"]);
        b.add_init_atom("at", &["a"]);
        b.build().unwrap()
    }

    #[test]
    fn single_predicate_join_binds_every_unconstrained_parameter() {
        let problem = one_step_problem();
        let schema = &problem.actions[0];
        let at = problem.symbols.id("at").unwrap();
        let a = problem.symbols.id("a").unwrap();
        let b = problem.symbols.id("b").unwrap();

        let mut relations = Relations::new();
        relations.seed_dynamic(at, &[a]);

        let bindings = enumerate_applicable(&problem, schema, &relations);
        // x is pinned to `a` by the precondition join; y is unconstrained by
        // any positive precondition atom, so it ranges over every object.
        let mut xy: Vec<(SymId, SymId)> = bindings.iter().map(|bnd| (bnd[0], bnd[1])).collect();
        xy.sort();
        assert_eq!(xy, vec![(a, a), (a, b)]);
    }

    #[test]
    fn no_binding_when_precondition_unsatisfied() {
        let problem = one_step_problem();
        let schema = &problem.actions[0];
        let relations = Relations::new();
        assert!(enumerate_applicable(&problem, schema, &relations).is_empty());
    }
}
