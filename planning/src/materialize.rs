//! C4: the operator materializer. Turns a reachable `(schema, args)` ground
//! action into a propositional operator over interned fact ids.

use crate::facts::{DynAtomId, FactInterner, StaticAtomId};
use crate::lifted::{ActionSchema, CostTerm, EffectLiteral, LiftedProblem, Literal};
use crate::relations::ground_args;
use strips_model::symbols::SymId;

#[derive(Clone, Debug)]
pub struct ConditionalEffect {
    pub condition: Vec<DynAtomId>,
    pub neg_condition: Vec<DynAtomId>,
    pub add: Vec<DynAtomId>,
    pub del: Vec<DynAtomId>,
}

#[derive(Clone, Debug)]
pub struct GroundOperator {
    pub schema: usize,
    pub args: Vec<SymId>,
    pub precondition: Vec<DynAtomId>,
    /// Static precondition atoms, kept only for `remove_static_facts_from_preconditions = false`.
    pub static_precondition: Vec<StaticAtomId>,
    pub add: Vec<DynAtomId>,
    pub del: Vec<DynAtomId>,
    pub cost: u32,
    pub conditional: Vec<ConditionalEffect>,
    pub name: String,
}

/// Walks the precondition and effect of a reachable `(schema, args)` ground
/// action, producing its propositional operator, or `None` if a static
/// precondition is violated or it turns out to have no effect at all (§4.4
/// steps 1 and 3).
pub fn materialize(
    problem: &LiftedProblem,
    interner: &mut FactInterner,
    schema_idx: usize,
    schema: &ActionSchema,
    args: &[SymId],
) -> Option<GroundOperator> {
    let mut precondition = Vec::new();
    let mut static_precondition = Vec::new();

    for lit in &schema.precondition {
        let atom = lit.atom();
        let ground = ground_args(atom, args);
        if problem.symbols.symbol(atom.predicate).as_str() == crate::lifted::EQUALITY_PREDICATE {
            let holds = ground.len() == 2 && ground[0] == ground[1];
            if holds != !lit.is_negative() {
                return None;
            }
            continue;
        }
        if problem.is_static(atom.predicate) {
            let holds = problem_has_static(problem, atom.predicate, &ground);
            if lit.is_negative() {
                if holds {
                    return None;
                }
            } else {
                if !holds {
                    return None;
                }
                let (id, _) = interner.intern_static(atom.predicate, &ground);
                static_precondition.push(id);
            }
        } else {
            debug_assert!(!lit.is_negative(), "non-static negative preconditions are rejected at build time");
            let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
            precondition.push(id);
        }
    }

    let mut add = Vec::new();
    let mut del = Vec::new();
    let mut cost: u32 = 0;
    let mut conditional = Vec::new();

    for eff in &schema.effect {
        match eff {
            EffectLiteral::Add(atom) => {
                let ground = ground_args(atom, args);
                let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
                add.push(id);
            }
            EffectLiteral::Del(atom) => {
                let ground = ground_args(atom, args);
                let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
                del.push(id);
            }
            EffectLiteral::Increase(term) => {
                cost = cost.saturating_add(cost_of(problem, interner, term, args));
            }
            EffectLiteral::When { condition, effects } => {
                conditional.push(materialize_conditional(problem, interner, condition, effects, args));
            }
        }
    }

    if add.is_empty() && del.is_empty() && conditional.iter().all(|c| c.add.is_empty() && c.del.is_empty()) {
        return None;
    }

    // normalize: delete only what's required to be true, and keep add/del disjoint.
    del.retain(|f| precondition.contains(f));
    add.retain(|f| !del.contains(f));

    if !problem.has_metric {
        cost = 1;
    }

    Some(GroundOperator {
        schema: schema_idx,
        args: args.to_vec(),
        precondition,
        static_precondition,
        add,
        del,
        cost,
        conditional,
        name: display_name(problem, schema, args),
    })
}

fn materialize_conditional(
    problem: &LiftedProblem,
    interner: &mut FactInterner,
    condition: &[Literal],
    effects: &[EffectLiteral],
    args: &[SymId],
) -> ConditionalEffect {
    let mut cond = Vec::new();
    let mut neg_cond = Vec::new();
    for lit in condition {
        let atom = lit.atom();
        let ground = ground_args(atom, args);
        let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
        if lit.is_negative() {
            neg_cond.push(id);
        } else {
            cond.push(id);
        }
    }
    let mut add = Vec::new();
    let mut del = Vec::new();
    for eff in effects {
        match eff {
            EffectLiteral::Add(atom) => {
                let ground = ground_args(atom, args);
                let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
                add.push(id);
            }
            EffectLiteral::Del(atom) => {
                let ground = ground_args(atom, args);
                let (id, _) = interner.intern_dynamic(atom.predicate, &ground);
                del.push(id);
            }
            EffectLiteral::Increase(_) => {}
            EffectLiteral::When { .. } => unreachable!("nested when rejected at build time"),
        }
    }
    del.retain(|f| cond.contains(f));
    add.retain(|f| !del.contains(f));
    ConditionalEffect { condition: cond, neg_condition: neg_cond, add, del }
}

fn cost_of(problem: &LiftedProblem, interner: &mut FactInterner, term: &CostTerm, args: &[SymId]) -> u32 {
    match term {
        CostTerm::Const(c) => *c,
        CostTerm::Function(atom) => {
            let ground = ground_args(atom, args);
            match interner.lookup_function(atom.predicate, &ground) {
                Some(id) => interner.function_value(id).max(0) as u32,
                None => {
                    tracing::warn!(
                        predicate = %problem.symbols.symbol(atom.predicate),
                        "cost function atom has no declared value, falling back to 0"
                    );
                    0
                }
            }
        }
    }
}

/// `init_static` atoms are always fully ground (built only from object
/// constants, never schema parameters), so a direct argument comparison
/// suffices without going through the parameter-substituting `ground_args`.
pub(crate) fn problem_has_static(problem: &LiftedProblem, predicate: SymId, args: &[SymId]) -> bool {
    problem.init_static.iter().any(|atom| {
        atom.predicate == predicate
            && atom.args.len() == args.len()
            && atom.args.iter().zip(args).all(|(t, a)| matches!(t, crate::lifted::Term::Object(o) if o == a))
    })
}

fn display_name(problem: &LiftedProblem, schema: &ActionSchema, args: &[SymId]) -> String {
    let mut s = String::new();
    s.push('(');
    s.push_str(problem.symbols.symbol(schema.name).as_str());
    for a in args {
        s.push(' ');
        s.push_str(problem.symbols.symbol(*a).as_str());
    }
    s.push(')');
    s
}
