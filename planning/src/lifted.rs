//! The lifted problem (§3, §6): the in-memory tree an upstream parser would
//! hand to the grounder. [`LiftedProblemBuilder`] plays that parser's
//! semantic-analysis role, raising the two unrecoverable error kinds of §7.

use crate::error::PlanningError;
use smallvec::SmallVec;
use std::collections::HashSet;
use strips_model::symbols::{SymId, SymbolTable};
use strips_model::types::{TypeHierarchy, TypeId};
use strips_utils::Sym;

pub type ArgVec = SmallVec<[Term; 4]>;

/// A schema-parameter slot (by position) or a bound object constant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Term {
    Param(usize),
    Object(SymId),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Atom {
    pub predicate: SymId,
    pub args: ArgVec,
}

impl Atom {
    pub fn new(predicate: SymId, args: impl IntoIterator<Item = Term>) -> Self {
        Atom { predicate, args: args.into_iter().collect() }
    }
}

#[derive(Clone, Debug)]
pub enum Literal {
    Pos(Atom),
    Neg(Atom),
}

impl Literal {
    pub fn atom(&self) -> &Atom {
        match self {
            Literal::Pos(a) | Literal::Neg(a) => a,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Literal::Neg(_))
    }
}

/// A cost term attached to an `increase(total-cost, ...)` effect conjunct.
#[derive(Clone, Debug)]
pub enum CostTerm {
    Const(u32),
    /// Reference to a declared numeric function atom, e.g. `(move-cost x y)`.
    Function(Atom),
}

#[derive(Clone, Debug)]
pub enum EffectLiteral {
    Add(Atom),
    Del(Atom),
    Increase(CostTerm),
    /// `condition` and `effects` obey the same grammar as the schema's own
    /// precondition/effect; nesting another `When` inside `effects` is
    /// rejected by the builder (§3: "no nesting of conditionals").
    When { condition: Vec<Literal>, effects: Vec<EffectLiteral> },
}

#[derive(Clone, Debug)]
pub struct ActionSchema {
    pub name: SymId,
    pub param_types: Vec<TypeId>,
    pub param_names: Vec<Sym>,
    pub precondition: Vec<Literal>,
    pub effect: Vec<EffectLiteral>,
}

#[derive(Clone, Debug)]
pub struct PredicateDecl {
    pub name: SymId,
    pub param_types: Vec<TypeId>,
    pub is_static: bool,
}

/// Distinguished predicate name for equality (§3: "Equality is a distinguished
/// static predicate with a fixed semantics").
pub const EQUALITY_PREDICATE: &str = "=";

#[derive(Clone)]
pub struct LiftedProblem {
    pub symbols: SymbolTable,
    pub predicates: Vec<PredicateDecl>,
    pub object_type: TypeId,
    pub actions: Vec<ActionSchema>,
    pub init: Vec<Atom>,
    pub init_static: Vec<Atom>,
    pub init_functions: Vec<(Atom, i64)>,
    pub goal: Vec<Literal>,
    /// Whether a metric (action-cost function) was declared; if false, every
    /// operator's cost is rewritten to 1 at materialization (§4.4 step 6).
    pub has_metric: bool,
}

impl LiftedProblem {
    pub fn predicate(&self, id: SymId) -> &PredicateDecl {
        self.predicates
            .iter()
            .find(|p| p.name == id)
            .unwrap_or_else(|| panic!("no predicate declared for symbol {id:?}"))
    }

    pub fn is_static(&self, predicate: SymId) -> bool {
        self.symbols.symbol(predicate).as_str() == EQUALITY_PREDICATE || self.predicate(predicate).is_static
    }
}

/// Builds a [`LiftedProblem`] from declarations, performing the validation
/// that in a full pipeline would live in the parser's semantic-analysis pass:
/// unresolved names, arity mismatches (kind 1), disjunctive goals, nested
/// `when`, and negative preconditions over non-static predicates (kind 2).
pub struct LiftedProblemBuilder {
    types: Vec<(Sym, Option<Sym>)>,
    predicates: Vec<(Sym, Vec<Sym>)>,
    objects: Vec<(Sym, Sym)>,
    actions: Vec<RawAction>,
    init: Vec<(Sym, Vec<Sym>)>,
    init_functions: Vec<(Sym, Vec<Sym>, i64)>,
    goal: Vec<(bool, Sym, Vec<Sym>)>,
    has_metric: bool,
}

struct RawAction {
    name: Sym,
    params: Vec<(Sym, Sym)>,
    precondition: Vec<(bool, Sym, Vec<RawTerm>)>,
    effect: Vec<RawEffect>,
}

#[derive(Clone)]
enum RawTerm {
    Var(Sym),
    Obj(Sym),
}

enum RawEffect {
    Pos(Sym, Vec<RawTerm>),
    Neg(Sym, Vec<RawTerm>),
    IncreaseConst(u32),
    IncreaseFunction(Sym, Vec<RawTerm>),
    When(Vec<(bool, Sym, Vec<RawTerm>)>, Vec<RawEffect>),
}

impl Default for LiftedProblemBuilder {
    fn default() -> Self {
        LiftedProblemBuilder {
            types: vec![(Sym::from("object"), None)],
            predicates: Vec::new(),
            objects: Vec::new(),
            actions: Vec::new(),
            init: Vec::new(),
            init_functions: Vec::new(),
            goal: Vec::new(),
            has_metric: false,
        }
    }
}

impl LiftedProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_type(&mut self, name: &str, parent: Option<&str>) -> &mut Self {
        self.types.push((
            Sym::from(name),
            Some(Sym::from(parent.unwrap_or("object"))),
        ));
        self
    }

    pub fn declare_predicate(&mut self, name: &str, param_types: &[&str]) -> &mut Self {
        self.predicates.push((
            Sym::from(name),
            param_types.iter().map(|t| Sym::from(*t)).collect(),
        ));
        self
    }

    pub fn declare_object(&mut self, name: &str, tpe: &str) -> &mut Self {
        self.objects.push((Sym::from(name), Sym::from(tpe)));
        self
    }

    pub fn declare_metric(&mut self) -> &mut Self {
        self.has_metric = true;
        self
    }

    pub fn add_init_atom(&mut self, predicate: &str, args: &[&str]) -> &mut Self {
        self.init.push((Sym::from(predicate), args.iter().map(|a| Sym::from(*a)).collect()));
        self
    }

    pub fn add_init_function(&mut self, predicate: &str, args: &[&str], value: i64) -> &mut Self {
        self.init_functions
            .push((Sym::from(predicate), args.iter().map(|a| Sym::from(*a)).collect(), value));
        self
    }

    pub fn add_goal_atom(&mut self, positive: bool, predicate: &str, args: &[&str]) -> &mut Self {
        self.goal
            .push((positive, Sym::from(predicate), args.iter().map(|a| Sym::from(*a)).collect()));
        self
    }

    pub fn action(&mut self, name: &str) -> ActionBuilder<'_> {
        self.actions.push(RawAction {
            name: Sym::from(name),
            params: Vec::new(),
            precondition: Vec::new(),
            effect: Vec::new(),
        });
        let idx = self.actions.len() - 1;
        ActionBuilder { builder: self, idx }
    }

    pub fn build(&self) -> Result<LiftedProblem, PlanningError> {
        // "predicate" is an implicit root type holding schema/predicate names,
        // distinct from the user's declared object-type hierarchy.
        let mut types_with_predicate = self.types.clone();
        types_with_predicate.push((Sym::from("predicate"), None));
        let type_hierarchy = TypeHierarchy::new(types_with_predicate)
            .map_err(|e| PlanningError::malformed(e.to_string()))?;

        let mut object_syms = Vec::new();
        for (name, tpe) in &self.objects {
            if type_hierarchy.id_of(tpe).is_none() {
                return Err(PlanningError::malformed(format!("undeclared type: {tpe}")));
            }
            object_syms.push((name.clone(), tpe.clone()));
        }
        let mut predicate_syms = Vec::new();
        for (name, _) in &self.predicates {
            predicate_syms.push((name.clone(), Sym::from("predicate")));
        }
        for a in &self.actions {
            predicate_syms.push((a.name.clone(), Sym::from("predicate")));
        }
        predicate_syms.push((Sym::from(EQUALITY_PREDICATE), Sym::from("predicate")));

        let mut all_syms = object_syms;
        all_syms.extend(predicate_syms);
        let symbols = SymbolTable::new(type_hierarchy, all_syms)
            .map_err(|e| PlanningError::malformed(e.to_string()))?;

        let object_type = symbols.types.id_of("object").unwrap();

        let resolve = |name: &Sym| -> Result<SymId, PlanningError> {
            symbols.id(name).ok_or_else(|| PlanningError::malformed(format!("undeclared symbol: {name}")))
        };

        // static-ness: a predicate is static iff no action effect (including
        // conditional branches) mentions it.
        let mut mentioned_in_effect: HashSet<Sym> = HashSet::new();
        for a in &self.actions {
            collect_effect_predicates(&a.effect, &mut mentioned_in_effect);
        }

        let mut predicates = Vec::new();
        for (name, param_types) in &self.predicates {
            let name_id = resolve(name)?;
            let mut types = Vec::new();
            for t in param_types {
                types.push(
                    symbols
                        .types
                        .id_of(t)
                        .ok_or_else(|| PlanningError::malformed(format!("undeclared type: {t}")))?,
                );
            }
            predicates.push(PredicateDecl {
                name: name_id,
                param_types: types,
                is_static: !mentioned_in_effect.contains(name),
            });
        }

        let mut actions = Vec::new();
        for raw in &self.actions {
            let name_id = resolve(&raw.name)?;
            let mut param_types = Vec::new();
            let mut param_names = Vec::new();
            let mut var_index: std::collections::HashMap<Sym, usize> = Default::default();
            for (i, (pname, ptype)) in raw.params.iter().enumerate() {
                let tid = symbols
                    .types
                    .id_of(ptype)
                    .ok_or_else(|| PlanningError::malformed(format!("undeclared type: {ptype}")))?;
                param_types.push(tid);
                param_names.push(pname.clone());
                var_index.insert(pname.clone(), i);
            }

            let resolve_term = |t: &RawTerm| -> Result<Term, PlanningError> {
                match t {
                    RawTerm::Var(v) => var_index
                        .get(v)
                        .map(|i| Term::Param(*i))
                        .ok_or_else(|| PlanningError::malformed(format!("unbound variable: {v}"))),
                    RawTerm::Obj(o) => symbols
                        .id(o)
                        .map(Term::Object)
                        .ok_or_else(|| PlanningError::malformed(format!("undeclared object: {o}"))),
                }
            };

            let mut precondition = Vec::new();
            let mut free_in_precondition: HashSet<usize> = HashSet::new();
            for (positive, pred, args) in &raw.precondition {
                let pred_id = resolve(pred)?;
                let mut arg_terms = ArgVec::new();
                for a in args {
                    let term = resolve_term(a)?;
                    if let Term::Param(i) = term {
                        free_in_precondition.insert(i);
                    }
                    arg_terms.push(term);
                }
                let atom = Atom::new(pred_id, arg_terms);
                if !positive {
                    let is_static = symbols.symbol(pred_id).as_str() == EQUALITY_PREDICATE
                        || !mentioned_in_effect.contains(pred);
                    if !is_static {
                        return Err(PlanningError::unsupported(format!(
                            "negative precondition on non-static predicate: {pred}"
                        )));
                    }
                    precondition.push(Literal::Neg(atom));
                } else {
                    precondition.push(Literal::Pos(atom));
                }
            }

            let effect = build_effects(&raw.effect, &resolve, &resolve_term, &mentioned_in_effect, false)?;
            check_effect_free_vars(&effect, &free_in_precondition)?;

            actions.push(ActionSchema { name: name_id, param_types, param_names, precondition, effect });
        }

        let mut init = Vec::new();
        let mut init_static = Vec::new();
        for (pred, args) in &self.init {
            let pred_id = resolve(pred)?;
            let mut arg_terms = ArgVec::new();
            for a in args {
                arg_terms.push(Term::Object(resolve(a)?));
            }
            let atom = Atom::new(pred_id, arg_terms);
            if mentioned_in_effect.contains(pred) {
                init.push(atom);
            } else {
                init_static.push(atom);
            }
        }

        let mut init_functions = Vec::new();
        for (pred, args, value) in &self.init_functions {
            let pred_id = resolve(pred)?;
            let mut arg_terms = ArgVec::new();
            for a in args {
                arg_terms.push(Term::Object(resolve(a)?));
            }
            init_functions.push((Atom::new(pred_id, arg_terms), *value));
        }

        let mut goal = Vec::new();
        for (positive, pred, args) in &self.goal {
            let pred_id = resolve(pred)?;
            let mut arg_terms = ArgVec::new();
            for a in args {
                arg_terms.push(Term::Object(resolve(a)?));
            }
            let atom = Atom::new(pred_id, arg_terms);
            if !positive {
                let is_static = symbols.symbol(pred_id).as_str() == EQUALITY_PREDICATE
                    || !mentioned_in_effect.contains(pred);
                if !is_static {
                    return Err(PlanningError::unsupported(format!(
                        "negative goal literal on non-static predicate: {pred}"
                    )));
                }
                goal.push(Literal::Neg(atom));
            } else {
                goal.push(Literal::Pos(atom));
            }
        }

        Ok(LiftedProblem {
            symbols,
            predicates,
            object_type,
            actions,
            init,
            init_static,
            init_functions,
            goal,
            has_metric: self.has_metric,
        })
    }
}

fn collect_effect_predicates(effects: &[RawEffect], out: &mut HashSet<Sym>) {
    for e in effects {
        match e {
            RawEffect::Pos(p, _) | RawEffect::Neg(p, _) => {
                out.insert(p.clone());
            }
            RawEffect::IncreaseConst(_) | RawEffect::IncreaseFunction(_, _) => {}
            RawEffect::When(_, inner) => collect_effect_predicates(inner, out),
        }
    }
}

fn build_effects(
    raw: &[RawEffect],
    resolve: &impl Fn(&Sym) -> Result<SymId, PlanningError>,
    resolve_term: &impl Fn(&RawTerm) -> Result<Term, PlanningError>,
    mentioned_in_effect: &HashSet<Sym>,
    nested: bool,
) -> Result<Vec<EffectLiteral>, PlanningError> {
    let mut out = Vec::new();
    for e in raw {
        match e {
            RawEffect::Pos(p, args) => {
                let pred = resolve(p)?;
                let mut terms = ArgVec::new();
                for a in args {
                    terms.push(resolve_term(a)?);
                }
                out.push(EffectLiteral::Add(Atom::new(pred, terms)));
            }
            RawEffect::Neg(p, args) => {
                let pred = resolve(p)?;
                let mut terms = ArgVec::new();
                for a in args {
                    terms.push(resolve_term(a)?);
                }
                out.push(EffectLiteral::Del(Atom::new(pred, terms)));
            }
            RawEffect::IncreaseConst(c) => out.push(EffectLiteral::Increase(CostTerm::Const(*c))),
            RawEffect::IncreaseFunction(p, args) => {
                let pred = resolve(p)?;
                let mut terms = ArgVec::new();
                for a in args {
                    terms.push(resolve_term(a)?);
                }
                out.push(EffectLiteral::Increase(CostTerm::Function(Atom::new(pred, terms))));
            }
            RawEffect::When(cond, inner) => {
                if nested {
                    return Err(PlanningError::unsupported("nested conditional effect"));
                }
                let mut condition = Vec::new();
                for (positive, pred, args) in cond {
                    let pred_id = resolve(pred)?;
                    let mut terms = ArgVec::new();
                    for a in args {
                        terms.push(resolve_term(a)?);
                    }
                    let atom = Atom::new(pred_id, terms);
                    if !positive {
                        let is_static = mentioned_in_effect.get(pred).is_none();
                        if !is_static {
                            return Err(PlanningError::unsupported(format!(
                                "negative condition on non-static predicate: {pred}"
                            )));
                        }
                        condition.push(Literal::Neg(atom));
                    } else {
                        condition.push(Literal::Pos(atom));
                    }
                }
                let effects = build_effects(inner, resolve, resolve_term, mentioned_in_effect, true)?;
                out.push(EffectLiteral::When { condition, effects });
            }
        }
    }
    Ok(out)
}

fn check_effect_free_vars(effects: &[EffectLiteral], bound: &HashSet<usize>) -> Result<(), PlanningError> {
    for e in effects {
        match e {
            EffectLiteral::Add(a) | EffectLiteral::Del(a) => check_atom_free_vars(a, bound)?,
            EffectLiteral::Increase(CostTerm::Function(a)) => check_atom_free_vars(a, bound)?,
            EffectLiteral::Increase(CostTerm::Const(_)) => {}
            EffectLiteral::When { condition, effects } => {
                for c in condition {
                    check_atom_free_vars(c.atom(), bound)?;
                }
                check_effect_free_vars(effects, bound)?;
            }
        }
    }
    Ok(())
}

fn check_atom_free_vars(atom: &Atom, bound: &HashSet<usize>) -> Result<(), PlanningError> {
    for t in &atom.args {
        if let Term::Param(i) = t {
            if !bound.contains(i) {
                return Err(PlanningError::malformed(format!(
                    "effect references parameter #{i} not bound by the precondition"
                )));
            }
        }
    }
    Ok(())
}

pub struct ActionBuilder<'a> {
    builder: &'a mut LiftedProblemBuilder,
    idx: usize,
}

impl<'a> ActionBuilder<'a> {
    fn raw(&mut self) -> &mut RawAction {
        &mut self.builder.actions[self.idx]
    }

    pub fn param(mut self, name: &str, tpe: &str) -> Self {
        self.raw().params.push((Sym::from(name), Sym::from(tpe)));
        self
    }

    pub fn pre(mut self, positive: bool, predicate: &str, args: &[&str]) -> Self {
        let terms = args.iter().map(|a| term_of(&self.builder.actions[self.idx], a)).collect();
        self.raw().precondition.push((positive, Sym::from(predicate), terms));
        self
    }

    pub fn add(mut self, predicate: &str, args: &[&str]) -> Self {
        let terms = args.iter().map(|a| term_of(&self.builder.actions[self.idx], a)).collect();
        self.raw().effect.push(RawEffect::Pos(Sym::from(predicate), terms));
        self
    }

    pub fn del(mut self, predicate: &str, args: &[&str]) -> Self {
        let terms = args.iter().map(|a| term_of(&self.builder.actions[self.idx], a)).collect();
        self.raw().effect.push(RawEffect::Neg(Sym::from(predicate), terms));
        self
    }

    pub fn increase_const(mut self, amount: u32) -> Self {
        self.raw().effect.push(RawEffect::IncreaseConst(amount));
        self
    }

    pub fn increase_function(mut self, predicate: &str, args: &[&str]) -> Self {
        let terms = args.iter().map(|a| term_of(&self.builder.actions[self.idx], a)).collect();
        self.raw().effect.push(RawEffect::IncreaseFunction(Sym::from(predicate), terms));
        self
    }

    /// Adds a conditional effect `when(condition, effects)`, built via the
    /// two provided closures over a scoped sub-builder.
    pub fn when(
        mut self,
        condition: impl FnOnce(&mut WhenConditionBuilder),
        effects: impl FnOnce(&mut WhenEffectBuilder),
    ) -> Self {
        let params: Vec<Sym> = self.builder.actions[self.idx].params.iter().map(|(n, _)| n.clone()).collect();
        let mut cond_builder = WhenConditionBuilder { params: params.clone(), items: Vec::new() };
        condition(&mut cond_builder);
        let mut eff_builder = WhenEffectBuilder { params, items: Vec::new() };
        effects(&mut eff_builder);
        self.raw().effect.push(RawEffect::When(cond_builder.items, eff_builder.items));
        self
    }
}

pub struct WhenConditionBuilder {
    params: Vec<Sym>,
    items: Vec<(bool, Sym, Vec<RawTerm>)>,
}

impl WhenConditionBuilder {
    pub fn atom(&mut self, positive: bool, predicate: &str, args: &[&str]) -> &mut Self {
        let terms = args.iter().map(|a| term_of_params(&self.params, a)).collect();
        self.items.push((positive, Sym::from(predicate), terms));
        self
    }
}

pub struct WhenEffectBuilder {
    params: Vec<Sym>,
    items: Vec<RawEffect>,
}

impl WhenEffectBuilder {
    pub fn add(&mut self, predicate: &str, args: &[&str]) -> &mut Self {
        let terms = args.iter().map(|a| term_of_params(&self.params, a)).collect();
        self.items.push(RawEffect::Pos(Sym::from(predicate), terms));
        self
    }

    pub fn del(&mut self, predicate: &str, args: &[&str]) -> &mut Self {
        let terms = args.iter().map(|a| term_of_params(&self.params, a)).collect();
        self.items.push(RawEffect::Neg(Sym::from(predicate), terms));
        self
    }
}

fn term_of(action: &RawAction, name: &str) -> RawTerm {
    if action.params.iter().any(|(pname, _)| pname.as_str() == name) {
        RawTerm::Var(Sym::from(name))
    } else {
        RawTerm::Obj(Sym::from(name))
    }
}

fn term_of_params(params: &[Sym], name: &str) -> RawTerm {
    if params.iter().any(|p| p.as_str() == name) {
        RawTerm::Var(Sym::from(name))
    } else {
        RawTerm::Obj(Sym::from(name))
    }
}
