//! Built-in demo problems standing in for a PDDL surface parser (§1, §6):
//! each is one of §8's six end-to-end scenarios, constructed directly via
//! [`LiftedProblemBuilder`].

use crate::lifted::{LiftedProblem, LiftedProblemBuilder};

pub const NAMES: &[&str] = &["trivial", "one-step", "choice-with-cost", "unsolvable-grounding", "unsolvable-search", "conditional-effect"];

pub fn build(name: &str) -> Option<LiftedProblem> {
    let problem = match name {
        "trivial" => trivial(),
        "one-step" => one_step(),
        "choice-with-cost" => choice_with_cost(),
        "unsolvable-grounding" => unsolvable_grounding(),
        "unsolvable-search" => unsolvable_search(),
        "conditional-effect" => conditional_effect(),
        _ => return None,
    };
    Some(problem.build().expect("built-in demo problems are always well-formed"))
}

fn trivial() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_predicate("p", &["object"]);
    b.declare_object("a", "object");
    b.add_init_atom("p", &["a"]);
    b.add_goal_atom(true, "p", &["a"]);
    b
}

fn one_step() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_predicate("at", &["object"]);
    b.declare_object("a", "object");
    b.declare_object("b", "object");
    b.action("move").param("x", "object").param("y", "object").pre(true, "at", &["x"]).add("at", &["y"]).del("at", &["x"]);
    b.add_init_atom("at", &["a"]);
    b.add_goal_atom(true, "at", &["b"]);
    b
}

fn choice_with_cost() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_predicate("at", &["object"]);
    b.declare_object("a", "object");
    b.declare_object("b", "object");
    b.declare_object("c", "object");
    b.declare_metric();
    b.action("move").param("x", "object").param("y", "object").pre(true, "at", &["x"]).add("at", &["y"]).del("at", &["x"]).increase_const(1);
    b.add_init_atom("at", &["a"]);
    b.add_goal_atom(true, "at", &["b"]);
    b
}

fn unsolvable_grounding() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_type("widget", None);
    b.declare_predicate("p", &["widget"]);
    b.declare_object("c", "widget");
    // no action ever asserts p, and init never asserts p(c): goal unreachable.
    b.add_goal_atom(true, "p", &["c"]);
    b
}

/// `key(k)` and `at(b)` are each individually reachable under the grounder's
/// monotone (delete-relaxed) atom accumulation — `key(k)` is in `init`,
/// `at(b)` is added by `use` — so assembly does not short-circuit this task.
/// But `use` *consumes* `key(k)` to produce `at(b)`, and no action ever
/// restores it, so the goal's two conjuncts are never jointly true in any
/// real state. The relaxed planning-graph heuristic (§4.8) still reports the
/// goal as reachable from the initial state (delete-relaxation never removes
/// `key(k)`, so it optimistically counts both facts as live), but once the
/// single real step actually consumes the key, the same heuristic evaluated
/// from the successor state correctly finds `key(k)` permanently unreachable
/// and reports a dead end — so the search exhausts after exactly one
/// expansion (the initial state) rather than needing to enumerate further.
fn unsolvable_search() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_predicate("key", &["object"]);
    b.declare_predicate("at", &["object"]);
    b.declare_object("k", "object");
    b.declare_object("b", "object");
    b.action("use").pre(true, "key", &["k"]).add("at", &["b"]).del("key", &["k"]);
    b.add_init_atom("key", &["k"]);
    b.add_goal_atom(true, "at", &["b"]);
    b.add_goal_atom(true, "key", &["k"]);
    b
}

fn conditional_effect() -> LiftedProblemBuilder {
    let mut b = LiftedProblemBuilder::new();
    b.declare_predicate("painted", &["object"]);
    b.declare_predicate("wet", &["object"]);
    b.declare_object("o", "object");
    b.action("paint").param("x", "object").add("painted", &["x"]).when(
        |c| {
            c.atom(true, "wet", &["x"]);
        },
        |e| {
            e.del("wet", &["x"]);
        },
    );
    b.add_goal_atom(true, "painted", &["o"]);
    b
}
