//! §4.8: heuristic evaluation over a materialized [`StripsTask`]. `HMax` and
//! `HAdd` are the standard relaxed-planning-graph heuristics, computed
//! directly over ground facts and operators (as opposed to the lifted,
//! pre-grounding weighted canonical model of §4.3.2, which a caller may use
//! instead when it does not want to materialize a full task).

use crate::search::state_space::PropositionalState;
use crate::task::{FactId, StripsTask};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HeuristicValue {
    Value(u32),
    DeadEnd,
}

pub trait Heuristic {
    fn estimate(&mut self, state: &PropositionalState, task: &StripsTask) -> HeuristicValue;
}

/// Always 0: turns best-first search into plain Dijkstra/BFS-by-cost.
#[derive(Default)]
pub struct Blind;

impl Heuristic for Blind {
    fn estimate(&mut self, _state: &PropositionalState, _task: &StripsTask) -> HeuristicValue {
        HeuristicValue::Value(0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Aggregate {
    Max,
    Add,
}

/// Shared relaxed-planning-graph recursion for `HMax`/`HAdd`: each fact's
/// cost is the cheapest achiever's aggregated precondition cost plus that
/// achiever's own cost, propagated to a fixpoint (delete effects ignored,
/// the standard relaxation).
struct RelaxedHeuristic {
    aggregate: Aggregate,
}

impl RelaxedHeuristic {
    fn estimate(&self, state: &PropositionalState, task: &StripsTask) -> HeuristicValue {
        if task.unsolvable {
            return HeuristicValue::DeadEnd;
        }
        let mut cost = vec![u32::MAX; task.num_facts];
        for f in state.facts() {
            cost[usize::from(*f)] = 0;
        }

        let mut changed = true;
        while changed {
            changed = false;
            for op in &task.operators {
                let Some(pre_cost) = self.aggregated_cost(&op.precondition, &cost) else { continue };
                let total = pre_cost.saturating_add(op.cost);
                for f in &op.add {
                    let slot = &mut cost[usize::from(*f)];
                    if total < *slot {
                        *slot = total;
                        changed = true;
                    }
                }
                for c in &op.conditional {
                    if c.neg_condition.iter().any(|f| cost[usize::from(*f)] == 0) {
                        continue;
                    }
                    let Some(cond_cost) = self.aggregated_cost(&c.condition, &cost) else { continue };
                    let total = pre_cost.max(cond_cost).saturating_add(op.cost);
                    for f in &c.add {
                        let slot = &mut cost[usize::from(*f)];
                        if total < *slot {
                            *slot = total;
                            changed = true;
                        }
                    }
                }
            }
        }

        match self.aggregated_cost(&task.goal, &cost) {
            Some(h) => HeuristicValue::Value(h),
            None => HeuristicValue::DeadEnd,
        }
    }

    /// `None` if any fact in `facts` is still unreachable (cost `u32::MAX`).
    fn aggregated_cost(&self, facts: &[FactId], cost: &[u32]) -> Option<u32> {
        let mut acc = 0u32;
        for f in facts {
            let c = cost[usize::from(*f)];
            if c == u32::MAX {
                return None;
            }
            acc = match self.aggregate {
                Aggregate::Max => acc.max(c),
                Aggregate::Add => acc.saturating_add(c),
            };
        }
        Some(acc)
    }
}

#[derive(Default)]
pub struct HMax {
    inner: Option<RelaxedHeuristic>,
}

impl Heuristic for HMax {
    fn estimate(&mut self, state: &PropositionalState, task: &StripsTask) -> HeuristicValue {
        self.inner.get_or_insert(RelaxedHeuristic { aggregate: Aggregate::Max }).estimate(state, task)
    }
}

#[derive(Default)]
pub struct HAdd {
    inner: Option<RelaxedHeuristic>,
}

impl Heuristic for HAdd {
    fn estimate(&mut self, state: &PropositionalState, task: &StripsTask) -> HeuristicValue {
        self.inner.get_or_insert(RelaxedHeuristic { aggregate: Aggregate::Add }).estimate(state, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroundingConfig;
    use crate::demos;
    use crate::task;

    #[test]
    fn hadd_is_zero_at_the_goal_and_positive_one_step_away() {
        let problem = demos::build("one-step").unwrap();
        let task = task::assemble(&problem, crate::reachability::compute_reachability(&problem, &GroundingConfig::default()), &GroundingConfig::default());
        let mut h = HAdd::default();

        let init = PropositionalState::from_facts(task.init.clone());
        match h.estimate(&init, &task) {
            HeuristicValue::Value(v) => assert!(v > 0, "goal not yet reached, h should be positive"),
            HeuristicValue::DeadEnd => panic!("one-step task is solvable"),
        }

        let goal_state = PropositionalState::from_facts(task.goal.clone());
        match h.estimate(&goal_state, &task) {
            HeuristicValue::Value(v) => assert_eq!(v, 0),
            HeuristicValue::DeadEnd => panic!("goal state is not a dead end"),
        }
    }

    #[test]
    fn any_heuristic_reports_dead_end_on_an_unsolvable_task() {
        let problem = demos::build("unsolvable-grounding").unwrap();
        let task = task::assemble(&problem, crate::reachability::compute_reachability(&problem, &GroundingConfig::default()), &GroundingConfig::default());
        assert!(task.unsolvable);

        let state = PropositionalState::from_facts(task.init.clone());
        for mut h in [Box::new(HAdd::default()) as Box<dyn Heuristic>, Box::new(HMax::default())] {
            assert_eq!(h.estimate(&state, &task), HeuristicValue::DeadEnd);
        }
    }
}
