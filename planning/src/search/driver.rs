//! C7: the unified A*/greedy/lazy best-first search loop (§4.7).

use super::open_list::{OpenList, Priority};
use super::state_space::{NodeStatus, PropositionalState, StateId, StateSpace};
use crate::config::{Algorithm, HeuristicKind, SearchConfig};
use crate::heuristics::{Blind, HAdd, HMax, Heuristic, HeuristicValue};
use crate::plan::Plan;
use crate::task::{FactId, Operator, StripsTask};

#[derive(Clone, Debug, Default)]
pub struct SearchStatistics {
    pub steps: u64,
    pub expansions: u64,
    pub expansions_before_last_f_layer: u64,
    pub heuristic_evaluations: u64,
    pub generations: u64,
    pub open_count: u64,
    pub closed_count: u64,
    pub reopens: u64,
    pub dead_ends: u64,
    pub dead_ends_before_last_f_layer: u64,
    pub last_f_value: u32,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found(Plan),
    Unsolvable,
    Abort,
}

fn make_heuristic(kind: HeuristicKind) -> Box<dyn Heuristic> {
    match kind {
        HeuristicKind::HAdd => Box::new(HAdd::default()),
        HeuristicKind::HMax => Box::new(HMax::default()),
        HeuristicKind::Blind => Box::new(Blind),
    }
}

fn successor_facts(state: &PropositionalState, op: &Operator) -> Vec<FactId> {
    let base = state.facts();
    let mut dels: Vec<FactId> = op.del.clone();
    let mut adds: Vec<FactId> = op.add.clone();
    for c in &op.conditional {
        let holds = c.condition.iter().all(|f| base.binary_search(f).is_ok()) && c.neg_condition.iter().all(|f| base.binary_search(f).is_err());
        if holds {
            dels.extend(c.del.iter().copied());
            adds.extend(c.add.iter().copied());
        }
    }
    dels.sort();
    dels.dedup();
    adds.sort();
    adds.dedup();
    let mut result: Vec<FactId> = base.iter().copied().filter(|f| dels.binary_search(f).is_err()).collect();
    result.extend(adds);
    result.sort();
    result.dedup();
    result
}

fn priority_of(weights: (u32, u32), g: u32, h: u32) -> Priority {
    Priority { f: weights.0.saturating_mul(g).saturating_add(weights.1.saturating_mul(h)), h }
}

/// Runs the search with no external stop signal (equivalent to always polling `false`).
pub fn search(task: &StripsTask, cfg: &SearchConfig) -> (SearchOutcome, SearchStatistics) {
    search_with_stop(task, cfg, &|| false)
}

/// §5: the driver accepts an external stop signal, polled at loop top, plus
/// an optional hard cap on expansions from `cfg.max_expansions`.
pub fn search_with_stop(task: &StripsTask, cfg: &SearchConfig, stop: &dyn Fn() -> bool) -> (SearchOutcome, SearchStatistics) {
    let mut stats = SearchStatistics::default();

    if task.unsolvable {
        return (SearchOutcome::Unsolvable, stats);
    }

    let weights = cfg.algorithm.weights();
    let lazy = cfg.algorithm.is_lazy();
    let mut heuristic = make_heuristic(cfg.heuristic);

    let mut space = StateSpace::new();
    let mut open = OpenList::new();

    let init_state = PropositionalState::from_facts(task.init.clone());
    let (init_id, _) = space.insert(init_state);

    if task.goal_satisfied(space.state(init_id).facts()) {
        space.set_node(init_id, None, None, 0, NodeStatus::Open);
        return (SearchOutcome::Found(Plan::empty()), stats);
    }

    let init_h = if lazy {
        HeuristicValue::Value(0)
    } else {
        stats.heuristic_evaluations += 1;
        heuristic.estimate(space.state(init_id), task)
    };
    let init_h = match init_h {
        HeuristicValue::DeadEnd => {
            space.set_node(init_id, None, None, 0, NodeStatus::Closed);
            return (SearchOutcome::Unsolvable, stats);
        }
        HeuristicValue::Value(h) => h,
    };
    space.set_node(init_id, None, None, 0, NodeStatus::Open);
    stats.open_count += 1;
    open.push(priority_of(weights, 0, init_h), init_id);

    loop {
        if stop() {
            return (SearchOutcome::Abort, stats);
        }
        let Some((priority, state_id)) = open.pop() else {
            return (SearchOutcome::Unsolvable, stats);
        };
        let node = space.node(state_id);
        if node.status != NodeStatus::Open {
            continue;
        }
        let g = node.g;
        stats.steps += 1;
        if priority.f > stats.last_f_value {
            stats.expansions_before_last_f_layer = stats.expansions;
            stats.dead_ends_before_last_f_layer = stats.dead_ends;
            stats.last_f_value = priority.f;
        }
        stats.expansions += 1;
        space.set_node(state_id, node.parent, node.incoming_operator, g, NodeStatus::Closed);
        stats.closed_count += 1;

        if task.goal_satisfied(space.state(state_id).facts()) {
            return (SearchOutcome::Found(extract_plan(task, &space, state_id, g)), stats);
        }

        // In lazy mode, the priority this state was popped under carried its
        // *parent's* h as a placeholder; the real value is only computed now,
        // at expansion, and is this state's own children's placeholder in turn.
        let mut lazy_h = 0;
        if lazy {
            stats.heuristic_evaluations += 1;
            match heuristic.estimate(space.state(state_id), task) {
                HeuristicValue::DeadEnd => {
                    stats.dead_ends += 1;
                    continue;
                }
                HeuristicValue::Value(h) => lazy_h = h,
            }
        }

        if let Some(cap) = cfg.max_expansions {
            if stats.expansions >= cap {
                return (SearchOutcome::Abort, stats);
            }
        }

        let current_facts = space.state(state_id).facts().to_vec();
        for (op_idx, op) in task.operators.iter().enumerate() {
            if !op.is_applicable(&current_facts) {
                continue;
            }
            let succ_facts = successor_facts(space.state(state_id), op);
            let succ_state = PropositionalState::from_facts(succ_facts);
            let g_candidate = g.saturating_add(op.cost);
            let (succ_id, is_new) = space.insert(succ_state);
            stats.generations += 1;

            if !is_new {
                let succ_node = space.node(succ_id);
                if succ_node.status != NodeStatus::New && succ_node.g <= g_candidate {
                    continue;
                }
            }

            let h = if lazy {
                lazy_h
            } else {
                stats.heuristic_evaluations += 1;
                match heuristic.estimate(space.state(succ_id), task) {
                    HeuristicValue::DeadEnd => {
                        space.set_node(succ_id, Some(state_id), Some(op_idx), g_candidate, NodeStatus::Closed);
                        stats.dead_ends += 1;
                        continue;
                    }
                    HeuristicValue::Value(h) => h,
                }
            };

            let succ_status = space.node(succ_id).status;
            if succ_status == NodeStatus::Closed {
                stats.reopens += 1;
            }
            space.set_node(succ_id, Some(state_id), Some(op_idx), g_candidate, NodeStatus::Open);
            stats.open_count += 1;
            open.push(priority_of(weights, g_candidate, h), succ_id);
        }
    }
}

fn extract_plan(task: &StripsTask, space: &StateSpace, goal_state: StateId, cost: u32) -> Plan {
    let mut op_indices = Vec::new();
    let mut cur = goal_state;
    loop {
        let node = space.node(cur);
        match (node.parent, node.incoming_operator) {
            (Some(parent), Some(op_idx)) => {
                op_indices.push(op_idx);
                cur = parent;
            }
            _ => break,
        }
    }
    op_indices.reverse();
    let ops: Vec<&Operator> = op_indices.into_iter().map(|i| &task.operators[i]).collect();
    Plan::from_operators(&ops, cost)
}
