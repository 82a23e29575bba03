//! §4.7.1 / §6: plan extraction and the text rendering of a found plan.

use crate::task::{Operator, StripsTask};
use std::fmt;

#[derive(Clone, Debug)]
pub struct Plan {
    pub operator_names: Vec<String>,
    pub cost: u32,
}

impl Plan {
    pub fn length(&self) -> usize {
        self.operator_names.len()
    }

    pub fn empty() -> Self {
        Plan { operator_names: Vec::new(), cost: 0 }
    }

    pub(crate) fn from_operators(ops: &[&Operator], cost: u32) -> Self {
        Plan { operator_names: ops.iter().map(|o| o.name.clone()).collect(), cost }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; Cost: {}", self.cost)?;
        writeln!(f, ";; Length: {}", self.length())?;
        for name in &self.operator_names {
            writeln!(f, "{name}")?;
        }
        Ok(())
    }
}

/// Resolves a task's unsolvability or empty-goal boundary cases without a
/// search run, for callers of [`crate::task::StripsTask::goal_satisfied`]
/// that want a zero-expansion answer up front.
pub fn trivial_plan(task: &StripsTask) -> Option<Plan> {
    if task.goal_satisfied(&task.init) {
        Some(Plan::empty())
    } else {
        None
    }
}
