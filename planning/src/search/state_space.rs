//! C6: state-id assignment and per-state search node records.

use crate::task::FactId;
use fixedbitset::FixedBitSet;
use std::collections::HashMap;
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefVec;

create_ref_type!(StateId);

/// A propositional state (§3): the bit-packed encoding is authoritative for
/// applicability/successor computation, the sorted vector is the hashable,
/// storable key used for dedup and for goal/precondition subset tests.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PropositionalState {
    sorted: Vec<FactId>,
}

impl PropositionalState {
    pub fn from_facts(mut facts: Vec<FactId>) -> Self {
        facts.sort();
        facts.dedup();
        PropositionalState { sorted: facts }
    }

    pub fn facts(&self) -> &[FactId] {
        &self.sorted
    }

    pub fn to_bitset(&self, num_facts: usize) -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(num_facts);
        for f in &self.sorted {
            bits.insert(usize::from(*f));
        }
        bits
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NodeStatus {
    New,
    Open,
    Closed,
}

#[derive(Clone, Debug)]
pub struct SearchNode {
    pub parent: Option<StateId>,
    /// Index into `task.operators`, or `None` for the initial state.
    pub incoming_operator: Option<usize>,
    pub g: u32,
    pub status: NodeStatus,
}

impl SearchNode {
    fn fresh() -> Self {
        SearchNode { parent: None, incoming_operator: None, g: u32::MAX, status: NodeStatus::New }
    }
}

/// Insert-with-dedup store of visited states plus their node records (§4.6).
#[derive(Default)]
pub struct StateSpace {
    index: HashMap<Vec<FactId>, StateId>,
    states: RefVec<StateId, PropositionalState>,
    nodes: RefVec<StateId, SearchNode>,
}

impl StateSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up or allocates a dense id for `state`, returning the id and
    /// whether this was a first insertion (fresh node record).
    pub fn insert(&mut self, state: PropositionalState) -> (StateId, bool) {
        if let Some(&id) = self.index.get(&state.sorted) {
            return (id, false);
        }
        let key = state.sorted.clone();
        let id = self.states.push(state);
        let node_id = self.nodes.push(SearchNode::fresh());
        debug_assert_eq!(id, node_id);
        self.index.insert(key, id);
        (id, true)
    }

    pub fn state(&self, id: StateId) -> &PropositionalState {
        &self.states[id]
    }

    pub fn node(&self, id: StateId) -> &SearchNode {
        &self.nodes[id]
    }

    /// The only sanctioned way to mutate a node record (§4.6: "overwrite
    /// parent, op, g, status atomically"); the state content itself is
    /// never touched here.
    pub fn set_node(&mut self, id: StateId, parent: Option<StateId>, incoming_operator: Option<usize>, g: u32, status: NodeStatus) {
        let node = &mut self.nodes[id];
        node.parent = parent;
        node.incoming_operator = incoming_operator;
        node.g = g;
        node.status = status;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
