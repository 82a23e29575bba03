//! Grounding and search configuration (§6's two option tables), plus the
//! process-tunable caps wired through [`env_param::EnvParam`].

use env_param::EnvParam;

/// Which reachability back-end (§4.3) computes the grounding closure.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
    Relational,
    Datalog,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Relational
    }
}

/// Default cap on reachability fixpoint iterations, overridable per-call via
/// [`GroundingConfig::max_layers`] or at process start via `STRIPS_MAX_LAYERS`.
pub static DEFAULT_MAX_LAYERS: EnvParam<u32> = EnvParam::new("STRIPS_MAX_LAYERS", "10000");

/// Default cap on the number of distinct reachable atoms, same override rules
/// as [`DEFAULT_MAX_LAYERS`], via `STRIPS_MAX_ATOMS`.
pub static DEFAULT_MAX_ATOMS: EnvParam<u32> = EnvParam::new("STRIPS_MAX_ATOMS", "1000000");

#[derive(Clone, Debug)]
pub struct GroundingConfig {
    pub keep_static_facts: bool,
    pub keep_action_args: bool,
    pub remove_static_facts_from_preconditions: bool,
    pub max_layers: Option<u32>,
    pub max_atoms: Option<u32>,
    pub backend: Backend,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        GroundingConfig {
            keep_static_facts: false,
            keep_action_args: false,
            remove_static_facts_from_preconditions: false,
            max_layers: Some(DEFAULT_MAX_LAYERS.get()),
            max_atoms: Some(DEFAULT_MAX_ATOMS.get()),
            backend: Backend::default(),
        }
    }
}

/// The three algorithm flavors of §4.7, unified by a pair of priority weights
/// and a laziness flag.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Algorithm {
    AStar,
    Greedy,
    Lazy,
}

impl Algorithm {
    /// `(w_g, w_h)` from the §4.7 table.
    pub fn weights(self) -> (u32, u32) {
        match self {
            Algorithm::AStar => (1, 1),
            Algorithm::Greedy => (0, 1),
            Algorithm::Lazy => (0, 1),
        }
    }

    pub fn is_lazy(self) -> bool {
        matches!(self, Algorithm::Lazy)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HeuristicKind {
    HAdd,
    HMax,
    /// Always returns 0: turns best-first search into plain Dijkstra/BFS-by-cost.
    Blind,
}

impl Default for HeuristicKind {
    fn default() -> Self {
        HeuristicKind::HAdd
    }
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
    /// Hard cap on expansions; exceeding it surfaces as `SearchOutcome::Abort`.
    pub max_expansions: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            algorithm: Algorithm::AStar,
            heuristic: HeuristicKind::HAdd,
            max_expansions: None,
        }
    }
}
