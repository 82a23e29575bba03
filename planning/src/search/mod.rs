//! C6 + C7: state space, open list, and the search driver.

pub mod driver;
pub mod open_list;
pub mod state_space;

pub use driver::{search, SearchOutcome, SearchStatistics};
pub use state_space::{PropositionalState, StateId};
