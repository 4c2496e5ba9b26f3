//! Asking players to choose.
//!
//! The game worker calls into the `SelectionBroker` and blocks; connection
//! threads deliver replies. See `broker` for the locking discipline.

pub mod broker;
pub mod option;

pub use broker::SelectionBroker;
pub use option::{RequestId, SelectionOption, SelectionRequest};
