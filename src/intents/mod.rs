//! Intent-based ability resolution.
//!
//! ## Key Types
//!
//! - `IntentType`: The closed type hierarchy, with abstract groupings
//! - `IntentKind` / `Intent`: A concrete event and its cancellation flag
//! - `Tier`: The six ordered dispatch phases
//! - `AbilityHandler`: What cards and bases implement to react to intents
//! - `IntentRouter`: Handler registry and dispatch planning

pub mod handler;
pub mod hierarchy;
pub mod intent;
pub mod router;
pub mod tier;

pub use handler::{AbilityHandler, Callback, Callbacks, HandlerId};
pub use hierarchy::IntentType;
pub use intent::{Intent, IntentKind};
pub use router::{DispatchPlan, IntentRouter};
pub use tier::Tier;
