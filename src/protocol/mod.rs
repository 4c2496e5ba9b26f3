//! Client/server message contract and the transport boundary.
//!
//! ## Key Types
//!
//! - `ClientMessage` / `ServerMessage`: The logical messages
//! - `GameStateView` and friends: Per-player snapshots sent to clients
//! - `Codec`: Frame encoding (`JsonCodec`, `BincodeCodec`)
//! - `Connection` / `Outbox`: Where outbound messages go

pub mod codec;
pub mod messages;
pub mod outbox;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use messages::{
    BaseView, CardCategory, CardInfo, ClientMessage, GameStateView, IndexedOption, OccupantView,
    PlayerView, ServerMessage, TurnView,
};
pub use outbox::{ChannelConnection, Connection, Outbox};
