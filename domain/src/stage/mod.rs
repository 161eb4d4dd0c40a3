//! Per-stage participant state
//!
//! A participant owns one [`StageState`] per stage. Everything here is a pure
//! value: mutations take the old state and return a new one, so the document
//! store can swap cells atomically.
//!
//! - [`channel`] - the append-only message log (MessageChannel)
//! - [`discussion`] - accessors over the discussion queue (DiscussionQueue)

pub mod channel;
pub mod discussion;
pub mod item;
pub mod message;
pub mod state;

pub use item::{Item, ItemPair};
pub use message::{Message, MessageKind};
pub use state::StageState;
