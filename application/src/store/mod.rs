//! Shared session document store
//!
//! Holds the one mutable document per session. Each participant's record is
//! a cell: mutations to the same cell are serialized and applied in
//! submission order, mutations to different cells never wait on each other
//! beyond the pointer swap that publishes the new snapshot.
//!
//! ```text
//! mutate(alice, f) ──> lock alice cell ──> f(state) ──> swap Arc<Session> ──> notify observers
//! mutate(bob, g)   ──> lock bob cell   ──> g(state) ──> swap Arc<Session> ──> notify observers
//! ```

mod commit;
mod document_store;
mod transcript;

pub use commit::{Change, Commit};
pub use document_store::{SharedDocumentStore, StoreError};
pub use transcript::TranscriptObserver;
