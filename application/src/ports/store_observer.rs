//! Commit observer port
//!
//! Observers registered on the
//! [`SharedDocumentStore`](crate::store::SharedDocumentStore) are called
//! synchronously after every commit, in registration order, with the
//! snapshot that commit produced.

use crate::store::Commit;
use stagegate_domain::Session;

/// Callback invoked after each committed mutation.
///
/// Implementations must not assume notifications from different
/// participants arrive in version order; compare `commit.version` when that
/// matters.
pub trait StoreObserver: Send + Sync {
    fn on_commit(&self, snapshot: &Session, commit: &Commit);
}
