use tracing::{debug, debug_span, warn};

use crate::core::Result;
use crate::storage::ObjectStore;

impl ObjectStore {
    /// Runs `work` as one write-through unit.
    ///
    /// Calls are serialised on the store's transaction lock. On success the
    /// container root is committed once (unless disabled in the config),
    /// on top of whatever the store committed while `work` ran. On failure
    /// nothing is committed and in-memory changes made by `work` stay.
    ///
    /// Not reentrant: calling `transaction` from inside `work` deadlocks.
    pub fn transaction<R>(&self, work: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self.transaction_lock.lock()?;
        let span = debug_span!("transaction");
        let _entered = span.enter();
        debug!("transaction started");

        match work() {
            Ok(value) => {
                if self.config().transaction_commit {
                    debug!("store the root");
                    self.commit_root()?;
                }
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "transaction failed, root not stored");
                Err(err)
            }
        }
    }
}
