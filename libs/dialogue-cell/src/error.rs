use thiserror::Error;

use generation_cell::GenerationError;
use shared_store::StoreError;

/// Failures the routing layer cannot turn into a user-facing prompt on
/// its own. The orchestrator's catch-all converts these to the generic
/// apology reply.
#[derive(Error, Debug)]
pub enum DialogueError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
