//! Turn orchestration: fixed-precedence routing from raw user text to a
//! reply, with conversational state recovered from stored turns.

pub mod error;
pub mod funnel;
pub mod models;
pub mod orchestrator;
pub mod recovery;
pub mod replies;

pub use error::DialogueError;
pub use funnel::{BookingFunnel, FunnelStep};
pub use models::{Awaiting, SessionState};
pub use orchestrator::{DialogueOrchestrator, OrchestratorDeps};
pub use recovery::StateRecovery;
pub use replies::ResponseCleaner;
