//! Interop module - main module file
//!
//! This module provides cross-ledger asset transfer: view addressing, the
//! interop flow orchestrator, the pledge/claim/reclaim protocol and the
//! relay/ledger adapters.

pub mod types;
pub mod state;
pub mod errors;
pub mod address;
pub mod request;
pub mod orchestrator;
pub mod protocol;
pub mod retry;
pub mod adapters;

// Re-export commonly used types
pub use state::PledgeStatus;
pub use types::{AssetCategory, AssetParam, AssetRef, ClaimStatus, Credentials, FlowOutcome, PledgeRecord, View};
pub use errors::{ErrorClass, InteropError};
pub use address::RemoteViewAddress;
pub use request::InteropFlowRequest;
pub use orchestrator::{InteropFlowOrchestrator, OrchestratorConfig};
pub use protocol::{ClaimParams, PledgeParams, ReclaimParams, TransferProtocol};
pub use retry::{run_with_retry, RetryPolicy};
