//! Adapter traits
//!
//! Defines the interfaces the orchestrator needs from the relay and from the
//! local ledger. Both are external systems; implementations own transport,
//! proof verification and contract execution.

use async_trait::async_trait;
use std::fmt;

use crate::interop::types::{Credentials, LocalInvocation, View};

/// Failure of a view fetch, as reported by a `ViewClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or timeout (transient)
    Unreachable(String),
    /// Proof invalid, or signature/membership mismatch
    VerificationFailed(String),
    /// Remote contract returned an application-level error
    Rejected(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Unreachable(msg) => write!(f, "unreachable: {}", msg),
            FetchError::VerificationFailed(msg) => write!(f, "verification failed: {}", msg),
            FetchError::Rejected(msg) => write!(f, "rejected: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Relay-backed view source
///
/// A returned `View` MUST already have passed proof verification; callers
/// treat its payload as trusted.
#[async_trait]
pub trait ViewClient: Send + Sync {
    async fn fetch(
        &self,
        address: &str,
        sign_required: bool,
        credentials: &Credentials,
    ) -> Result<View, FetchError>;

    /// Get client name for logging
    fn name(&self) -> &str;
}

/// Local ledger submission
///
/// Returns the contract's result string. Rejections by the contract
/// (precondition violated, already terminal) are errors.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn invoke(
        &self,
        invocation: &LocalInvocation,
        credentials: &Credentials,
    ) -> anyhow::Result<String>;

    /// Get client name for logging
    fn name(&self) -> &str;
}
