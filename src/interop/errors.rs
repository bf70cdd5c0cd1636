// Classified errors for interop flows and the transfer protocol
use std::fmt;

/// Coarse error taxonomy surfaced to callers.
///
/// Input and configuration errors are caught before any network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InputValidation,
    Configuration,
    RelayUnreachable,
    ViewVerificationFailed,
    RemoteQueryRejected,
    LocalInvocationFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteropError {
    // Input errors
    InvalidInput(String),
    UnrecognizedCategory(String),
    InvalidQuantity(String),

    // Configuration errors
    Configuration(String),
    InvalidDestinationNetwork(String),

    // Remote view errors
    RelayUnreachable { address: String, reason: String },
    ViewVerificationFailed { address: String, reason: String },
    RemoteQueryRejected { address: String, reason: String },

    // Local ledger errors
    LocalInvocationFailed { function: String, reason: String },
}

impl fmt::Display for InteropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::UnrecognizedCategory(category) => {
                write!(f, "Unrecognized asset category: {}", category)
            }
            Self::InvalidQuantity(value) => {
                write!(f, "Token quantity must be a positive integer, got '{}'", value)
            }
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidDestinationNetwork(network) => {
                write!(f, "Invalid destination network: {}", network)
            }
            Self::RelayUnreachable { address, reason } => {
                write!(f, "Relay unreachable for {}: {}", address, reason)
            }
            Self::ViewVerificationFailed { address, reason } => {
                write!(f, "View verification failed for {}: {}", address, reason)
            }
            Self::RemoteQueryRejected { address, reason } => {
                write!(f, "Remote query rejected for {}: {}", address, reason)
            }
            Self::LocalInvocationFailed { function, reason } => {
                write!(f, "Local invocation of {} failed: {}", function, reason)
            }
        }
    }
}

impl std::error::Error for InteropError {}

impl InteropError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INPUT_VALIDATION",
            Self::UnrecognizedCategory(_) => "UNRECOGNIZED_CATEGORY",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::Configuration(_) => "CONFIGURATION",
            Self::InvalidDestinationNetwork(_) => "INVALID_DESTINATION_NETWORK",
            Self::RelayUnreachable { .. } => "RELAY_UNREACHABLE",
            Self::ViewVerificationFailed { .. } => "VIEW_VERIFICATION_FAILED",
            Self::RemoteQueryRejected { .. } => "REMOTE_QUERY_REJECTED",
            Self::LocalInvocationFailed { .. } => "LOCAL_INVOCATION_FAILED",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) | Self::UnrecognizedCategory(_) | Self::InvalidQuantity(_) => {
                ErrorClass::InputValidation
            }
            Self::Configuration(_) | Self::InvalidDestinationNetwork(_) => {
                ErrorClass::Configuration
            }
            Self::RelayUnreachable { .. } => ErrorClass::RelayUnreachable,
            Self::ViewVerificationFailed { .. } => ErrorClass::ViewVerificationFailed,
            Self::RemoteQueryRejected { .. } => ErrorClass::RemoteQueryRejected,
            Self::LocalInvocationFailed { .. } => ErrorClass::LocalInvocationFailed,
        }
    }

    /// Only transport failures may be retried, and only by re-running the whole flow.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RelayUnreachable { .. })
    }

    /// True for errors raised before any remote or local call was made.
    pub fn is_pre_io(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::InputValidation | ErrorClass::Configuration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_classes() {
        let err = InteropError::InvalidQuantity("abc".to_string());
        assert_eq!(err.error_code(), "INVALID_QUANTITY");
        assert_eq!(err.class(), ErrorClass::InputValidation);
        assert!(err.is_pre_io());
        assert!(!err.is_retryable());

        let err = InteropError::RelayUnreachable {
            address: "localhost:9080/network1/mychannel:simpleasset:GetAssetPledgeStatus:p1".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.error_code(), "RELAY_UNREACHABLE");
        assert!(err.is_retryable());
        assert!(!err.is_pre_io());
    }

    #[test]
    fn test_verification_failure_is_not_retryable() {
        let err = InteropError::ViewVerificationFailed {
            address: "a".to_string(),
            reason: "signature mismatch".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::ViewVerificationFailed);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = InteropError::LocalInvocationFailed {
            function: "ReclaimAsset".to_string(),
            reason: "pledge p1 already claimed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Local invocation of ReclaimAsset failed: pledge p1 already claimed"
        );
    }
}
