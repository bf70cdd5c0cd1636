//! Adapters module - relay and ledger boundaries

pub mod traits;
pub mod mock;
pub mod relay;
pub mod gateway;
pub mod simulated;

pub use traits::{FetchError, LedgerClient, ViewClient};
pub use mock::{MockLedger, MockViewClient};

// HTTP-backed adapters
pub use relay::RelayViewClient;
pub use gateway::GatewayLedgerClient;

// In-memory contract and relay
pub use simulated::{SimulatedLedger, SimulatedRelay};
