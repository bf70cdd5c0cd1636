//! Pledge State Machine
//!
//! Defines the pledge lifecycle states, events, and transition function.
//! The lifecycle is strictly linear: `Pledged -> Claimed` or
//! `Pledged -> Reclaimed`, never both.

use serde::{Deserialize, Serialize};

/// Pledge lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PledgeStatus {
    /// Asset locked on the source ledger, awaiting claim or reclaim
    Pledged,
    /// Recipient took ownership on the destination ledger
    Claimed,
    /// Pledger recovered the asset on the source ledger after expiry
    Reclaimed,
}

impl PledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PledgeStatus::Pledged => "PLEDGED",
            PledgeStatus::Claimed => "CLAIMED",
            PledgeStatus::Reclaimed => "RECLAIMED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PLEDGED" => Some(PledgeStatus::Pledged),
            "CLAIMED" => Some(PledgeStatus::Claimed),
            "RECLAIMED" => Some(PledgeStatus::Reclaimed),
            _ => None,
        }
    }

    /// Check if this is a terminal state (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, PledgeStatus::Claimed | PledgeStatus::Reclaimed)
    }
}

/// Events that move a pledge out of `Pledged`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PledgeEvent {
    /// Recipient claimed with a valid pledge proof before expiry
    Claim,
    /// Pledger reclaimed with a valid "not claimed" proof after expiry
    Reclaim,
}

/// State transition function
///
/// Returns `None` when the event is not allowed from the current state.
/// Terminal states accept no events.
pub fn transition(current: PledgeStatus, event: PledgeEvent) -> Option<PledgeStatus> {
    use PledgeEvent::*;
    use PledgeStatus::*;

    match (current, event) {
        (Pledged, Claim) => Some(Claimed),
        (Pledged, Reclaim) => Some(Reclaimed),
        _ => None,
    }
}
