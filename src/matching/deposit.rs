//! Deposit partitioning (L1 -> L2)
//!
//! The native bridge finalizes a deposit on L2 in a single hop, emitting
//! `ERC20BridgeFinalized` with the nonce in `extraData`. A finalized deposit
//! is ready for the L2 liquidity manager to claim.

use alloy::primitives::Address;
use tracing::{debug, warn};

use super::{into_events, match_by_nonce, remove_received};
use crate::error::Result;
use crate::evm::{BridgeFinalizedEvent, ReceivedEvent, SentEvent};
use crate::metrics;
use crate::types::Direction;

/// Contracts a deposit's events must reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositExpectations {
    /// Token on L1; finalized events name it as their remote token
    pub local_token: Address,
    /// L1 bridge adapter that initiates the native bridge transfer
    pub l1_bridge_adapter: Address,
    /// Destination liquidity manager on L2
    pub l2_liquidity_manager: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepositPartition {
    /// Sent, not yet finalized by the native bridge
    pub not_ready: Vec<SentEvent>,
    /// Finalized by the native bridge, not yet received
    pub ready: Vec<SentEvent>,
    /// Finalized events with no sent event in the window
    pub missing_sent: Vec<BridgeFinalizedEvent>,
}

impl DepositExpectations {
    fn rejects_sent(&self, event: &SentEvent) -> Option<&'static str> {
        (event.to != self.l2_liquidity_manager).then_some("sent_to_mismatch")
    }

    fn rejects_finalized(&self, event: &BridgeFinalizedEvent) -> Option<&'static str> {
        if event.remote_token != self.local_token {
            Some("finalized_token_mismatch")
        } else if event.from != self.l1_bridge_adapter {
            Some("finalized_from_mismatch")
        } else if event.to != self.l2_liquidity_manager {
            Some("finalized_to_mismatch")
        } else {
            None
        }
    }
}

/// Partition deposit sent events into not ready and ready.
///
/// Any nonce decode failure aborts the call.
pub fn partition_deposits(
    expected: &DepositExpectations,
    sent: &[SentEvent],
    finalized: &[BridgeFinalizedEvent],
    received: &[ReceivedEvent],
) -> Result<DepositPartition> {
    let eligible_sent = sent.iter().filter(|event| match expected.rejects_sent(event) {
        Some(reason) => {
            warn!(
                tx_hash = %event.raw.tx_hash,
                to = %event.to,
                expected_to = %expected.l2_liquidity_manager,
                "Skipping sent event addressed to an unexpected manager"
            );
            metrics::record_rejected_event(Direction::Deposit, reason);
            false
        }
        None => true,
    });

    let eligible_finalized = finalized
        .iter()
        .filter(|event| match expected.rejects_finalized(event) {
            Some(reason) => {
                warn!(
                    tx_hash = %event.raw.tx_hash,
                    reason,
                    remote_token = %event.remote_token,
                    from = %event.from,
                    to = %event.to,
                    "Skipping finalized event with unexpected participants"
                );
                metrics::record_rejected_event(Direction::Deposit, reason);
                false
            }
            None => true,
        });

    let matched = match_by_nonce(Direction::Deposit, eligible_sent, eligible_finalized)?;
    let ready = remove_received(
        Direction::Deposit,
        matched.matched,
        received,
        ReceivedEvent::received_nonce,
    )?;

    let partition = DepositPartition {
        not_ready: into_events(matched.unmatched),
        ready: into_events(ready),
        missing_sent: matched.missing_sent,
    };

    debug!(
        not_ready = partition.not_ready.len(),
        ready = partition.ready.len(),
        missing_sent = partition.missing_sent.len(),
        "Partitioned deposits"
    );

    Ok(partition)
}
