//! Withdrawal partitioning (L2 -> L1)
//!
//! A withdrawal is proven on L1 before it can be finalized. The L1 liquidity
//! manager emits `FinalizationStepCompleted` once the proof step is done, so a
//! sent event without that step still needs to be proven and one with it
//! needs to be finalized.

use alloy::primitives::Address;
use tracing::{debug, warn};

use super::{into_events, match_by_nonce, remove_received};
use crate::error::Result;
use crate::evm::{FinalizationStepEvent, ReceivedEvent, SentEvent};
use crate::metrics;
use crate::types::{ChainSelector, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalExpectations {
    /// The L2 the withdrawals leave from
    pub local_selector: ChainSelector,
    /// Destination liquidity manager on L1
    pub remote_liquidity_manager: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalPartition {
    pub needs_to_be_proven: Vec<SentEvent>,
    /// Proven, not yet received
    pub needs_to_be_finalized: Vec<SentEvent>,
    /// Proven steps with no sent event in the window
    pub missing_sent: Vec<FinalizationStepEvent>,
}

/// Partition withdrawal sent events by proof progress.
///
/// Sent events from another chain or to another manager, and proven steps for
/// another chain, are skipped with a warning. Any nonce decode failure aborts
/// the call.
pub fn partition_withdrawals(
    expected: &WithdrawalExpectations,
    sent: &[SentEvent],
    proven: &[FinalizationStepEvent],
    received: &[ReceivedEvent],
) -> Result<WithdrawalPartition> {
    let eligible_sent = sent.iter().filter(|event| {
        let reason = if event.from_chain_selector != expected.local_selector {
            "sent_selector_mismatch"
        } else if event.to != expected.remote_liquidity_manager {
            "sent_to_mismatch"
        } else {
            return true;
        };

        warn!(
            tx_hash = %event.raw.tx_hash,
            reason,
            from_chain_selector = %event.from_chain_selector,
            to = %event.to,
            "Skipping withdrawal sent event"
        );
        metrics::record_rejected_event(Direction::Withdrawal, reason);
        false
    });

    let eligible_proven = proven.iter().filter(|event| {
        if event.remote_chain_selector == expected.local_selector {
            return true;
        }
        warn!(
            tx_hash = %event.raw.tx_hash,
            remote_chain_selector = %event.remote_chain_selector,
            expected = %expected.local_selector,
            "Skipping finalization step for another chain"
        );
        metrics::record_rejected_event(Direction::Withdrawal, "step_selector_mismatch");
        false
    });

    let matched = match_by_nonce(Direction::Withdrawal, eligible_sent, eligible_proven)?;
    let needs_to_be_finalized = remove_received(
        Direction::Withdrawal,
        matched.matched,
        received,
        ReceivedEvent::withdrawal_received_nonce,
    )?;

    let partition = WithdrawalPartition {
        needs_to_be_proven: into_events(matched.unmatched),
        needs_to_be_finalized: into_events(needs_to_be_finalized),
        missing_sent: matched.missing_sent,
    };

    debug!(
        needs_to_be_proven = partition.needs_to_be_proven.len(),
        needs_to_be_finalized = partition.needs_to_be_finalized.len(),
        missing_sent = partition.missing_sent.len(),
        "Partitioned withdrawals"
    );

    Ok(partition)
}
