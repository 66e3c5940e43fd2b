//! Pending transfer assembly
//!
//! Turns partitioned sent events into [`PendingTransfer`] records. Ready
//! transfers carry the payload for the next action, supplied by the caller in
//! the same order as the ready events.

use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::evm::SentEvent;
use crate::types::{
    ChainSelector, LogKey, LogMetadata, PendingTransfer, Transfer, TransferStage, TransferStatus,
};

/// Fields shared by every transfer of one token pair in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRoute {
    pub from: ChainSelector,
    pub to: ChainSelector,
    pub sender: Address,
    pub receiver: Address,
    pub local_token: Address,
    pub remote_token: Address,
}

impl TransferRoute {
    fn transfer(
        &self,
        event: &SentEvent,
        date: DateTime<Utc>,
        bridge_data: Bytes,
        stage: TransferStage,
    ) -> Transfer {
        Transfer {
            from: self.from,
            to: self.to,
            sender: self.sender,
            receiver: self.receiver,
            local_token_address: self.local_token,
            remote_token_address: self.remote_token,
            amount: event.amount,
            date,
            bridge_data,
            stage,
            native_bridge_fee: U256::ZERO,
        }
    }
}

/// Resolve the block timestamp of a sent log.
///
/// A missing join yields the Unix epoch rather than failing the batch.
fn resolve_date(key: &LogKey, metadata: &HashMap<LogKey, LogMetadata>) -> DateTime<Utc> {
    match metadata.get(key).and_then(|m| m.block_timestamp) {
        Some(timestamp) => timestamp,
        None => {
            debug!(log = %key, "No block timestamp for sent log, using zero time");
            DateTime::<Utc>::default()
        }
    }
}

/// Build pending transfers from not ready and ready sent events.
///
/// `ready_data[i]` is the bridge payload of `ready[i]`.
pub fn to_pending_transfers(
    route: &TransferRoute,
    not_ready: &[SentEvent],
    ready: &[SentEvent],
    ready_data: &[Bytes],
    metadata: &HashMap<LogKey, LogMetadata>,
) -> Result<Vec<PendingTransfer>> {
    if ready.len() != ready_data.len() {
        return Err(BridgeError::ReadyDataMismatch {
            ready: ready.len(),
            payloads: ready_data.len(),
        });
    }

    let mut transfers = Vec::with_capacity(not_ready.len() + ready.len());

    for event in not_ready {
        let key = event.raw.key();
        transfers.push(PendingTransfer {
            transfer: route.transfer(
                event,
                resolve_date(&key, metadata),
                Bytes::new(),
                TransferStage::Initiated,
            ),
            status: TransferStatus::NotReady,
            id: key.to_string(),
        });
    }

    for (event, data) in ready.iter().zip(ready_data) {
        let key = event.raw.key();
        transfers.push(PendingTransfer {
            transfer: route.transfer(
                event,
                resolve_date(&key, metadata),
                data.clone(),
                TransferStage::FinalizationReady,
            ),
            status: TransferStatus::Ready,
            id: key.to_string(),
        });
    }

    Ok(transfers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn route() -> TransferRoute {
        TransferRoute {
            from: L1_SELECTOR,
            to: L2_SELECTOR,
            sender: L1_MANAGER,
            receiver: L2_MANAGER,
            local_token: L1_TOKEN,
            remote_token: L2_TOKEN,
        }
    }

    fn metadata(events: &[&SentEvent], timestamp: i64) -> HashMap<LogKey, LogMetadata> {
        events
            .iter()
            .map(|e| {
                (
                    e.raw.key(),
                    LogMetadata {
                        block_number: e.raw.block_number,
                        block_timestamp: DateTime::<Utc>::from_timestamp(timestamp, 0),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_pending_transfers() {
        let not_ready = vec![deposit_sent(1, 1)];
        let ready = vec![deposit_sent(2, 2)];
        let meta = metadata(&[&not_ready[0], &ready[0]], 1_700_000_000);

        let transfers = to_pending_transfers(
            &route(),
            &not_ready,
            &ready,
            &[ready[0].bridge_return_data.clone()],
            &meta,
        )
        .unwrap();

        assert_eq!(transfers.len(), 2);

        let first = &transfers[0];
        assert_eq!(first.status, TransferStatus::NotReady);
        assert_eq!(first.transfer.stage, TransferStage::Initiated);
        assert!(first.transfer.bridge_data.is_empty());
        assert_eq!(first.transfer.amount, not_ready[0].amount);
        assert_eq!(first.transfer.date.timestamp(), 1_700_000_000);
        assert_eq!(first.id, format!("{}-0", not_ready[0].raw.tx_hash));

        let second = &transfers[1];
        assert_eq!(second.status, TransferStatus::Ready);
        assert_eq!(second.transfer.stage, TransferStage::FinalizationReady);
        assert_eq!(second.transfer.bridge_data, nonce(2));
        assert_eq!(second.transfer.sender, L1_MANAGER);
        assert_eq!(second.transfer.receiver, L2_MANAGER);
        assert_eq!(second.transfer.remote_token_address, L2_TOKEN);
        assert_eq!(second.transfer.native_bridge_fee, U256::ZERO);
    }

    #[test]
    fn test_missing_metadata_uses_zero_time() {
        let not_ready = vec![deposit_sent(1, 1)];
        let transfers =
            to_pending_transfers(&route(), &not_ready, &[], &[], &HashMap::new()).unwrap();
        assert_eq!(transfers[0].transfer.date, DateTime::<Utc>::default());
        assert_eq!(transfers[0].transfer.date.timestamp(), 0);
    }

    #[test]
    fn test_ready_data_mismatch() {
        let ready = vec![deposit_sent(1, 1), deposit_sent(2, 2)];
        let err = to_pending_transfers(&route(), &[], &ready, &[nonce(1)], &HashMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ReadyDataMismatch {
                ready: 2,
                payloads: 1
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        let transfers = to_pending_transfers(&route(), &[], &[], &[], &HashMap::new()).unwrap();
        assert!(transfers.is_empty());
    }
}
