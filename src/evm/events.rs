//! EVM Event Parsing
//!
//! Typed event structures for the three transfer streams, decoded from RPC
//! logs. Nonce accessors decode the nonce-bearing field of each event and
//! attach the transaction hash and raw payload to any failure.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use chrono::{DateTime, Utc};
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::evm::contracts::{L2StandardBridge, LiquidityManager};
use crate::nonce::{decode_nonce, NONCE_WORD_SIZE};
use crate::prover::decode_finalize_withdrawal_nonce;
use crate::types::{ChainSelector, LogKey, LogMetadata};

/// Provenance of a parsed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRef {
    /// Transaction hash
    pub tx_hash: B256,
    /// Log index within the block
    pub log_index: u64,
    /// Block number where the event was emitted
    pub block_number: u64,
}

impl LogRef {
    /// Extract provenance from an RPC log
    pub fn from_log(log: &Log) -> Result<Self> {
        Ok(Self {
            tx_hash: log
                .transaction_hash
                .ok_or_else(|| eyre!("Missing transaction hash"))?,
            log_index: log.log_index.ok_or_else(|| eyre!("Missing log index"))?,
            block_number: log
                .block_number
                .ok_or_else(|| eyre!("Missing block number"))?,
        })
    }

    pub fn key(&self) -> LogKey {
        LogKey::new(self.tx_hash, self.log_index)
    }
}

/// Block metadata of an RPC log, keyed for the assembler's date lookup
pub fn log_metadata(log: &Log) -> Result<(LogKey, LogMetadata)> {
    let raw = LogRef::from_log(log)?;
    let block_timestamp = log
        .block_timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0));
    Ok((
        raw.key(),
        LogMetadata {
            block_number: raw.block_number,
            block_timestamp,
        },
    ))
}

fn decode_event<E: SolEvent>(log: &Log) -> Result<E> {
    E::decode_log_data(log.data(), true)
        .map_err(|e| eyre!("Failed to decode {}: {}", E::SIGNATURE, e))
}

/// `LiquidityTransferred` event data
///
/// The same event kind marks both ends of a transfer: it is a sent event on
/// the source chain and a received event on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityTransferredEvent {
    /// OCR sequence number of the report that moved liquidity
    pub ocr_seq_num: u64,
    pub from_chain_selector: ChainSelector,
    pub to_chain_selector: ChainSelector,
    /// Emitting liquidity manager
    pub from: Address,
    /// Receiving liquidity manager
    pub to: Address,
    pub amount: U256,
    /// Nonce on received events
    pub bridge_specific_data: Bytes,
    /// Nonce on sent events
    pub bridge_return_data: Bytes,
    pub raw: LogRef,
}

/// A `LiquidityTransferred` log on the source chain
pub type SentEvent = LiquidityTransferredEvent;

/// A `LiquidityTransferred` log on the destination chain
pub type ReceivedEvent = LiquidityTransferredEvent;

impl LiquidityTransferredEvent {
    /// Parse from an RPC log
    pub fn from_log(log: &Log) -> Result<Self> {
        let event = decode_event::<LiquidityManager::LiquidityTransferred>(log)?;
        let raw = LogRef::from_log(log).wrap_err("LiquidityTransferred log")?;

        Ok(Self {
            ocr_seq_num: event.ocrSeqNum,
            from_chain_selector: ChainSelector(event.fromChainSelector),
            to_chain_selector: ChainSelector(event.toChainSelector),
            from: log.address(),
            to: event.to,
            amount: event.amount,
            bridge_specific_data: event.bridgeSpecificData,
            bridge_return_data: event.bridgeReturnData,
            raw,
        })
    }

    /// Nonce assigned by the bridge adapter (sent side)
    pub fn sent_nonce(&self) -> Result<U256, BridgeError> {
        decode_nonce(&self.bridge_return_data).map_err(|e| {
            BridgeError::nonce_decode(
                self.raw.tx_hash,
                "bridgeReturnData",
                &self.bridge_return_data,
                e,
            )
        })
    }

    /// Nonce echoed back on the destination chain (received side)
    pub fn received_nonce(&self) -> Result<U256, BridgeError> {
        decode_nonce(&self.bridge_specific_data).map_err(|e| {
            BridgeError::nonce_decode(
                self.raw.tx_hash,
                "bridgeSpecificData",
                &self.bridge_specific_data,
                e,
            )
        })
    }

    /// Nonce of a finalized withdrawal received on L1
    ///
    /// Finalizing echoes the whole finalize payload rather than a bare nonce
    /// word, so the nonce is read from the withdrawal message inside it.
    pub fn withdrawal_received_nonce(&self) -> Result<U256, BridgeError> {
        if self.bridge_specific_data.len() == NONCE_WORD_SIZE {
            return self.received_nonce();
        }
        decode_finalize_withdrawal_nonce(&self.bridge_specific_data).map_err(|e| {
            BridgeError::nonce_decode(
                self.raw.tx_hash,
                "bridgeSpecificData",
                &self.bridge_specific_data,
                e,
            )
        })
    }
}

/// `ERC20BridgeFinalized` event data (L2 standard bridge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeFinalizedEvent {
    /// Token on the chain that emitted the event
    pub local_token: Address,
    /// Token on the other side of the bridge
    pub remote_token: Address,
    /// Initiator on L1 (the bridge adapter)
    pub from: Address,
    /// Recipient on L2 (the liquidity manager)
    pub to: Address,
    pub amount: U256,
    /// Nonce passed through the bridge
    pub extra_data: Bytes,
    pub raw: LogRef,
}

impl BridgeFinalizedEvent {
    /// Parse from an RPC log
    pub fn from_log(log: &Log) -> Result<Self> {
        let event = decode_event::<L2StandardBridge::ERC20BridgeFinalized>(log)?;
        let raw = LogRef::from_log(log).wrap_err("ERC20BridgeFinalized log")?;

        Ok(Self {
            local_token: event.localToken,
            remote_token: event.remoteToken,
            from: event.from,
            to: event.to,
            amount: event.amount,
            extra_data: event.extraData,
            raw,
        })
    }
}

/// `FinalizationStepCompleted` event data (destination liquidity manager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationStepEvent {
    pub ocr_seq_num: u64,
    /// Chain the transfer came from
    pub remote_chain_selector: ChainSelector,
    /// Nonce of the transfer whose step completed
    pub bridge_specific_data: Bytes,
    pub raw: LogRef,
}

impl FinalizationStepEvent {
    /// Parse from an RPC log
    pub fn from_log(log: &Log) -> Result<Self> {
        let event = decode_event::<LiquidityManager::FinalizationStepCompleted>(log)?;
        let raw = LogRef::from_log(log).wrap_err("FinalizationStepCompleted log")?;

        Ok(Self {
            ocr_seq_num: event.ocrSeqNum,
            remote_chain_selector: ChainSelector(event.remoteChainSelector),
            bridge_specific_data: event.bridgeSpecificData,
            raw,
        })
    }
}

/// An intermediate bridge event that carries the transfer nonce
pub trait StepEvent: Clone + Send + Sync {
    /// Decode the nonce of the transfer this step belongs to
    fn nonce(&self) -> Result<U256, BridgeError>;

    fn raw(&self) -> &LogRef;
}

impl StepEvent for BridgeFinalizedEvent {
    fn nonce(&self) -> Result<U256, BridgeError> {
        decode_nonce(&self.extra_data).map_err(|e| {
            BridgeError::nonce_decode(self.raw.tx_hash, "extraData", &self.extra_data, e)
        })
    }

    fn raw(&self) -> &LogRef {
        &self.raw
    }
}

impl StepEvent for FinalizationStepEvent {
    fn nonce(&self) -> Result<U256, BridgeError> {
        decode_nonce(&self.bridge_specific_data).map_err(|e| {
            BridgeError::nonce_decode(
                self.raw.tx_hash,
                "bridgeSpecificData",
                &self.bridge_specific_data,
                e,
            )
        })
    }

    fn raw(&self) -> &LogRef {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::encode_nonce;
    use alloy::primitives::{Log as PrimitiveLog, LogData};

    fn rpc_log(address: Address, data: LogData, timestamp: Option<u64>) -> Log {
        Log {
            inner: PrimitiveLog { address, data },
            block_hash: Some(B256::with_last_byte(0xbb)),
            block_number: Some(42),
            block_timestamp: timestamp,
            transaction_hash: Some(B256::with_last_byte(0x01)),
            transaction_index: Some(0),
            log_index: Some(3),
            removed: false,
        }
    }

    #[test]
    fn test_liquidity_transferred_from_log() {
        let manager = Address::with_last_byte(0x10);
        let event = LiquidityManager::LiquidityTransferred {
            ocrSeqNum: 9,
            fromChainSelector: 1,
            toChainSelector: 2,
            to: Address::with_last_byte(0x20),
            amount: U256::from(1_000),
            bridgeSpecificData: Bytes::new(),
            bridgeReturnData: encode_nonce(U256::from(5)),
        };
        let log = rpc_log(manager, event.encode_log_data(), Some(1_700_000_000));

        let parsed = LiquidityTransferredEvent::from_log(&log).unwrap();
        assert_eq!(parsed.ocr_seq_num, 9);
        assert_eq!(parsed.from_chain_selector, ChainSelector(1));
        assert_eq!(parsed.to_chain_selector, ChainSelector(2));
        assert_eq!(parsed.from, manager);
        assert_eq!(parsed.amount, U256::from(1_000));
        assert_eq!(parsed.raw.log_index, 3);
        assert_eq!(parsed.sent_nonce().unwrap(), U256::from(5));
        assert!(parsed.received_nonce().is_err());
    }

    #[test]
    fn test_bridge_finalized_from_log() {
        let event = L2StandardBridge::ERC20BridgeFinalized {
            localToken: Address::with_last_byte(1),
            remoteToken: Address::with_last_byte(2),
            from: Address::with_last_byte(3),
            to: Address::with_last_byte(4),
            amount: U256::from(77),
            extraData: encode_nonce(U256::from(0x65)),
        };
        let log = rpc_log(Address::with_last_byte(0x42), event.encode_log_data(), None);

        let parsed = BridgeFinalizedEvent::from_log(&log).unwrap();
        assert_eq!(parsed.remote_token, Address::with_last_byte(2));
        assert_eq!(parsed.from, Address::with_last_byte(3));
        assert_eq!(parsed.nonce().unwrap(), U256::from(0x65));
    }

    #[test]
    fn test_finalization_step_from_log() {
        let event = LiquidityManager::FinalizationStepCompleted {
            ocrSeqNum: 4,
            remoteChainSelector: 10,
            bridgeSpecificData: encode_nonce(U256::from(8)),
        };
        let log = rpc_log(Address::with_last_byte(0x42), event.encode_log_data(), None);

        let parsed = FinalizationStepEvent::from_log(&log).unwrap();
        assert_eq!(parsed.remote_chain_selector, ChainSelector(10));
        assert_eq!(parsed.nonce().unwrap(), U256::from(8));
    }

    #[test]
    fn test_wrong_event_kind_is_rejected() {
        let event = LiquidityManager::FinalizationStepCompleted {
            ocrSeqNum: 4,
            remoteChainSelector: 10,
            bridgeSpecificData: Bytes::new(),
        };
        let log = rpc_log(Address::ZERO, event.encode_log_data(), None);
        assert!(LiquidityTransferredEvent::from_log(&log).is_err());
    }

    #[test]
    fn test_missing_tx_hash_is_rejected() {
        let event = LiquidityManager::FinalizationStepCompleted {
            ocrSeqNum: 4,
            remoteChainSelector: 10,
            bridgeSpecificData: Bytes::new(),
        };
        let mut log = rpc_log(Address::ZERO, event.encode_log_data(), None);
        log.transaction_hash = None;
        assert!(FinalizationStepEvent::from_log(&log).is_err());
    }

    #[test]
    fn test_withdrawal_received_nonce_reads_finalize_payload() {
        use crate::prover::encode_finalize_withdrawal_payload;
        use crate::prover::tests::sample_proof;

        let mut received = crate::testing::received(3, 9);
        assert_eq!(received.withdrawal_received_nonce().unwrap(), U256::from(3));

        received.bridge_specific_data = encode_finalize_withdrawal_payload(&sample_proof(7).withdrawal);
        assert_eq!(received.withdrawal_received_nonce().unwrap(), U256::from(7));
        assert!(received.received_nonce().is_err());

        received.bridge_specific_data = Bytes::from_static(&[0x01; 40]);
        assert!(matches!(
            received.withdrawal_received_nonce(),
            Err(BridgeError::NonceDecode { .. })
        ));
    }

    #[test]
    fn test_log_metadata_timestamp() {
        let event = LiquidityManager::FinalizationStepCompleted {
            ocrSeqNum: 1,
            remoteChainSelector: 1,
            bridgeSpecificData: Bytes::new(),
        };
        let log = rpc_log(Address::ZERO, event.encode_log_data(), Some(1_700_000_000));
        let (key, meta) = log_metadata(&log).unwrap();
        assert_eq!(key, LogKey::new(B256::with_last_byte(0x01), 3));
        assert_eq!(meta.block_number, 42);
        assert_eq!(meta.block_timestamp.unwrap().timestamp(), 1_700_000_000);

        let log = rpc_log(Address::ZERO, LogData::empty(), None);
        let (_, meta) = log_metadata(&log).unwrap();
        assert!(meta.block_timestamp.is_none());
    }
}
