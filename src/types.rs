//! Common types for liquidity transfer reconciliation
//!
//! Chain selectors, transfer status/stage vocabulary, and the
//! [`PendingTransfer`] records handed to the rebalancing layer.

use alloy::primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Chain Selector
// ============================================================================

/// Opaque 64-bit chain identifier
///
/// Selectors are assigned off-chain and appear as indexed `uint64` topics on
/// liquidity manager events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainSelector(pub u64);

impl ChainSelector {
    /// Get the raw selector value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Encode as an indexed event topic (left-padded to 32 bytes)
    pub fn to_topic(&self) -> B256 {
        B256::left_padding_from(&self.0.to_be_bytes())
    }
}

impl fmt::Display for ChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainSelector {
    fn from(selector: u64) -> Self {
        ChainSelector(selector)
    }
}

/// Direction of a liquidity transfer relative to the rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// L1 -> L2, finalized by the native bridge in a single hop
    Deposit,
    /// L2 -> L1, proven then finalized on L1
    Withdrawal,
}

impl Direction {
    /// Get the direction as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Deposit => "deposit",
            Direction::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Transfer status and stage
// ============================================================================

/// Whether a transfer can be acted upon by the destination liquidity manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Sent, but the bridge has not reached a finalizable step yet
    NotReady,
    /// Finalizable; `bridge_data` carries the payload for the next action
    Ready,
}

impl TransferStatus {
    /// Get the status as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::NotReady => "not_ready",
            TransferStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle stage reported with every pending transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum TransferStage {
    /// Initiated on the source chain, not yet finalizable
    Initiated = 1,
    /// The bridge step is complete and the transfer can be finalized
    FinalizationReady = 2,
}

impl TransferStage {
    /// Numeric stage as consumed by the rebalancer
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

// ============================================================================
// Log provenance
// ============================================================================

/// Identifies a log by transaction hash and log index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogKey {
    pub tx_hash: B256,
    pub log_index: u64,
}

impl LogKey {
    pub fn new(tx_hash: B256, log_index: u64) -> Self {
        Self { tx_hash, log_index }
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tx_hash, self.log_index)
    }
}

/// Block metadata attached to a log by the log service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMetadata {
    pub block_number: u64,
    /// Not every node populates `blockTimestamp` on logs
    pub block_timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Pending transfers
// ============================================================================

/// Canonical fields of a liquidity transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ChainSelector,
    pub to: ChainSelector,
    /// Liquidity manager on the source chain
    pub sender: Address,
    /// Liquidity manager on the destination chain
    pub receiver: Address,
    pub local_token_address: Address,
    pub remote_token_address: Address,
    pub amount: U256,
    pub date: DateTime<Utc>,
    /// Payload for the next action to submit
    pub bridge_data: Bytes,
    pub stage: TransferStage,
    pub native_bridge_fee: U256,
}

/// A transfer in flight, synthesized fresh from the event streams on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub transfer: Transfer,
    pub status: TransferStatus,
    /// `"{tx_hash}-{log_index}"` of the originating sent log
    pub id: String,
}
