//! Liquidity Bridge: cross-chain liquidity transfer reconciliation
//!
//! Correlates the three event streams of a liquidity manager transfer by the
//! nonce the bridge adapter assigns at send time, and reports every in-flight
//! transfer with its lifecycle stage:
//!
//! - **Sent** - `LiquidityTransferred` on the source chain's liquidity manager
//! - **Bridge step** - native bridge finalization (deposits) or the withdrawal
//!   "proven" step (withdrawals)
//! - **Received** - `LiquidityTransferred` on the destination chain's liquidity manager
//!
//! ## Modules
//!
//! - `nonce` - Pack/unpack the uint256 transfer nonce
//! - `evm` - Contract bindings, typed events, log query collaborators, RPC log poller
//! - `matching` - Nonce matching and deposit/withdrawal partitioning
//! - `assembler` - Conversion of partitions into [`PendingTransfer`] records
//! - `quorum` - Nonce agreement check over independently proposed payloads
//! - `prover` - Withdrawal proof collaborator and payload encoding
//! - `bridge` - The [`Bridge`] facade and its direction strategies
//! - `config` - Environment-based bridge and poller configuration
//! - `metrics` - Prometheus metrics
//!
//! ## Usage
//!
//! ```ignore
//! let l1 = Arc::new(RpcLogPoller::new(&l1_poller_config)?);
//! let l2 = Arc::new(RpcLogPoller::new(&l2_poller_config)?);
//! let bridge = LiquidityBridge::deposit(
//!     config,
//!     ChainLogs::from_poller(l1),
//!     ChainLogs::from_poller(l2),
//!     DepositStrategy::new(l1_bridge_adapter, l2_standard_bridge),
//! )
//! .await?;
//! let transfers = bridge.get_transfers(l1_token, l2_token).await?;
//! ```

pub mod assembler;
pub mod bridge;
pub mod config;
pub mod error;
pub mod evm;
pub mod matching;
pub mod metrics;
pub mod nonce;
pub mod prover;
pub mod quorum;
pub mod types;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, ChainLogs, DepositStrategy, LiquidityBridge, TransferStrategy, WithdrawalStrategy};
pub use config::{BridgeConfig, PollerConfig};
pub use error::{BridgeError, Result};
pub use nonce::{decode_nonce, encode_nonce, NonceDecodeError};
pub use types::{
    ChainSelector, Direction, LogKey, LogMetadata, PendingTransfer, Transfer, TransferStage,
    TransferStatus,
};
