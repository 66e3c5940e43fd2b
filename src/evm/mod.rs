//! EVM Chain Support Module
//!
//! Everything the reconciliation engine needs from an EVM chain: event
//! bindings, typed event parsing, and the log query collaborators.
//!
//! ## Submodules
//!
//! - `contracts` - Liquidity manager, standard bridge and withdrawal bindings using alloy sol! macro
//! - `events` - Typed transfer events parsed from RPC logs
//! - `topics` - Read-only event signature/topic table
//! - `logs` - Log query and filter registry traits
//! - `poller` - Provider-backed implementation of the log traits

pub mod contracts;
pub mod events;
pub mod logs;
pub mod poller;
pub mod topics;

// Re-export commonly used items
pub use events::{
    BridgeFinalizedEvent, FinalizationStepEvent, LiquidityTransferredEvent, LogRef, ReceivedEvent,
    SentEvent, StepEvent,
};
pub use logs::{FilterRegistry, IndexedLogQuery, LogFilter, LogQuery};
pub use poller::RpcLogPoller;

#[cfg(any(test, feature = "test-utils"))]
pub use logs::{MockFilterRegistry, MockLogQuery};
