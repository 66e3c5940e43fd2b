//! Log query collaborators
//!
//! The engine never talks to a node directly. It asks a [`LogQuery`] for logs
//! matching one indexed topic value and registers the filters it needs with a
//! [`FilterRegistry`]. Both are implemented by [`RpcLogPoller`] and mocked in
//! tests.
//!
//! [`RpcLogPoller`]: crate::evm::poller::RpcLogPoller

use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Query for logs of one event whose indexed topic matches any of `values`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedLogQuery {
    /// topic0 of the event
    pub event: B256,
    /// Emitting contract
    pub address: Address,
    /// Position of the indexed topic to match (1..=3)
    pub topic_index: usize,
    pub values: Vec<B256>,
    /// Only logs created at or after this instant
    pub since: DateTime<Utc>,
    /// Minimum confirmation depth
    pub confirmations: u64,
}

/// A named log filter registered with the log service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub name: String,
    pub addresses: Vec<Address>,
    /// topic0 values
    pub events: Vec<B256>,
    /// How long the log service keeps matching logs
    pub retention: Duration,
}

impl LogFilter {
    /// Whether this filter indexes `event` emitted by `address`
    pub fn covers(&self, address: &Address, event: &B256) -> bool {
        self.addresses.contains(address) && self.events.contains(event)
    }
}

/// Source of indexed logs
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait LogQuery: Send + Sync {
    /// Fetch logs matching the query.
    ///
    /// No matching logs is an empty result, not an error.
    async fn fetch_indexed_logs(&self, query: &IndexedLogQuery) -> eyre::Result<Vec<Log>>;
}

/// Registration of named log filters
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait FilterRegistry: Send + Sync {
    async fn register_filter(&self, filter: &LogFilter) -> eyre::Result<()>;

    async fn unregister_filter(&self, name: &str) -> eyre::Result<()>;
}
