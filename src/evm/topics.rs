//! Event signature table
//!
//! Built once from the sol! bindings and never mutated afterwards.

use alloy::primitives::B256;
use alloy::sol_types::SolEvent;
use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::evm::contracts::{L2StandardBridge, LiquidityManager};

pub const LIQUIDITY_TRANSFERRED: &str = "LiquidityTransferred";
pub const FINALIZATION_STEP_COMPLETED: &str = "FinalizationStepCompleted";
pub const ERC20_BRIDGE_FINALIZED: &str = "ERC20BridgeFinalized";

/// Canonical signature and topic0 of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    pub signature: &'static str,
    pub topic: B256,
}

impl EventDescriptor {
    fn of<E: SolEvent>() -> Self {
        Self {
            signature: E::SIGNATURE,
            topic: E::SIGNATURE_HASH,
        }
    }
}

lazy_static! {
    pub static ref EVENT_TABLE: HashMap<&'static str, EventDescriptor> = {
        let mut table = HashMap::new();
        table.insert(
            LIQUIDITY_TRANSFERRED,
            EventDescriptor::of::<LiquidityManager::LiquidityTransferred>(),
        );
        table.insert(
            FINALIZATION_STEP_COMPLETED,
            EventDescriptor::of::<LiquidityManager::FinalizationStepCompleted>(),
        );
        table.insert(
            ERC20_BRIDGE_FINALIZED,
            EventDescriptor::of::<L2StandardBridge::ERC20BridgeFinalized>(),
        );
        table
    };
}

/// topic0 of a known event
///
/// Panics on an unknown name; names are the constants of this module.
pub fn topic(name: &str) -> B256 {
    EVENT_TABLE
        .get(name)
        .map(|d| d.topic)
        .unwrap_or_else(|| panic!("unknown event {name}"))
}

/// Reverse lookup of an event name by topic0
pub fn event_name(topic: &B256) -> Option<&'static str> {
    EVENT_TABLE
        .iter()
        .find(|(_, d)| d.topic == *topic)
        .map(|(name, _)| *name)
}
