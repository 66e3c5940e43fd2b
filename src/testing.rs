//! Event fixtures shared by unit tests

use alloy::primitives::{Address, Bytes, Log as PrimitiveLog, LogData, B256, U256};
use alloy::rpc::types::Log;

use crate::evm::{BridgeFinalizedEvent, FinalizationStepEvent, LiquidityTransferredEvent, LogRef};
use crate::nonce::encode_nonce;
use crate::types::ChainSelector;

pub const L1_SELECTOR: ChainSelector = ChainSelector(5009297550715157269);
pub const L2_SELECTOR: ChainSelector = ChainSelector(3734403246176062136);

pub const L1_TOKEN: Address = Address::repeat_byte(0x11);
pub const L2_TOKEN: Address = Address::repeat_byte(0x22);
pub const L1_MANAGER: Address = Address::repeat_byte(0xa1);
pub const L2_MANAGER: Address = Address::repeat_byte(0xa2);
pub const L1_BRIDGE_ADAPTER: Address = Address::repeat_byte(0xb1);
pub const OTHER: Address = Address::repeat_byte(0xee);

pub fn nonce(n: u64) -> Bytes {
    encode_nonce(U256::from(n))
}

pub fn log_ref(tx: u8, log_index: u64) -> LogRef {
    LogRef {
        tx_hash: B256::with_last_byte(tx),
        log_index,
        block_number: 100 + tx as u64,
    }
}

/// Sent event carrying `nonce` in its return data
pub fn sent(
    from_selector: ChainSelector,
    to_selector: ChainSelector,
    to: Address,
    nonce_value: u64,
    tx: u8,
) -> LiquidityTransferredEvent {
    LiquidityTransferredEvent {
        ocr_seq_num: tx as u64,
        from_chain_selector: from_selector,
        to_chain_selector: to_selector,
        from: OTHER,
        to,
        amount: U256::from(1_000 * nonce_value.max(1)),
        bridge_specific_data: Bytes::new(),
        bridge_return_data: nonce(nonce_value),
        raw: log_ref(tx, 0),
    }
}

/// Deposit-direction sent event addressed to the L2 manager
pub fn deposit_sent(nonce_value: u64, tx: u8) -> LiquidityTransferredEvent {
    sent(L1_SELECTOR, L2_SELECTOR, L2_MANAGER, nonce_value, tx)
}

/// Withdrawal-direction sent event addressed to the L1 manager
pub fn withdrawal_sent(nonce_value: u64, tx: u8) -> LiquidityTransferredEvent {
    sent(L2_SELECTOR, L1_SELECTOR, L1_MANAGER, nonce_value, tx)
}

/// Received event carrying `nonce` in its bridge-specific data
pub fn received(nonce_value: u64, tx: u8) -> LiquidityTransferredEvent {
    LiquidityTransferredEvent {
        bridge_specific_data: nonce(nonce_value),
        bridge_return_data: Bytes::new(),
        raw: log_ref(tx, 1),
        ..sent(L1_SELECTOR, L2_SELECTOR, L2_MANAGER, nonce_value, tx)
    }
}

pub fn finalized(
    nonce_value: u64,
    remote_token: Address,
    from: Address,
    to: Address,
    tx: u8,
) -> BridgeFinalizedEvent {
    BridgeFinalizedEvent {
        local_token: L2_TOKEN,
        remote_token,
        from,
        to,
        amount: U256::from(1_000 * nonce_value.max(1)),
        extra_data: nonce(nonce_value),
        raw: log_ref(tx, 2),
    }
}

/// Finalized event with every participant matching the fixtures
pub fn deposit_finalized(nonce_value: u64, tx: u8) -> BridgeFinalizedEvent {
    finalized(nonce_value, L1_TOKEN, L1_BRIDGE_ADAPTER, L2_MANAGER, tx)
}

pub fn proven(nonce_value: u64, remote_selector: ChainSelector, tx: u8) -> FinalizationStepEvent {
    FinalizationStepEvent {
        ocr_seq_num: tx as u64,
        remote_chain_selector: remote_selector,
        bridge_specific_data: nonce(nonce_value),
        raw: log_ref(tx, 2),
    }
}

/// RPC log wrapping encoded event data
pub fn rpc_log(address: Address, data: LogData, tx: u8, log_index: u64, timestamp: Option<u64>) -> Log {
    Log {
        inner: PrimitiveLog { address, data },
        block_hash: Some(B256::with_last_byte(0xbb)),
        block_number: Some(100 + tx as u64),
        block_timestamp: timestamp,
        transaction_hash: Some(B256::with_last_byte(tx)),
        transaction_index: Some(0),
        log_index: Some(log_index),
        removed: false,
    }
}

pub fn sorted_nonces<'a>(events: impl IntoIterator<Item = &'a LiquidityTransferredEvent>) -> Vec<U256> {
    let mut nonces: Vec<U256> = events
        .into_iter()
        .map(|e| e.sent_nonce().unwrap())
        .collect();
    nonces.sort();
    nonces
}
