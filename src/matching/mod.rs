//! Nonce matching
//!
//! Both directions reconcile the same way: index sent events by the nonce the
//! bridge adapter assigned, look every bridge step up in that index, then drop
//! transfers whose nonce already shows up on the destination chain. The
//! direction modules only decide which events are eligible.

pub mod deposit;
pub mod withdrawal;

use alloy::primitives::U256;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::error::Result;
use crate::evm::{ReceivedEvent, SentEvent, StepEvent};
use crate::metrics;
use crate::types::Direction;

pub use deposit::{partition_deposits, DepositExpectations, DepositPartition};
pub use withdrawal::{partition_withdrawals, WithdrawalExpectations, WithdrawalPartition};

/// Result of matching bridge steps against sent events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceMatch<S> {
    /// Sent events with at least one matching step
    pub matched: Vec<(U256, SentEvent)>,
    /// Sent events with no matching step
    pub unmatched: Vec<(U256, SentEvent)>,
    /// Steps whose nonce has no sent event
    pub missing_sent: Vec<S>,
}

/// Match eligible steps to eligible sent events by nonce.
///
/// Sent events keep their input order in both output sets. A repeated sent
/// nonce keeps the first event; a repeated step nonce matches only once.
pub fn match_by_nonce<'a, S, I, J>(direction: Direction, sent: I, steps: J) -> Result<NonceMatch<S>>
where
    S: StepEvent + 'a,
    I: IntoIterator<Item = &'a SentEvent>,
    J: IntoIterator<Item = &'a S>,
{
    let mut order = Vec::new();
    let mut index: HashMap<U256, (&SentEvent, bool)> = HashMap::new();

    for event in sent {
        let nonce = event.sent_nonce()?;
        match index.entry(nonce) {
            Entry::Vacant(slot) => {
                slot.insert((event, false));
                order.push(nonce);
            }
            Entry::Occupied(first) => {
                warn!(
                    direction = %direction,
                    nonce = %nonce,
                    tx_hash = %event.raw.tx_hash,
                    first_tx_hash = %first.get().0.raw.tx_hash,
                    "Duplicate sent nonce, keeping first event"
                );
            }
        }
    }

    let mut missing_sent = Vec::new();
    for step in steps {
        let nonce = step.nonce()?;
        match index.get_mut(&nonce) {
            Some((_, found)) if *found => {
                debug!(
                    direction = %direction,
                    nonce = %nonce,
                    tx_hash = %step.raw().tx_hash,
                    "Nonce already matched, ignoring repeated step"
                );
            }
            Some((_, found)) => *found = true,
            None => {
                warn!(
                    direction = %direction,
                    nonce = %nonce,
                    tx_hash = %step.raw().tx_hash,
                    "Bridge step has no matching sent event"
                );
                missing_sent.push(step.clone());
            }
        }
    }

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for nonce in order {
        if let Some((event, found)) = index.remove(&nonce) {
            if found {
                matched.push((nonce, event.clone()));
            } else {
                unmatched.push((nonce, event.clone()));
            }
        }
    }

    metrics::record_missing_sent(direction, missing_sent.len());

    Ok(NonceMatch {
        matched,
        unmatched,
        missing_sent,
    })
}

/// Drop transfers whose nonce appears in the received stream.
///
/// `received_nonce` reads the nonce the way the destination chain reports it.
pub fn remove_received<F>(
    direction: Direction,
    transfers: Vec<(U256, SentEvent)>,
    received: &[ReceivedEvent],
    received_nonce: F,
) -> Result<Vec<(U256, SentEvent)>>
where
    F: Fn(&ReceivedEvent) -> Result<U256>,
{
    let executed = received
        .iter()
        .map(received_nonce)
        .collect::<Result<HashSet<U256>>>()?;

    if executed.is_empty() {
        return Ok(transfers);
    }

    let before = transfers.len();
    let remaining: Vec<_> = transfers
        .into_iter()
        .filter(|(nonce, _)| !executed.contains(nonce))
        .collect();

    debug!(
        direction = %direction,
        received = received.len(),
        removed = before - remaining.len(),
        "Removed executed transfers"
    );

    Ok(remaining)
}

fn into_events(transfers: Vec<(U256, SentEvent)>) -> Vec<SentEvent> {
    transfers.into_iter().map(|(_, event)| event).collect()
}
