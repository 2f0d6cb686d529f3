//! Transaction state machine
//!
//! Tracks the single active transaction of a table handle and buffers its
//! mutations until commit. States: `idle → active → idle`; nesting is an
//! error. The buffer holds log operations in issue order; commit hands them
//! to the record store as one durable batch, abort drops them.
//!
//! Buffered mutations are invisible to reads: every reader observes the
//! last-committed state until the commit applies.

use crate::error::{Result, TabulaError};
use crate::log::Op;

/// Transaction state of one table handle
#[derive(Default)]
pub(crate) struct TxnState {
    /// The active transaction, if any
    current: Option<Txn>,

    /// Id for the next transaction begun on this handle
    next_id: u64,
}

struct Txn {
    id: u64,
    buffer: Vec<Op>,
}

impl TxnState {
    /// Whether a transaction is active
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Enter the active state
    pub fn begin(&mut self) -> Result<()> {
        if self.current.is_some() {
            return Err(TabulaError::TransactionState(
                "transaction already active".to_string(),
            ));
        }
        self.next_id += 1;
        self.current = Some(Txn {
            id: self.next_id,
            buffer: Vec::new(),
        });
        Ok(())
    }

    /// Buffer a mutation; no-op error when idle
    pub fn buffer(&mut self, op: Op) -> Result<()> {
        match self.current.as_mut() {
            Some(txn) => {
                txn.buffer.push(op);
                Ok(())
            }
            None => Err(TabulaError::TransactionState(
                "no active transaction".to_string(),
            )),
        }
    }

    /// Leave the active state, yielding `(id, buffered ops)` for commit
    pub fn take_for_commit(&mut self) -> Result<(u64, Vec<Op>)> {
        match self.current.take() {
            Some(txn) => Ok((txn.id, txn.buffer)),
            None => Err(TabulaError::TransactionState(
                "commit without an active transaction".to_string(),
            )),
        }
    }

    /// Leave the active state, discarding buffered mutations
    pub fn abort(&mut self) -> Result<()> {
        match self.current.take() {
            Some(_) => Ok(()),
            None => Err(TabulaError::TransactionState(
                "abort without an active transaction".to_string(),
            )),
        }
    }
}
