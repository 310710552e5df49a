//! Operations issued before initialization completes.
//!
//! The queue is drained exactly once. Closing it and taking its contents is
//! one step under the same lock a push checks, so no operation can be queued
//! after the drain has started.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

pub type PendingFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct PendingOperation {
    pub label: String,
    pub run: Box<dyn FnOnce() -> PendingFuture + Send>,
}

#[derive(Default)]
struct QueueState {
    closed: bool,
    ops: VecDeque<PendingOperation>,
}

#[derive(Default)]
pub struct PendingQueue {
    state: Mutex<QueueState>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `op`, or hands it back if the queue has already been drained.
    pub fn push(&self, op: PendingOperation) -> Result<(), PendingOperation> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(op);
        }
        state.ops.push_back(op);
        Ok(())
    }

    /// Closes the queue and returns its operations in FIFO order.
    pub fn close(&self) -> Vec<PendingOperation> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state.ops.drain(..).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ops
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
