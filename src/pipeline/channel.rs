//! Bounded single-producer/single-consumer hand-off between two stages.
//!
//! A [`StageChannel`] is a FIFO of whole items plus a `closed` flag, both
//! guarded by one mutex. Producers wait on the `writable` notifier while the
//! queue is full, consumers wait on `readable` while it is empty. Closing the
//! channel is how "no more data" travels downstream: the consumer keeps
//! draining whatever is already queued and then sees [`EndOfStream`].
//!
//! The consumer can also give up on a channel with [`StageChannel::abandon`].
//! Pending items are dropped and the producer's next push fails, which is how
//! a stage that exits early (or fails) stops the stages feeding it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::Notify;

/// The channel is closed and fully drained.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("end of stream")]
pub struct EndOfStream;

/// A push was attempted after the channel was closed. Carries the rejected item.
pub struct ClosedError<T>(pub T);

impl<T> ClosedError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for ClosedError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosedError").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for ClosedError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("push on a closed channel")
    }
}

impl<T> std::error::Error for ClosedError<T> {}

/// Error returned by [`StageChannel::try_push`].
pub enum TryPushError<T> {
    /// The channel already holds `capacity` items.
    Full(T),
    /// The channel is closed.
    Closed(T),
}

impl<T> TryPushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

impl<T> fmt::Debug for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(_) => f.write_str("channel is full"),
            Self::Closed(_) => f.write_str("push on a closed channel"),
        }
    }
}

impl<T> std::error::Error for TryPushError<T> {}

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
    abandoned: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    readable: Notify,
    writable: Notify,
}

/// Bounded FIFO shared by exactly one producer stage and one consumer stage.
///
/// Cloning yields another handle to the same channel.
pub struct StageChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for StageChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for StageChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("StageChannel")
            .field("capacity", &self.shared.capacity)
            .field("len", &state.queue.len())
            .field("closed", &state.closed)
            .field("abandoned", &state.abandoned)
            .finish()
    }
}

impl<T> StageChannel<T> {
    /// Create an open channel holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::with_capacity(capacity.min(1024)),
                    closed: false,
                    abandoned: false,
                }),
                capacity,
                readable: Notify::new(),
                writable: Notify::new(),
            }),
        }
    }

    // Queue state is consistent between operations, so a panic elsewhere
    // while holding the lock leaves nothing half-written.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `item`, waiting while the channel is full.
    ///
    /// Fails immediately with the item handed back once the channel is
    /// closed, including when it gets closed while this call is waiting.
    pub async fn push(&self, item: T) -> Result<(), ClosedError<T>> {
        loop {
            let writable = self.shared.writable.notified();
            tokio::pin!(writable);
            // Register before inspecting state so a wake-up between the check
            // and the await is not lost.
            writable.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return Err(ClosedError(item));
                }
                if state.queue.len() < self.shared.capacity {
                    state.queue.push_back(item);
                    drop(state);
                    self.shared.readable.notify_one();
                    return Ok(());
                }
            }

            writable.await;
        }
    }

    /// Remove and return the head item, waiting while the channel is empty.
    ///
    /// Returns [`EndOfStream`] once the channel is closed and drained.
    pub async fn pop(&self) -> Result<T, EndOfStream> {
        loop {
            let readable = self.shared.readable.notified();
            tokio::pin!(readable);
            readable.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(item) = state.queue.pop_front() {
                    drop(state);
                    self.shared.writable.notify_one();
                    return Ok(item);
                }
                if state.closed {
                    return Err(EndOfStream);
                }
            }

            readable.await;
        }
    }

    /// Append `item` without waiting; a full channel rejects it.
    pub fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
        let mut state = self.lock();
        if state.closed {
            return Err(TryPushError::Closed(item));
        }
        if state.queue.len() >= self.shared.capacity {
            return Err(TryPushError::Full(item));
        }
        state.queue.push_back(item);
        drop(state);
        self.shared.readable.notify_one();
        Ok(())
    }

    /// Remove the head item without waiting. `Ok(None)` means empty but open.
    pub fn try_pop(&self) -> Result<Option<T>, EndOfStream> {
        let mut state = self.lock();
        match state.queue.pop_front() {
            Some(item) => {
                drop(state);
                self.shared.writable.notify_one();
                Ok(Some(item))
            }
            None if state.closed => Err(EndOfStream),
            None => Ok(None),
        }
    }

    /// Mark the channel closed and wake every waiter. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.readable.notify_waiters();
        self.shared.writable.notify_waiters();
    }

    /// Consumer side of [`close`](Self::close): the consumer is gone.
    ///
    /// Queued items are discarded and every later push fails with
    /// [`ClosedError`]. Idempotent; also valid on an already closed channel.
    pub fn abandon(&self) {
        let dropped = {
            let mut state = self.lock();
            if state.abandoned {
                return;
            }
            state.abandoned = true;
            state.closed = true;
            std::mem::take(&mut state.queue)
        };
        drop(dropped);
        self.shared.readable.notify_waiters();
        self.shared.writable.notify_waiters();
    }

    /// Whether the consumer abandoned the channel.
    pub fn is_abandoned(&self) -> bool {
        self.lock().abandoned
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}
