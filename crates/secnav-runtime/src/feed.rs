#![forbid(unsafe_code)]

//! Visibility batch feed.
//!
//! The environment's observer callback cannot borrow the navigator, so it
//! holds a [`BatchSender`] instead and the navigator drains the matching
//! [`BatchFeed`] as an iterator whenever it runs.
//!
//! # Invariants
//!
//! 1. Batches are yielded in the order they were sent.
//! 2. After [`BatchFeed::close`] every send is dropped and the iterator only
//!    yields what was already queued; a closed feed never reopens.
//! 3. Once the feed itself is dropped, senders become inert.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use secnav_core::VisibilityBatch;

#[derive(Debug, Default)]
struct FeedInner {
    queue: VecDeque<VisibilityBatch>,
    closed: bool,
    accepted: u64,
    dropped: u64,
}

/// Consumer side: a lazy sequence of visibility batches.
#[derive(Debug)]
pub struct BatchFeed {
    inner: Rc<RefCell<FeedInner>>,
}

impl BatchFeed {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(FeedInner::default())),
        }
    }

    /// A producer handle for the environment.
    #[must_use]
    pub fn sender(&self) -> BatchSender {
        BatchSender {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Stop accepting batches and discard anything still queued.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.closed = true;
        let discarded = inner.queue.len() as u64;
        inner.queue.clear();
        inner.dropped += discarded;
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Batches waiting to be consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Total batches accepted from senders.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.inner.borrow().accepted
    }

    /// Total batches refused or discarded after close.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.borrow().dropped
    }
}

impl Default for BatchFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for BatchFeed {
    type Item = VisibilityBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.borrow_mut().queue.pop_front()
    }
}

/// Producer side, held by the environment's observer callback.
#[derive(Debug, Clone)]
pub struct BatchSender {
    inner: Weak<RefCell<FeedInner>>,
}

impl BatchSender {
    /// Queue a batch. Returns `false` if the feed is closed or gone.
    pub fn send(&self, batch: VisibilityBatch) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut inner = inner.borrow_mut();
        if inner.closed {
            inner.dropped += 1;
            return false;
        }
        inner.queue.push_back(batch);
        inner.accepted += 1;
        true
    }

    /// Whether a send could currently succeed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| {
            let closed = inner.borrow().closed;
            !closed
        })
    }
}
