// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Receiving side of the engine's broadcast streams.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// A live subscription to one of the engine's event streams.
///
/// Events arrive in publish order. A subscriber that falls behind skips the
/// oldest events rather than blocking publishers. Dropping the subscription
/// or calling [`Subscription::unsubscribe`] ends delivery.
#[derive(Debug)]
pub struct Subscription<T: Clone> {
    rx: broadcast::Receiver<T>,
    stream: &'static str,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(rx: broadcast::Receiver<T>, stream: &'static str) -> Self {
        Subscription { rx, stream }
    }

    /// Waits for the next event. Returns `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(stream = self.stream, skipped, "subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(stream = self.stream, skipped, "subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains every buffered event.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn unsubscribe(self) {}
}
