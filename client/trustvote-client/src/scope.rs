//! Ties async work to the lifetime of a view.
//!
//! A [`ViewScope`] is owned by whatever renders a view. Controllers hold a
//! [`ScopeToken`] and run their network reads and confirmation waits through
//! [`ScopeToken::run`], which gives up as soon as the scope is cancelled or
//! dropped. Nothing is written back into the view afterwards.
use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

/// Returned by [`ScopeToken::run`] when the view went away first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the view was closed before the operation finished")]
pub struct Cancelled;

/// The lifetime of one view.
#[derive(Debug)]
pub struct ViewScope {
    cancel: watch::Sender<bool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    /// Opens a new scope.
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self { cancel }
    }

    /// A token controllers use to run work inside this scope.
    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            cancelled: Some(self.cancel.subscribe()),
        }
    }

    /// Cancels every operation running inside the scope.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether [`ViewScope::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// A handle on a [`ViewScope`].
///
/// The default token belongs to no view and is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct ScopeToken {
    cancelled: Option<watch::Receiver<bool>>,
}

impl ScopeToken {
    /// Whether the owning scope is cancelled or gone.
    pub fn is_cancelled(&self) -> bool {
        match &self.cancelled {
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
            None => false,
        }
    }

    /// Resolves once the owning scope is cancelled or dropped.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancelled else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Runs `fut` unless the scope ends first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }
}
