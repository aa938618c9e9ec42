// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot readiness gates. A producer resolves the gate exactly once; any
// number of consumers can poll it without blocking or await it.

use docflat_core::error::{DocflatError, Result};
use tokio::sync::watch;

/// Producer half of a readiness gate.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: watch::Sender<Option<T>>,
}

/// Consumer half of a readiness gate. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Readiness<T> {
    rx: watch::Receiver<Option<T>>,
}

/// Create an unresolved gate.
pub fn readiness<T>() -> (Resolver<T>, Readiness<T>) {
    let (tx, rx) = watch::channel(None);
    (Resolver { tx }, Readiness { rx })
}

impl<T> Resolver<T> {
    /// Resolve the gate, waking every waiter.
    pub fn resolve(self, value: T) {
        // `send_replace` succeeds even when every consumer is gone.
        self.tx.send_replace(Some(value));
    }
}

impl<T: Clone> Readiness<T> {
    /// A gate that is already resolved.
    pub fn resolved(value: T) -> Self {
        let (_tx, rx) = watch::channel(Some(value));
        Self { rx }
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The resolved value, or `None` while still pending. Never blocks.
    pub fn try_get(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Suspend until the gate resolves.
    ///
    /// Fails with `DecodeNotReady` if the resolver is dropped without ever
    /// resolving.
    pub async fn wait(&mut self) -> Result<T> {
        let guard = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| DocflatError::DecodeNotReady)?;
        (*guard).clone().ok_or(DocflatError::DecodeNotReady)
    }
}
