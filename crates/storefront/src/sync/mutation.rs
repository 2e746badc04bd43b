//! Optimistic cart mutations with rollback and per-target ordering.
//!
//! Every mutation follows the same shape: snapshot the cached cart, write
//! the predicted next state synchronously (the UI updates instantly), run
//! the network call, then reconcile - server truth wins on success, the
//! snapshot is restored on failure.
//!
//! Rapid mutations against the same target (a quantity stepper clicked
//! three times) must land in issue order even when the network completes
//! out of order. Each mutation carries a per-target sequence number; a
//! server response whose sequence is not the newest applied for its target
//! is discarded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use meridian_core::Cart;

use crate::cart::{CartOp, MutationTarget, predict};
use crate::error::ClientError;
use crate::sync::key::CacheKey;
use crate::sync::store::{CacheStore, EntryPatch, lock};

#[derive(Default)]
struct OrderingState {
    /// Highest sequence handed out per target.
    issued: HashMap<MutationTarget, u64>,
    /// Highest sequence whose server response has been written back.
    applied: HashMap<MutationTarget, u64>,
}

impl OrderingState {
    fn next_seq(&mut self, target: &MutationTarget) -> u64 {
        let counter = self.issued.entry(target.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn applied_seq(&self, target: &MutationTarget) -> u64 {
        self.applied.get(target).copied().unwrap_or(0)
    }

    /// Mark every target's in-flight work as superseded. Used by `Clear`:
    /// a line response landing after the cart was emptied must not
    /// resurrect the line.
    fn supersede_all(&mut self) {
        let issued: Vec<(MutationTarget, u64)> = self
            .issued
            .iter()
            .map(|(t, s)| (t.clone(), *s))
            .collect();
        for (target, seq) in issued {
            let applied = self.applied.entry(target).or_insert(0);
            if seq > *applied {
                *applied = seq;
            }
        }
    }
}

/// Coordinates optimistic mutations against the cart's cache entry.
///
/// Cheaply cloneable; clones share ordering state and the store.
pub struct MutationCoordinator {
    store: CacheStore<Cart>,
    key: CacheKey,
    ordering: Arc<Mutex<OrderingState>>,
}

impl Clone for MutationCoordinator {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            ordering: Arc::clone(&self.ordering),
        }
    }
}

impl MutationCoordinator {
    /// Create a coordinator writing through to the cart entry at `key`.
    #[must_use]
    pub fn new(store: CacheStore<Cart>, key: CacheKey) -> Self {
        Self {
            store,
            key,
            ordering: Arc::new(Mutex::new(OrderingState::default())),
        }
    }

    /// Apply `op` optimistically, run `server_call`, reconcile.
    ///
    /// On success the server's cart is written over the prediction unless a
    /// later mutation for the same target already landed, in which case the
    /// response is discarded and the newer cached state returned. On failure
    /// the pre-mutation snapshot is restored (unless a later mutation
    /// superseded it) and the error propagated to the caller, who owns user
    /// feedback.
    ///
    /// `Clear` is performed unconditionally once invoked; confirmation is a
    /// UI concern.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for out-of-range quantities (no network
    /// call is made); otherwise whatever `server_call` failed with.
    pub async fn mutate<Fut>(&self, op: CartOp, server_call: Fut) -> Result<Cart, ClientError>
    where
        Fut: Future<Output = Result<Cart, ClientError>>,
    {
        op.validate()?;
        let target = op.target();

        // Sequence allocation, snapshot, and the optimistic write happen
        // under the ordering lock so concurrent mutations cannot interleave
        // between them. `predict` is pure and the lock never spans an await.
        let (seq, snapshot) = {
            let mut ordering = lock(&self.ordering);
            let seq = ordering.next_seq(&target);
            let snapshot = self.store.read(&self.key).and_then(|entry| entry.data);
            let predicted = predict(snapshot.as_ref().unwrap_or(&Cart::default()), &op);
            self.store.write(&self.key, EntryPatch::optimistic(predicted));
            (seq, snapshot)
        };

        match server_call.await {
            Ok(cart) => {
                let mut ordering = lock(&self.ordering);
                if seq > ordering.applied_seq(&target) {
                    ordering.applied.insert(target.clone(), seq);
                    if matches!(op, CartOp::Clear) {
                        ordering.supersede_all();
                    }
                    // Written while holding the ordering lock so two
                    // write-backs for the same target cannot land reversed.
                    self.store.write(&self.key, EntryPatch::fresh(cart.clone()));
                    Ok(cart)
                } else {
                    tracing::debug!(
                        ?target,
                        seq,
                        applied = ordering.applied_seq(&target),
                        "discarding superseded mutation response"
                    );
                    let current = self.store.read(&self.key).and_then(|entry| entry.data);
                    Ok(current.unwrap_or(cart))
                }
            }
            Err(error) => {
                let ordering = lock(&self.ordering);
                let superseded = ordering.issued.get(&target).copied().unwrap_or(0) > seq
                    || ordering.applied_seq(&target) >= seq;
                if superseded {
                    // A newer mutation owns the entry now; restoring our
                    // older snapshot would clobber it.
                    tracing::debug!(?target, seq, "skipping rollback, target superseded");
                } else {
                    tracing::warn!(?target, seq, %error, "mutation failed, rolling back");
                    self.store.write(&self.key, EntryPatch::restore(snapshot));
                }
                Err(error)
            }
        }
    }

    /// Forget all ordering state (session reset).
    pub fn reset(&self) {
        let mut ordering = lock(&self.ordering);
        *ordering = OrderingState::default();
    }
}
