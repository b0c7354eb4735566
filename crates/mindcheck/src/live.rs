//! Push-based snapshot fan-out standing in for a hosted store's live queries.
//!
//! Every delivery carries the full snapshot, so listeners recompute from scratch and hold no
//! state across calls. Snapshots carry a revision; a listener never sees an older revision after
//! a newer one, however publishers and subscribers interleave. Subscriptions are explicit handles owned by whoever subscribed; the feed
//! never keeps a handle alive on its own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::RepositoryError;

pub type SnapshotListener<S> = Box<dyn FnMut(&S) + Send>;
pub type ErrorListener = Box<dyn FnOnce(RepositoryError) + Send>;

struct Delivery<S> {
    listener: SnapshotListener<S>,
    revision: u64,
}

struct Slot<S> {
    active: Arc<AtomicBool>,
    on_snapshot: Mutex<Delivery<S>>,
    on_error: Mutex<Option<ErrorListener>>,
}

impl<S> Slot<S> {
    fn deliver(&self, revision: u64, snapshot: &S) {
        let mut delivery = lock(&self.on_snapshot);
        if delivery.revision >= revision {
            return;
        }
        // Checked under the listener lock so a cancel that has returned is always observed.
        if self.active.load(Ordering::Acquire) {
            delivery.revision = revision;
            (delivery.listener)(snapshot);
        }
    }

    fn close_with(&self, error: RepositoryError) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(on_error) = lock(&self.on_error).take() {
                on_error(error);
            }
        }
    }
}

struct Registry<S> {
    next_id: u64,
    revision: u64,
    slots: BTreeMap<u64, Arc<Slot<S>>>,
    latest: Option<S>,
}

/// Broadcasts snapshots of `S` to every active subscriber.
pub struct LiveFeed<S> {
    registry: Arc<Mutex<Registry<S>>>,
}

impl<S> Clone for LiveFeed<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: Clone + Send + 'static> Default for LiveFeed<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + 'static> LiveFeed<S> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                revision: 0,
                slots: BTreeMap::new(),
                latest: None,
            })),
        }
    }

    /// Register listeners. The latest snapshot, if any, is delivered before this returns.
    ///
    /// Listeners must not publish to the feed they are subscribed to.
    pub fn subscribe<F, E>(&self, on_snapshot: F, on_error: E) -> Subscription
    where
        F: FnMut(&S) + Send + 'static,
        E: FnOnce(RepositoryError) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let slot = Arc::new(Slot {
            active: Arc::clone(&active),
            on_snapshot: Mutex::new(Delivery {
                listener: Box::new(on_snapshot),
                revision: 0,
            }),
            on_error: Mutex::new(Some(Box::new(on_error))),
        });

        let (id, revision, latest) = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.slots.insert(id, Arc::clone(&slot));
            (id, registry.revision, registry.latest.clone())
        };

        // A publish racing with this call may already have delivered something newer.
        if let Some(snapshot) = latest {
            slot.deliver(revision, &snapshot);
        }

        let registry: Weak<Mutex<Registry<S>>> = Arc::downgrade(&self.registry);
        Subscription::new(active, move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).slots.remove(&id);
            }
        })
    }

    /// Publish `snapshot` as the next revision after the current one.
    pub fn publish(&self, snapshot: S) {
        self.publish_at(None, snapshot);
    }

    /// Publish `snapshot` as `revision`. Returns false, delivering nothing, when the feed has
    /// already seen that revision or a later one.
    ///
    /// Writers that build snapshots under their own lock should take the revision under that
    /// same lock, so a snapshot computed earlier can never replace one computed later.
    pub fn publish_revision(&self, revision: u64, snapshot: S) -> bool {
        self.publish_at(Some(revision), snapshot)
    }

    fn publish_at(&self, revision: Option<u64>, snapshot: S) -> bool {
        let (revision, slots): (u64, Vec<Arc<Slot<S>>>) = {
            let mut registry = lock(&self.registry);
            let revision = revision.unwrap_or(registry.revision + 1);
            if revision <= registry.revision {
                return false;
            }
            registry.revision = revision;
            registry.latest = Some(snapshot.clone());
            (revision, registry.slots.values().cloned().collect())
        };

        for slot in slots {
            slot.deliver(revision, &snapshot);
        }
        true
    }

    /// Deliver `error` once to every current subscriber and close them. Later subscribers
    /// start fresh.
    pub fn fail(&self, error: RepositoryError) {
        let slots = std::mem::take(&mut lock(&self.registry).slots);
        for slot in slots.into_values() {
            slot.close_with(error.clone());
        }
    }

    pub fn latest(&self) -> Option<S> {
        lock(&self.registry).latest.clone()
    }

    pub fn revision(&self) -> u64 {
        lock(&self.registry).revision
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).slots.len()
    }
}

/// Handle to one live subscription. Dropping it cancels the subscription.
pub struct Subscription {
    active: Arc<AtomicBool>,
    detach: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new(active: Arc<AtomicBool>, detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            active,
            detach: Mutex::new(Some(Box::new(detach))),
        }
    }

    /// A handle that was never attached to anything.
    pub fn inert() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            detach: Mutex::new(None),
        }
    }

    /// Stop deliveries. Idempotent. Safe to call from inside a listener.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
        let detach = lock(&self.detach).take();
        if let Some(detach) = detach {
            detach();
        }
    }

    /// False once cancelled or closed by an error.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
