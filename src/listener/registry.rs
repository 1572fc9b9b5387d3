//! Ordered listener registry.
//!
//! Entries are unique by allocation and kept in insertion order, which is
//! also the notification order. `notify_all` works on a snapshot taken
//! under the lock, so listeners may add or remove entries (including
//! themselves) while being notified.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::identifiers::ListenerId;

use super::SocketListener;

// ============================================================================
// Types
// ============================================================================

/// One registered listener.
struct Entry<L: ?Sized> {
    id: ListenerId,
    listener: Arc<L>,
}

impl<L: ?Sized> Clone for Entry<L> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
        }
    }
}

/// Returns `true` if both handles point at the same allocation.
#[inline]
fn same_allocation<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Insertion-ordered set of listeners, unique by reference identity.
///
/// Thread-safe; every operation takes the internal lock briefly and never
/// holds it while listener code runs.
pub struct ListenerRegistry<L: ?Sized = dyn SocketListener> {
    entries: Mutex<Vec<Entry<L>>>,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ListenerId> = self.entries.lock().iter().map(|e| e.id).collect();
        f.debug_struct("ListenerRegistry").field("ids", &ids).finish()
    }
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    ///
    /// Appends the listener unless the same allocation is already present,
    /// in which case the existing token is returned and nothing changes.
    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries
            .iter()
            .find(|e| same_allocation(&e.listener, &listener))
        {
            trace!(id = %existing.id, "Listener already registered");
            return existing.id;
        }

        let id = ListenerId::generate();
        entries.push(Entry { id, listener });
        trace!(%id, count = entries.len(), "Listener registered");
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `false` if no such listener is registered.
    pub fn remove(&self, id: &ListenerId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|e| e.id == *id) {
            Some(index) => {
                entries.remove(index);
                trace!(%id, "Listener removed");
                true
            }
            None => false,
        }
    }

    /// Removes the entry sharing `listener`'s allocation.
    ///
    /// Returns `false` if the listener is not registered.
    pub fn remove_listener(&self, listener: &Arc<L>) -> bool {
        let mut entries = self.entries.lock();
        match entries
            .iter()
            .position(|e| same_allocation(&e.listener, listener))
        {
            Some(index) => {
                let entry = entries.remove(index);
                trace!(id = %entry.id, "Listener removed");
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `listener`'s allocation is registered.
    #[must_use]
    pub fn contains(&self, listener: &Arc<L>) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| same_allocation(&e.listener, listener))
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no listener is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the registered ids in notification order.
    #[must_use]
    pub fn ids(&self) -> Vec<ListenerId> {
        self.entries.lock().iter().map(|e| e.id).collect()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Invokes `action` on every listener, in insertion order.
    ///
    /// Runs synchronously on the caller's context over a snapshot of the
    /// registry; changes made during the pass apply to the next one.
    pub fn notify_all(&self, mut action: impl FnMut(&L)) {
        let snapshot: Vec<Entry<L>> = self.entries.lock().clone();

        for entry in &snapshot {
            action(&*entry.listener);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
