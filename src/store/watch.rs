use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::models::Book;
use crate::session::Identity;

/// Invoked with the owner's refreshed book list after each mutation.
///
/// Callbacks run on the mutating call's thread and must not call back into
/// the store.
pub type WatchCallback = Box<dyn Fn(&[Book]) + Send + Sync>;

struct Watcher {
    id: u64,
    owner: Identity,
    callback: WatchCallback,
}

/// Registry of live-list observers. One registration per active view,
/// nothing global; dropping the returned `Subscription` detaches it.
#[derive(Default)]
pub(crate) struct WatchRegistry {
    watchers: Mutex<Vec<Watcher>>,
    next_id: AtomicU64,
}

impl WatchRegistry {
    pub fn register(
        registry: &Arc<WatchRegistry>,
        owner: Identity,
        callback: WatchCallback,
    ) -> Subscription {
        let id = registry.next_id.fetch_add(1, Ordering::Relaxed);
        lock_watchers(&registry.watchers).push(Watcher {
            id,
            owner,
            callback,
        });
        Subscription {
            registry: Arc::downgrade(registry),
            id,
        }
    }

    pub fn notify(&self, owner: &Identity, books: &[Book]) {
        let watchers = lock_watchers(&self.watchers);
        for watcher in watchers.iter().filter(|w| &w.owner == owner) {
            (watcher.callback)(books);
        }
    }

    fn unregister(&self, id: u64) {
        lock_watchers(&self.watchers).retain(|w| w.id != id);
    }
}

fn lock_watchers(watchers: &Mutex<Vec<Watcher>>) -> std::sync::MutexGuard<'_, Vec<Watcher>> {
    watchers.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle for a watch registration; dropping it unregisters the callback.
pub struct Subscription {
    registry: Weak<WatchRegistry>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}
