use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Change listeners for one store.
///
/// Listeners take no arguments; they re-query the store they subscribed to.
#[derive(Clone, Default)]
pub struct Listeners {
    registry: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
            active: true,
        }
    }

    /// Call every registered listener, synchronously.
    ///
    /// The registry lock is released before the calls, so a listener may
    /// subscribe, unsubscribe or read the store.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `subscribe`; dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Keep the listener registered for as long as the store lives
    pub fn detach(mut self) {
        self.active = false;
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_calls_every_listener() {
        let listeners = Listeners::new();
        let (a, listen_a) = counter();
        let (b, listen_b) = counter();
        let _sa = listeners.subscribe(listen_a);
        let _sb = listeners.subscribe(listen_b);

        listeners.notify();
        listeners.notify();

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let listeners = Listeners::new();
        let (count, listen) = counter();
        let subscription = listeners.subscribe(listen);

        listeners.notify();
        subscription.unsubscribe();
        listeners.notify();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes_and_detach_keeps() {
        let listeners = Listeners::new();
        let (dropped, listen_dropped) = counter();
        let (kept, listen_kept) = counter();

        drop(listeners.subscribe(listen_dropped));
        listeners.subscribe(listen_kept).detach();

        listeners.notify();
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_listener_may_touch_registry() {
        let listeners = Listeners::new();
        let inner = listeners.clone();
        let _s = listeners.subscribe(move || {
            // Would deadlock if notify held the lock
            assert_eq!(inner.len(), 1);
        });
        listeners.notify();
    }
}
