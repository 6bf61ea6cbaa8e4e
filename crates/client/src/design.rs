//! Design settings store.
//!
//! [`DesignStore`] owns the admin-configured [`DesignSettings`] for the whole
//! client. Reads never block on I/O and always yield a complete value: the
//! defaults until something is loaded. [`DesignStore::apply`] is the only
//! writer; it normalizes the backend shape, persists the result and calls
//! every listener before returning.
//!
//! Each write carries a revision number. A listener only ever moves forward:
//! when writes from several threads overlap, a delivery older than the one
//! the listener already saw is dropped, so its last value always matches
//! the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

use schoolhouse_core::{DesignSettings, RawDesignSettings};

use crate::storage::{KeyValueStore, get_json, keys, set_json};

type Callback = Box<dyn Fn(&DesignSettings) + Send + Sync>;

/// A registered listener and the newest revision it has been handed.
struct Listener {
    seen: Mutex<u64>,
    callback: Callback,
}

impl Listener {
    /// Call the listener unless it already saw `revision` or a later one.
    ///
    /// The revision lock is held across the call, so deliveries to one
    /// listener never interleave.
    fn deliver(&self, revision: u64, settings: &DesignSettings) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if revision <= *seen {
            return false;
        }
        *seen = revision;
        (self.callback)(settings);
        true
    }
}

/// Shared handle to the design settings.
#[derive(Clone)]
pub struct DesignStore {
    inner: Arc<DesignStoreInner>,
}

struct DesignStoreInner {
    storage: Arc<dyn KeyValueStore>,
    settings: watch::Sender<DesignSettings>,
    /// Revision of the value in `settings`; bumped together with it.
    revision: Mutex<u64>,
    listeners: Mutex<Vec<(u64, Arc<Listener>)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for DesignStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignStore")
            .field("settings", &*self.inner.settings.borrow())
            .field("listeners", &self.listeners().len())
            .finish()
    }
}

impl DesignStore {
    /// Create a store holding the default settings.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (settings, _) = watch::channel(DesignSettings::default());
        Self {
            inner: Arc::new(DesignStoreInner {
                storage,
                settings,
                revision: Mutex::new(1),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Create a store seeded from the last persisted settings.
    ///
    /// Missing or corrupt entries leave the defaults in place.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let persisted = get_json::<RawDesignSettings>(storage.as_ref(), keys::DESIGN_SETTINGS);
        let store = Self::new(storage);
        if let Some(raw) = persisted {
            store
                .inner
                .settings
                .send_replace(DesignSettings::normalize(&raw));
        }
        store
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Arc<Listener>)>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current settings.
    #[must_use]
    pub fn get_settings(&self) -> DesignSettings {
        self.inner.settings.borrow().clone()
    }

    fn revision(&self) -> MutexGuard<'_, u64> {
        self.inner
            .revision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current settings with their revision, read as one unit.
    fn snapshot(&self) -> (u64, DesignSettings) {
        let revision = self.revision();
        (*revision, self.get_settings())
    }

    /// Receiver for tasks that await changes instead of registering a
    /// callback.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<DesignSettings> {
        self.inner.settings.subscribe()
    }

    /// Register a listener.
    ///
    /// The listener is called once right away with the current settings and
    /// again after every [`DesignStore::apply`]. It stays registered until
    /// the returned [`Subscription`] is dropped or unsubscribed.
    ///
    /// A listener may subscribe or unsubscribe other listeners, but must not
    /// call [`DesignStore::apply`] on the same store.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DesignSettings) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            seen: Mutex::new(0),
            callback: Box::new(listener),
        });

        // Register before reading: an apply that lands in between either
        // shows up in the snapshot or delivers to this listener itself.
        self.listeners().push((id, Arc::clone(&listener)));
        let (revision, settings) = self.snapshot();
        listener.deliver(revision, &settings);

        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Replace the settings with the normalized form of `raw`.
    ///
    /// Every listener has seen the new value, or a newer one from an
    /// overlapping call, by the time this returns. A persistence failure is
    /// logged; the in-memory update still applies.
    pub fn apply(&self, raw: &RawDesignSettings) -> DesignSettings {
        let settings = DesignSettings::normalize(raw);
        let stored = RawDesignSettings::from(&settings);

        let revision = {
            let mut revision = self.revision();
            if let Err(e) = set_json(self.inner.storage.as_ref(), keys::DESIGN_SETTINGS, &stored)
            {
                tracing::warn!(error = %e, "Failed to persist design settings");
            }
            *revision += 1;
            self.inner.settings.send_replace(settings.clone());
            *revision
        };

        // Listeners may subscribe or unsubscribe, so call them with the list
        // unlocked.
        let listeners: Vec<Arc<Listener>> = self
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in &listeners {
            listener.deliver(revision, &settings);
        }

        tracing::debug!(
            theme = %settings.theme,
            default_mode = %settings.default_mode,
            listeners = listeners.len(),
            "Design settings applied"
        );
        settings
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    store: Weak<DesignStoreInner>,
    id: u64,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use schoolhouse_core::{ColorMode, ThemeName};

    use super::*;
    use crate::storage::MemoryStore;

    fn premium_dark() -> RawDesignSettings {
        RawDesignSettings {
            primary_color: Some("#7c3aed".to_string()),
            theme: Some("premium".to_string()),
            default_mode: Some("dark".to_string()),
            ..RawDesignSettings::default()
        }
    }

    #[test]
    fn test_defaults_before_anything_loads() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.get_settings(), DesignSettings::default());
    }

    #[test]
    fn test_subscriber_gets_current_value_immediately() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        store.apply(&premium_dark());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |s| sink.lock().unwrap().push(s.theme));

        assert_eq!(*seen.lock().unwrap(), vec![ThemeName::Premium]);
    }

    #[test]
    fn test_all_subscribers_notified_before_apply_returns() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let subs: Vec<_> = (0..3)
            .map(|_| {
                let calls = Arc::clone(&calls);
                store.subscribe(move |s| {
                    if s.theme == ThemeName::Premium {
                        calls.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        store.apply(&premium_dark());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        drop(subs);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        store.apply(&premium_dark());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_values_are_normalized_at_the_boundary() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        let applied = store.apply(&RawDesignSettings {
            primary_color: Some("rgb(1,2,3)".to_string()),
            theme: Some("  ".to_string()),
            ..RawDesignSettings::default()
        });
        assert_eq!(applied, DesignSettings::default());
    }

    #[test]
    fn test_applied_settings_persist_across_loads() {
        let storage = Arc::new(MemoryStore::new());
        DesignStore::new(storage.clone()).apply(&premium_dark());

        let reloaded = DesignStore::load(storage);
        let settings = reloaded.get_settings();
        assert_eq!(settings.primary_color, "#7C3AED");
        assert_eq!(settings.default_mode, ColorMode::Dark);
    }

    #[test]
    fn test_corrupt_persisted_settings_fall_back() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::DESIGN_SETTINGS, "[1, 2").unwrap();
        let store = DesignStore::load(storage);
        assert_eq!(store.get_settings(), DesignSettings::default());
    }

    #[test]
    fn test_older_delivery_is_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = Listener {
            seen: Mutex::new(0),
            callback: Box::new(move |s: &DesignSettings| sink.lock().unwrap().push(s.theme)),
        };
        let premium = DesignSettings::normalize(&premium_dark());

        assert!(listener.deliver(3, &premium));
        assert!(!listener.deliver(2, &DesignSettings::default()));
        assert!(!listener.deliver(3, &premium));
        assert_eq!(*seen.lock().unwrap(), vec![ThemeName::Premium]);
    }

    #[test]
    fn test_overlapping_applies_leave_listener_on_latest() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        let (entered_tx, entered_rx) = mpsc::channel();
        let entered_tx = Mutex::new(entered_tx);
        let last = Arc::new(Mutex::new(ThemeName::Modern));
        let sink = Arc::clone(&last);

        // The classic delivery stalls inside the listener, as if its thread
        // were preempted mid fan-out.
        let _sub = store.subscribe(move |s| {
            if s.theme == ThemeName::Classic {
                entered_tx.lock().unwrap().send(()).unwrap();
                thread::sleep(Duration::from_millis(100));
            }
            *sink.lock().unwrap() = s.theme;
        });

        let classic = {
            let store = store.clone();
            thread::spawn(move || {
                store.apply(&RawDesignSettings {
                    theme: Some("classic".to_string()),
                    ..RawDesignSettings::default()
                });
            })
        };
        entered_rx.recv().unwrap();

        let premium = {
            let store = store.clone();
            thread::spawn(move || {
                store.apply(&premium_dark());
            })
        };

        classic.join().unwrap();
        premium.join().unwrap();

        assert_eq!(store.get_settings().theme, ThemeName::Premium);
        assert_eq!(*last.lock().unwrap(), ThemeName::Premium);
    }

    #[test]
    fn test_watch_receiver_sees_apply() {
        let store = DesignStore::new(Arc::new(MemoryStore::new()));
        let mut rx = store.watch();
        store.apply(&premium_dark());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().theme, ThemeName::Premium);
    }
}
