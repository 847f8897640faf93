use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, join_all};

type Listener<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// A notification with any number of async listeners.
///
/// Listeners may be added at any time, including while a notification is in
/// flight; they see every notification fired after registration.
pub struct UpdateEvent<T> {
    listeners: Mutex<Vec<Listener<T>>>,
}

impl<T> Default for UpdateEvent<T> {
    fn default() -> Self {
        UpdateEvent {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone + Send + 'static> UpdateEvent<T> {
    pub fn new() -> Self {
        UpdateEvent::default()
    }

    pub fn listen<F>(&self, listener: F)
    where
        F: Fn(T) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.registry().push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.registry().len()
    }

    /// Deliver `value` to every listener and wait for all of them. Listeners
    /// run concurrently.
    pub async fn fire(&self, value: T) {
        // Snapshot so the lock is not held across the await.
        let listeners: Vec<Listener<T>> = self.registry().clone();
        join_all(listeners.iter().map(|listener| listener(value.clone()))).await;
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Vec<Listener<T>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
