use std::fmt;
use std::sync::{Arc, Mutex};

use super::{lock, Readable, SettableStore, Subscribers, Unsubscribe};

struct WritableInner<T> {
    value: Mutex<T>,
    subscribers: Subscribers<T>,
    normalize: Option<fn(T) -> T>,
}

/// A cloneable handle to a shared value with push-on-subscribe notification.
///
/// `set` with a value equal to the current one is ignored, so a consumer that
/// needs an identical value to re-render must write a different value first.
pub struct WritableStore<T> {
    inner: Arc<WritableInner<T>>,
}

impl<T> Clone for WritableStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> WritableStore<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(WritableInner {
                value: Mutex::new(value),
                subscribers: Subscribers::new(),
                normalize: None,
            }),
        }
    }

    /// A store that passes every value through `normalize` before storing
    /// it, the initial one included. Equality is checked on the normalized
    /// value.
    pub fn normalized(value: T, normalize: fn(T) -> T) -> Self {
        Self {
            inner: Arc::new(WritableInner {
                value: Mutex::new(normalize(value)),
                subscribers: Subscribers::new(),
                normalize: Some(normalize),
            }),
        }
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Readable<T> for WritableStore<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let current = lock(&self.inner.value).clone();
        handler(&current);
        self.inner.subscribers.add(handler)
    }
}

impl<T> SettableStore<T> for WritableStore<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn set(&self, value: T) {
        let value = match self.inner.normalize {
            Some(normalize) => normalize(value),
            None => value,
        };
        {
            let mut current = lock(&self.inner.value);
            if *current == value {
                return;
            }
            *current = value.clone();
        }
        self.inner.subscribers.notify(&value);
    }

    fn get(&self) -> T {
        lock(&self.inner.value).clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for WritableStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WritableStore")
            .field("value", &*lock(&self.inner.value))
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_current_value_on_subscribe() {
        let store = WritableStore::new(5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _unsub = store.subscribe(move |v| sink.lock().unwrap().push(*v));

        store.set(6);
        assert_eq!(*seen.lock().unwrap(), vec![5, 6]);
    }

    #[test]
    fn equal_values_are_suppressed() {
        let store = WritableStore::new(Some(1.0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _unsub = store.subscribe(move |v: &Option<f64>| sink.lock().unwrap().push(*v));

        store.set(Some(1.0));
        store.set(None);
        store.set(Some(1.0));
        assert_eq!(*seen.lock().unwrap(), vec![Some(1.0), None, Some(1.0)]);
    }

    #[test]
    fn update_and_unsubscribe() {
        let store = WritableStore::new(String::from("a"));
        let unsub = store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 1);

        store.update(|v| format!("{}b", v));
        assert_eq!(store.get(), "ab");

        unsub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        assert!(store.ptr_eq(&store.clone()));
    }

    #[test]
    fn normalized_store_stores_the_normalized_value() {
        let store = WritableStore::normalized(15, |v: i32| v.clamp(0, 10));
        assert_eq!(store.get(), 10);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _unsub = store.subscribe(move |v| sink.lock().unwrap().push(*v));

        store.set(3);
        store.set(-4);
        // Normalizes to the current value, so nothing is pushed.
        store.set(-9);
        assert_eq!(*seen.lock().unwrap(), vec![10, 3, 0]);
    }

    #[test]
    fn handler_may_write_back() {
        let store = WritableStore::new(0);
        let writer = store.clone();
        let _unsub = store.subscribe(move |v| {
            if *v == 1 {
                writer.set(2);
            }
        });

        store.set(1);
        assert_eq!(store.get(), 2);
    }
}
