use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use super::lock;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct HandlerList<T: ?Sized> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Ordered list of subscription handlers.
///
/// Handlers are called outside the internal lock, so a handler may subscribe,
/// unsubscribe, or write back into the store that notified it.
pub struct Subscribers<T: ?Sized> {
    list: Arc<Mutex<HandlerList<T>>>,
}

impl<T: ?Sized> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            list: Arc::clone(&self.list),
        }
    }
}

impl<T: ?Sized + 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            list: Arc::new(Mutex::new(HandlerList {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler without invoking it.
    ///
    /// Stores call this and then push the current value themselves.
    pub fn add<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut list = lock(&self.list);
            let id = list.next_id;
            list.next_id += 1;
            list.handlers.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<HandlerList<T>>> = Arc::downgrade(&self.list);
        Unsubscribe::new(move || {
            if let Some(list) = weak.upgrade() {
                lock(&list).handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Call every registered handler with `value`, in registration order.
    pub fn notify(&self, value: &T) {
        let handlers: Vec<Handler<T>> = lock(&self.list)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(value);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.list).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handler.
    pub fn clear(&self) {
        lock(&self.list).handlers.clear();
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &lock(&self.list).handlers.len())
            .finish()
    }
}

/// Handle returned by `subscribe`. Consuming it detaches the handler.
///
/// Dropping the handle without calling [`Unsubscribe::unsubscribe`] leaves the
/// subscription in place.
pub struct Unsubscribe {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
