use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

type Listener<T> = Rc<dyn Fn(&T)>;

/// Observable container for one value.
///
/// Cloning a `Store` gives another handle on the same value. Every write
/// notifies the subscribed listeners synchronously with the new value.
/// Listeners may subscribe or unsubscribe from within a notification: the
/// round in progress still goes to the listeners registered when it began.
pub struct Store<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    state: RefCell<T>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
    next_listener: Cell<u64>,
}

/// Handle returned by [`Store::subscribe`]. Dropping it keeps the listener
/// registered, call [`Subscription::unsubscribe`] to remove it.
#[must_use = "the subscription is needed to unsubscribe the listener"]
pub struct Subscription<T> {
    id: u64,
    store: std::rc::Weak<Inner<T>>,
}

impl<T: Clone> Store<T> {
    pub fn new(state: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// snapshot of the current value
    pub fn get_state(&self) -> T {
        self.inner.state.borrow().clone()
    }

    /// replace the value and notify the listeners
    pub fn set_state(&self, state: T) {
        self.update(|_| state);
    }

    /// derive the next value from the current one and notify the listeners
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let current = self.inner.state.borrow();
            f(&current)
        };
        *self.inner.state.borrow_mut() = next.clone();

        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + 'static,
    {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl<T> Subscription<T> {
    /// Remove the listener from the store. Returns `false` if it was
    /// already removed or if the store is gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.store.upgrade() else {
            return false;
        };
        let mut listeners = inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        before != listeners.len()
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Store<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_on_every_write() {
        let store = Store::new(0u32);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let _subscription = store.subscribe(move |value| sink.borrow_mut().push(*value));

        store.set_state(1);
        store.update(|value| value + 41);

        assert_eq!(store.get_state(), 42);
        assert_eq!(*seen.borrow(), vec![1, 42]);
    }

    #[test]
    fn unsubscribe() {
        let store = Store::new(0u32);
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        let subscription = store.subscribe(move |_| counter.set(counter.get() + 1));
        store.set_state(1);
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        store.set_state(2);

        assert_eq!(calls.get(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn subscribe_from_listener() {
        let store = Store::new(0u32);
        let late = Rc::new(Cell::new(0));

        let handle = store.clone();
        let counter = Rc::clone(&late);
        let _subscription = store.subscribe(move |value| {
            if *value == 1 {
                let counter = Rc::clone(&counter);
                let _ = handle.subscribe(move |_| counter.set(counter.get() + 1));
            }
        });

        store.set_state(1);
        // not part of the round it was registered in
        assert_eq!(late.get(), 0);
        store.set_state(2);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn unsubscribe_from_listener() {
        let store = Store::new(0u32);
        let calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription<u32>>>> = Rc::new(RefCell::new(None));

        let counter = Rc::clone(&calls);
        let own = Rc::clone(&slot);
        let subscription = store.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(subscription) = own.borrow().as_ref() {
                subscription.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(subscription);

        store.set_state(1);
        store.set_state(2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn read_from_listener() {
        let store = Store::new(0u32);
        let handle = store.clone();
        let seen = Rc::new(Cell::new(0));

        let sink = Rc::clone(&seen);
        let _subscription = store.subscribe(move |_| sink.set(handle.get_state()));
        store.set_state(7);
        assert_eq!(seen.get(), 7);
    }
}
