use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

pub type Callback<T> = Rc<dyn Fn(&T)>;
pub type SubscriptionId = u64;

/// Emitting half of a [`Channel`]. Cheap to clone; all clones share the
/// same listener set.
pub struct EventEmitter<T: std::fmt::Debug> {
    channel: Channel<T>,
}

impl<T: std::fmt::Debug> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

/// Subscribing half of a [`Channel`].
pub struct EventObserver<T: std::fmt::Debug> {
    channel: Channel<T>,
}

impl<T: std::fmt::Debug> Clone for EventObserver<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

/// Handle returned by [`EventObserver::subscribe`]. Dropping the handle
/// does NOT detach the listener; call [`Unsubscriber::unsubscribe`]
/// (typically from a `Destroyable::destroy` impl) to remove it.
pub struct Unsubscriber<T: std::fmt::Debug> {
    channel: Channel<T>,
    id: SubscriptionId,
}

impl<T: std::fmt::Debug> Unsubscriber<T> {
    pub fn unsubscribe(self) -> bool {
        self.channel.remove_listener(self.id)
    }
}

pub struct Channel<T: std::fmt::Debug> {
    listeners: Rc<RefCell<HashMap<SubscriptionId, Callback<T>>>>,
    next_id: Rc<RefCell<SubscriptionId>>,
}

impl<T: std::fmt::Debug> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
            next_id: Rc::clone(&self.next_id),
        }
    }
}

impl<T: std::fmt::Debug> Channel<T> {
    pub fn new() -> (EventEmitter<T>, EventObserver<T>) {
        let channel = Channel {
            listeners: Rc::new(RefCell::new(HashMap::new())),
            next_id: Rc::new(RefCell::new(0)),
        };
        (
            EventEmitter {
                channel: channel.clone(),
            },
            EventObserver { channel },
        )
    }

    fn add_listener<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut next_id = self.next_id.borrow_mut();
            let id = *next_id;
            *next_id += 1;
            id
        };
        self.listeners.borrow_mut().insert(id, Rc::new(callback));
        id
    }

    fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }

    fn emit(&self, data: &T) {
        // snapshot so a listener may subscribe/unsubscribe mid-emit
        let listeners: Vec<Callback<T>> = self.listeners.borrow().values().cloned().collect();
        trace!(target: "events", "Emitting to {} listeners: {:?}", listeners.len(), data);
        for listener in listeners {
            listener(data);
        }
    }
}

impl<T: std::fmt::Debug> EventEmitter<T> {
    pub fn emit(&self, data: &T) {
        self.channel.emit(data);
    }
}

impl<T: std::fmt::Debug> EventObserver<T> {
    pub fn subscribe<F>(&self, callback: F) -> Unsubscriber<T>
    where
        F: Fn(&T) + 'static,
    {
        let id = self.channel.add_listener(callback);
        Unsubscriber {
            channel: self.channel.clone(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_subscribe_and_emit() {
        let (emitter, observer) = Channel::<u32>::new();
        let seen = Rc::new(Cell::new(0u32));

        let seen_clone = seen.clone();
        observer.subscribe(move |value| {
            seen_clone.set(seen_clone.get() + value);
        });

        emitter.emit(&7);
        emitter.emit(&5);
        assert_eq!(seen.get(), 12);
    }

    #[test]
    fn test_multiple_listeners_all_fire() {
        let (emitter, observer) = Channel::<u32>::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let count = count.clone();
            observer.subscribe(move |_| {
                count.set(count.get() + 1);
            });
        }

        emitter.emit(&1);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_unsubscribe_detaches_listener() {
        let (emitter, observer) = Channel::<u32>::new();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let subscription = observer.subscribe(move |_| {
            count_clone.set(count_clone.get() + 1);
        });

        emitter.emit(&1);
        assert!(subscription.unsubscribe());
        emitter.emit(&1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_clones_share_listener_set() {
        let (emitter, observer) = Channel::<u32>::new();
        let emitter2 = emitter.clone();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        observer.clone().subscribe(move |_| {
            count_clone.set(count_clone.get() + 1);
        });

        emitter.emit(&1);
        emitter2.emit(&1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let (emitter, observer) = Channel::<u32>::new();
        let holder: Rc<RefCell<Option<Unsubscriber<u32>>>> = Rc::new(RefCell::new(None));
        let fired = Rc::new(Cell::new(0));

        let holder_clone = holder.clone();
        let fired_clone = fired.clone();
        let subscription = observer.subscribe(move |_| {
            fired_clone.set(fired_clone.get() + 1);
            if let Some(subscription) = holder_clone.borrow_mut().take() {
                subscription.unsubscribe();
            }
        });
        *holder.borrow_mut() = Some(subscription);

        emitter.emit(&1);
        emitter.emit(&1);
        assert_eq!(fired.get(), 1);
    }
}
