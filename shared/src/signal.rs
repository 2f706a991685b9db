use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Push-style "something changed" notification from a resource to its
/// owner. Listeners stay registered until their `Subscription` is dropped or
/// explicitly unsubscribed.
#[derive(Clone, Default)]
pub struct ChangeSignal {
    listeners: Rc<RefCell<Listeners>>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Notify every listener. Listeners may subscribe or unsubscribe while
    /// being notified; changes apply from the next emit.
    pub fn emit(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

/// Handle for one registered listener; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_subscribers_until_unsubscribed() {
        let signal = ChangeSignal::new();
        let hits = Rc::new(Cell::new(0));
        let hits_listener = hits.clone();
        let sub = signal.subscribe(move || hits_listener.set(hits_listener.get() + 1));

        signal.emit();
        signal.emit();
        assert_eq!(hits.get(), 2);

        sub.unsubscribe();
        signal.emit();
        assert_eq!(hits.get(), 2);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn dropping_a_subscription_detaches_only_that_listener() {
        let signal = ChangeSignal::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let a_listener = a.clone();
        let b_listener = b.clone();
        let sub_a = signal.subscribe(move || a_listener.set(a_listener.get() + 1));
        let _sub_b = signal.subscribe(move || b_listener.set(b_listener.get() + 1));

        drop(sub_a);
        signal.emit();
        assert_eq!((a.get(), b.get()), (0, 1));
    }

    #[test]
    fn subscription_outliving_signal_is_harmless() {
        let signal = ChangeSignal::new();
        let sub = signal.subscribe(|| {});
        drop(signal);
        drop(sub);
    }
}
