//! Observable value cells.
//!
//! [`ObservableCell`] is the contract the animation engine consumes: a value
//! that can be read, written and observed. Listeners receive `(old, new)`
//! synchronously and only when the value actually changes. A listener may
//! write the cell again; the nested notification is delivered before the
//! outer call returns.
//!
//! [`ValueCell`] is the in-process implementation used by [`SceneNode`] and
//! the tests. Hosts with their own property system implement the trait
//! directly.
//!
//! [`SceneNode`]: crate::container::SceneNode

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Callback invoked with `(old, new)` after a cell changes.
pub type Listener<T> = Rc<dyn Fn(&T, &T)>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A readable, writable, observable value.
pub trait ObservableCell<T> {
    fn get(&self) -> T;

    /// Store `value`, notifying listeners if it differs from the current value.
    fn set(&self, value: T);

    fn subscribe(&self, listener: Listener<T>) -> SubscriptionId;

    /// Returns `false` if the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct CellInner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: Cell<u64>,
}

/// Shared observable value. Clones are handles to the same cell.
pub struct ValueCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ValueCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        let old = {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                return;
            }
            std::mem::replace(&mut *slot, value.clone())
        };

        // Snapshot so listeners can subscribe, unsubscribe or write re-entrantly.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&old, &value);
        }
    }

    /// Apply `f` to the current value and store the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }

    pub fn subscribe(&self, listener: Listener<T>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Keep `target` equal to `mapper(self)` from now on.
    ///
    /// The target is written immediately and again after every change of this
    /// cell, including every animation frame. The binding holds this cell
    /// weakly and stops once it is dropped.
    pub fn bind_mapped<V>(
        &self,
        target: impl ObservableCell<V> + 'static,
        mapper: impl Fn(&T) -> V + 'static,
    ) -> SubscriptionId {
        target.set(mapper(&self.get()));
        let source: Weak<CellInner<T>> = Rc::downgrade(&self.inner);
        self.subscribe(Rc::new(move |_: &T, _: &T| {
            if let Some(inner) = source.upgrade() {
                // Read the live value: a nested write may already have replaced `new`.
                let current = inner.value.borrow().clone();
                target.set(mapper(&current));
            }
        }))
    }
}

impl<T: Clone + PartialEq + 'static> ObservableCell<T> for ValueCell<T> {
    fn get(&self) -> T {
        ValueCell::get(self)
    }

    fn set(&self, value: T) {
        ValueCell::set(self, value)
    }

    fn subscribe(&self, listener: Listener<T>) -> SubscriptionId {
        ValueCell::subscribe(self, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        ValueCell::unsubscribe(self, id)
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCell")
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

static_assertions::assert_not_impl_any!(ValueCell<f64>: Send, Sync);
