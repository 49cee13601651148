//! Observable single-child holder.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::animation::SubscriptionId;

use super::element::{ElementId, ElementRef};

/// Callback invoked with `(old, new)` after the child changes.
pub type SlotListener = Rc<dyn Fn(Option<&ElementRef>, Option<&ElementRef>)>;

#[derive(Default)]
struct SlotInner {
    child: RefCell<Option<ElementRef>>,
    listeners: RefCell<Vec<(SubscriptionId, SlotListener)>>,
    next_id: Cell<u64>,
}

/// The wrapped child of a single-child container. Clones are handles to the
/// same slot.
///
/// Children are compared by [`ElementId`]: setting the element that is
/// already there notifies nobody.
#[derive(Clone, Default)]
pub struct ChildSlot {
    inner: Rc<SlotInner>,
}

impl ChildSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<ElementRef> {
        self.inner.child.borrow().clone()
    }

    pub fn id(&self) -> Option<ElementId> {
        self.inner.child.borrow().as_ref().map(|child| child.id())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.child.borrow().is_none()
    }

    /// Replace the child and return the previous one.
    pub fn set(&self, child: Option<ElementRef>) -> Option<ElementRef> {
        let old = self.inner.child.replace(child.clone());
        if old.as_ref().map(|e| e.id()) == child.as_ref().map(|e| e.id()) {
            return old;
        }

        let listeners: Vec<SlotListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(old.as_ref(), child.as_ref());
        }
        old
    }

    pub fn subscribe(&self, listener: SlotListener) -> SubscriptionId {
        let raw = self.inner.next_id.get() + 1;
        self.inner.next_id.set(raw);
        let id = SubscriptionId::from_raw(raw);
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
}

impl fmt::Debug for ChildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChildSlot").field(&self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Size;
    use crate::container::SceneNode;

    fn node(name: &str) -> ElementRef {
        Rc::new(SceneNode::new(name, Size::new(10.0, 10.0)))
    }

    #[test]
    fn test_notifies_on_identity_change_only() {
        let slot = ChildSlot::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        slot.subscribe(Rc::new(
            move |old: Option<&ElementRef>, new: Option<&ElementRef>| {
                sink.borrow_mut()
                    .push((old.map(|e| e.id()), new.map(|e| e.id())));
            },
        ));

        let (a, b) = (node("a"), node("b"));
        assert!(slot.set(Some(Rc::clone(&a))).is_none());
        assert!(slot.set(Some(Rc::clone(&a))).is_some());
        slot.set(Some(Rc::clone(&b)));
        slot.set(None);

        assert_eq!(
            *seen.borrow(),
            vec![
                (None, Some(a.id())),
                (Some(a.id()), Some(b.id())),
                (Some(b.id()), None),
            ]
        );
        assert!(slot.is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let slot = ChildSlot::new();
        let id = slot.subscribe(Rc::new(|_: Option<&ElementRef>, _: Option<&ElementRef>| {}));
        assert_eq!(slot.listener_count(), 1);
        assert!(slot.unsubscribe(id));
        assert!(!slot.unsubscribe(id));
        assert_eq!(slot.listener_count(), 0);
    }
}
