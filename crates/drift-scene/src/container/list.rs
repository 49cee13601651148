//! Observable ordered collection of elements.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::animation::SubscriptionId;
use crate::error::ListError;

use super::element::{ElementId, ElementRef};

/// A structural change, delivered after the list has been mutated.
///
/// `index` is the position of the first element; the elements were
/// contiguous.
#[derive(Clone)]
pub enum ListChange {
    Inserted { index: usize, elements: Vec<ElementRef> },
    Removed { index: usize, elements: Vec<ElementRef> },
}

impl ListChange {
    pub fn index(&self) -> usize {
        match self {
            Self::Inserted { index, .. } | Self::Removed { index, .. } => *index,
        }
    }

    pub fn elements(&self) -> &[ElementRef] {
        match self {
            Self::Inserted { elements, .. } | Self::Removed { elements, .. } => elements,
        }
    }
}

impl fmt::Debug for ListChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, index) = match self {
            Self::Inserted { index, .. } => ("Inserted", index),
            Self::Removed { index, .. } => ("Removed", index),
        };
        let ids: Vec<ElementId> = self.elements().iter().map(|e| e.id()).collect();
        f.debug_struct(kind)
            .field("index", index)
            .field("elements", &ids)
            .finish()
    }
}

/// Callback invoked after every structural change.
pub type ListListener = Rc<dyn Fn(&ListChange)>;

#[derive(Default)]
struct ListInner {
    items: RefCell<Vec<ElementRef>>,
    listeners: RefCell<Vec<(SubscriptionId, ListListener)>>,
    next_id: Cell<u64>,
}

/// Ordered children of a container. Clones are handles to the same list.
///
/// An element appears at most once. Listeners may mutate the list from
/// inside a notification; the nested notification is delivered first.
#[derive(Clone, Default)]
pub struct ChildList {
    inner: Rc<ListInner>,
}

impl ChildList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, element: ElementRef) -> Result<(), ListError> {
        self.insert(self.len(), element)
    }

    pub fn insert(&self, index: usize, element: ElementRef) -> Result<(), ListError> {
        {
            let mut items = self.inner.items.borrow_mut();
            if index > items.len() {
                return Err(ListError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            let id = element.id();
            if items.iter().any(|existing| existing.id() == id) {
                return Err(ListError::DuplicateElement(id));
            }
            items.insert(index, Rc::clone(&element));
        }
        self.notify(&ListChange::Inserted {
            index,
            elements: vec![element],
        });
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<ElementRef, ListError> {
        let element = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(ListError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        self.notify(&ListChange::Removed {
            index,
            elements: vec![Rc::clone(&element)],
        });
        Ok(element)
    }

    /// Remove by identity. Returns `None` if the element is not in the list.
    pub fn remove_element(&self, id: ElementId) -> Option<ElementRef> {
        let index = self.index_of(id)?;
        self.remove(index).ok()
    }

    /// Remove everything, as one change.
    pub fn clear(&self) {
        let elements = std::mem::take(&mut *self.inner.items.borrow_mut());
        if elements.is_empty() {
            return;
        }
        self.notify(&ListChange::Removed { index: 0, elements });
    }

    pub fn get(&self, index: usize) -> Option<ElementRef> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.inner.items.borrow().iter().position(|e| e.id() == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// Snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<ElementRef> {
        self.inner.items.borrow().clone()
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.inner.items.borrow().iter().map(|e| e.id()).collect()
    }

    pub fn subscribe(&self, listener: ListListener) -> SubscriptionId {
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

    fn notify(&self, change: &ListChange) {
        let listeners: Vec<ListListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

impl fmt::Debug for ChildList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
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

    fn recorder(list: &ChildList) -> Rc<RefCell<Vec<String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        list.subscribe(Rc::new(move |change: &ListChange| {
            let label = match change {
                ListChange::Inserted { index, elements } => format!("+{index}x{}", elements.len()),
                ListChange::Removed { index, elements } => format!("-{index}x{}", elements.len()),
            };
            sink.borrow_mut().push(label);
        }));
        seen
    }

    #[test]
    fn test_insert_and_remove() {
        let list = ChildList::new();
        let seen = recorder(&list);
        let (a, b) = (node("a"), node("b"));

        list.push(Rc::clone(&a)).unwrap();
        list.insert(0, Rc::clone(&b)).unwrap();
        assert_eq!(list.ids(), vec![b.id(), a.id()]);

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.id(), a.id());
        assert_eq!(*seen.borrow(), vec!["+0x1", "+0x1", "-1x1"]);
    }

    #[test]
    fn test_rejects_bad_index_and_duplicates() {
        let list = ChildList::new();
        let a = node("a");

        assert_eq!(
            list.insert(1, Rc::clone(&a)).unwrap_err(),
            ListError::IndexOutOfBounds { index: 1, len: 0 }
        );
        list.push(Rc::clone(&a)).unwrap();
        assert_eq!(
            list.push(Rc::clone(&a)).unwrap_err(),
            ListError::DuplicateElement(a.id())
        );
        assert!(list.remove(3).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_by_identity() {
        let list = ChildList::new();
        let (a, b) = (node("a"), node("b"));
        list.push(Rc::clone(&a)).unwrap();
        list.push(Rc::clone(&b)).unwrap();

        assert!(list.remove_element(a.id()).is_some());
        assert!(list.remove_element(a.id()).is_none());
        assert_eq!(list.index_of(b.id()), Some(0));
        assert!(!list.contains(a.id()));
    }

    #[test]
    fn test_clear_is_one_change() {
        let list = ChildList::new();
        list.push(node("a")).unwrap();
        list.push(node("b")).unwrap();
        let seen = recorder(&list);

        list.clear();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(*seen.borrow(), vec!["-0x2"]);
    }

    #[test]
    fn test_listener_may_mutate() {
        let list = ChildList::new();
        let handle = list.clone();
        let extra = node("extra");
        let extra_id = extra.id();
        list.subscribe(Rc::new(move |change: &ListChange| {
            if let ListChange::Removed { elements, .. } = change {
                if elements[0].id() != extra_id {
                    let _ = handle.push(Rc::clone(&extra));
                }
            }
        }));

        let a = node("a");
        list.push(Rc::clone(&a)).unwrap();
        list.remove(0).unwrap();
        assert_eq!(list.ids(), vec![extra_id]);
    }
}
