//! Navigation history.
//!
//! A doubly linked list kept in an arena: nodes live in a `Vec` and link
//! to each other by index. Slots 0 and 1 are the front and back
//! sentinels; they never hold an entry and are never removed. A single
//! cursor marks the current node and is always a live node, though it
//! may rest on a sentinel (empty list, or after removing the last
//! entry).
//!
//! Inserting with truncation drops everything after the cursor, which
//! gives browser-style back/forward behaviour. Inserting without
//! truncation splices the entry in after the cursor.

use forg_types::error::{ForgError, Result};

const FRONT: usize = 0;
const BACK: usize = 1;

/// Stable handle to an entry. Stale handles (to removed entries) are
/// detected through the slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
    generation: u32,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            value: None,
            prev: FRONT,
            next: BACK,
            generation: 0,
        }
    }
}

/// Ordered entries with a movable cursor.
#[derive(Debug, Clone)]
pub struct History<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    current: usize,
    len: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel(), Node::sentinel()],
            free: Vec::new(),
            current: FRONT,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `value` after the cursor and make it current.
    ///
    /// With `truncate`, everything after the cursor is dropped first, so
    /// the new entry becomes the last one. When the cursor rests on the
    /// back sentinel the entry goes after the last entry.
    pub fn insert(&mut self, value: T, truncate: bool) -> EntryId {
        let anchor = if self.current == BACK {
            self.nodes[BACK].prev
        } else {
            self.current
        };

        if truncate {
            let mut n = self.nodes[anchor].next;
            while n != BACK {
                let following = self.nodes[n].next;
                self.release(n);
                n = following;
            }
            self.nodes[anchor].next = BACK;
            self.nodes[BACK].prev = anchor;
        }

        let after = self.nodes[anchor].next;
        let index = self.allocate(value, anchor, after);
        self.nodes[anchor].next = index;
        self.nodes[after].prev = index;
        self.current = index;
        self.id_of(index)
    }

    /// Insert at the very front without truncating.
    pub fn prepend(&mut self, value: T) -> EntryId {
        self.current = FRONT;
        self.insert(value, false)
    }

    /// Insert at the very back without truncating.
    pub fn postpend(&mut self, value: T) -> EntryId {
        self.current = self.nodes[BACK].prev;
        self.insert(value, false)
    }

    /// Move the cursor one entry toward the back.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&T> {
        let n = if self.current == BACK {
            BACK
        } else {
            self.nodes[self.current].next
        };
        if n == BACK {
            return Err(ForgError::NavigationBoundary(
                "Already at the end of the history".into(),
            ));
        }
        self.current = n;
        self.value_at(n)
    }

    /// Move the cursor one entry toward the front.
    pub fn prev(&mut self) -> Result<&T> {
        let p = if self.current == FRONT {
            FRONT
        } else {
            self.nodes[self.current].prev
        };
        if p == FRONT {
            return Err(ForgError::NavigationBoundary(
                "Already at the beginning of the history".into(),
            ));
        }
        self.current = p;
        self.value_at(p)
    }

    /// Unlink the current entry and return it. The cursor moves to the
    /// following node, which is the back sentinel if the last entry was
    /// removed.
    pub fn remove_current(&mut self) -> Result<T> {
        if self.is_sentinel(self.current) {
            return Err(ForgError::NavigationBoundary(
                "No current entry to remove".into(),
            ));
        }
        let index = self.current;
        self.current = self.nodes[index].next;
        self.unlink(index)
    }

    /// Remove the entry `id` wherever it is. Removing the current entry
    /// behaves like [`History::remove_current`].
    pub fn remove(&mut self, id: EntryId) -> Result<T> {
        if !self.is_live(id) {
            return Err(ForgError::NavigationBoundary(
                "Entry is not in the history".into(),
            ));
        }
        if id.index == self.current {
            return self.remove_current();
        }
        self.unlink(id.index)
    }

    /// Replace the current entry's value, returning the old one.
    pub fn replace_current(&mut self, value: T) -> Result<T> {
        match self.nodes[self.current].value.as_mut() {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(ForgError::NavigationBoundary(
                "No current entry to replace".into(),
            )),
        }
    }

    /// Apply `f` to every entry, front to back.
    pub fn traverse<R>(&self, f: impl FnMut(&T) -> R) -> Vec<R> {
        self.iter().map(f).collect()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            history: self,
            index: self.nodes[FRONT].next,
        }
    }

    /// The current entry, or `None` when the cursor is on a sentinel.
    pub fn current(&self) -> Option<&T> {
        self.nodes[self.current].value.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.nodes[self.current].value.as_mut()
    }

    pub fn current_id(&self) -> Option<EntryId> {
        (!self.is_sentinel(self.current)).then(|| self.id_of(self.current))
    }

    pub fn get(&self, id: EntryId) -> Option<&T> {
        if !self.is_live(id) {
            return None;
        }
        self.nodes[id.index].value.as_ref()
    }

    pub fn first(&self) -> Option<&T> {
        self.nodes[self.nodes[FRONT].next].value.as_ref()
    }

    pub fn last(&self) -> Option<&T> {
        self.nodes[self.nodes[BACK].prev].value.as_ref()
    }

    /// Cursor on the front sentinel.
    pub fn at_front(&self) -> bool {
        self.current == FRONT
    }

    /// Cursor on the back sentinel.
    pub fn at_end(&self) -> bool {
        self.current == BACK
    }

    /// Whether [`History::prev`] would succeed.
    pub fn can_go_back(&self) -> bool {
        self.current != FRONT && self.nodes[self.current].prev != FRONT
    }

    /// Whether [`History::next`] would succeed.
    pub fn can_go_forward(&self) -> bool {
        self.current != BACK && self.nodes[self.current].next != BACK
    }

    /// Put the cursor on the first entry (the back sentinel if empty).
    pub fn go_to_front(&mut self) {
        self.current = self.nodes[FRONT].next;
    }

    /// Put the cursor on the last entry (the front sentinel if empty).
    pub fn go_to_back(&mut self) {
        self.current = self.nodes[BACK].prev;
    }

    fn is_sentinel(&self, index: usize) -> bool {
        index == FRONT || index == BACK
    }

    fn is_live(&self, id: EntryId) -> bool {
        !self.is_sentinel(id.index)
            && self
                .nodes
                .get(id.index)
                .is_some_and(|n| n.generation == id.generation && n.value.is_some())
    }

    fn id_of(&self, index: usize) -> EntryId {
        EntryId {
            index,
            generation: self.nodes[index].generation,
        }
    }

    fn value_at(&self, index: usize) -> Result<&T> {
        self.nodes[index]
            .value
            .as_ref()
            .ok_or_else(|| ForgError::NavigationBoundary("Cursor on an empty node".into()))
    }

    fn allocate(&mut self, value: T, prev: usize, next: usize) -> usize {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let node = &mut self.nodes[index];
                node.value = Some(value);
                node.prev = prev;
                node.next = next;
                index
            },
            None => {
                self.nodes.push(Node {
                    value: Some(value),
                    prev,
                    next,
                    generation: 0,
                });
                self.nodes.len() - 1
            },
        }
    }

    /// Free a slot that is already detached from (or about to be
    /// dropped along with) its neighbours.
    fn release(&mut self, index: usize) -> Option<T> {
        let node = &mut self.nodes[index];
        let value = node.value.take();
        node.generation = node.generation.wrapping_add(1);
        node.prev = index;
        node.next = index;
        if value.is_some() {
            self.len -= 1;
            self.free.push(index);
        }
        value
    }

    fn unlink(&mut self, index: usize) -> Result<T> {
        let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.release(index)
            .ok_or_else(|| ForgError::NavigationBoundary("Entry already removed".into()))
    }
}

/// Front-to-back iterator over a [`History`].
pub struct Iter<'a, T> {
    history: &'a History<T>,
    index: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == BACK {
            return None;
        }
        let node = &self.history.nodes[self.index];
        self.index = node.next;
        node.value.as_ref()
    }
}

impl<'a, T> IntoIterator for &'a History<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
