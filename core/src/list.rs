//! Arena-pooled doubly-linked lists.
//!
//! Entities migrate between lists every frame (pending-spawn queues, the
//! active set, the respawn-wait set), so link nodes are never allocated or
//! dropped per operation. All nodes of one element type live in a single
//! [`NodeArena`] owned by the simulation; lists hold only head/tail indices
//! into it. Every list operation takes the arena explicitly, which keeps the
//! sharing visible and lets tests observe pool occupancy directly.
//!
//! Invariant: a node is reachable from exactly one list or from the arena's
//! free stack, never both. Releasing a node takes its payload and clears its
//! links before the index returns to the free stack.
//!
//! A list must only ever be used with the arena its nodes were acquired
//! from; pairing lists with a foreign arena of the same element type is a
//! logic error.

use std::cmp::Ordering;
use std::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeIndex(u32);

impl NodeIndex {
    fn slot(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node<T> {
    payload: Option<T>,
    prev: Option<NodeIndex>,
    next: Option<NodeIndex>,
}

/// Shared reservoir of reusable link nodes for every list of one element
/// type.
#[derive(Debug)]
pub struct NodeArena<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeIndex>,
}

impl<T> NodeArena<T> {
    /// Creates an empty arena that grows on demand.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an arena pre-warmed with `prewarm` free nodes so the first
    /// frames of the simulation acquire without allocating.
    #[must_use]
    pub fn with_capacity(prewarm: usize) -> Self {
        let mut arena = Self {
            nodes: Vec::with_capacity(prewarm),
            free: Vec::with_capacity(prewarm),
        };
        for _ in 0..prewarm {
            let index = NodeIndex(arena.nodes.len() as u32);
            arena.nodes.push(Node {
                payload: None,
                prev: None,
                next: None,
            });
            arena.free.push(index);
        }
        arena
    }

    /// Total number of nodes the arena has ever created.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes currently sitting in the free stack.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    fn acquire(&mut self, payload: T) -> NodeIndex {
        if let Some(index) = self.free.pop() {
            let node = &mut self.nodes[index.slot()];
            debug_assert!(node.payload.is_none(), "free node must be empty");
            node.payload = Some(payload);
            node.prev = None;
            node.next = None;
            index
        } else {
            let index = NodeIndex(self.nodes.len() as u32);
            self.nodes.push(Node {
                payload: Some(payload),
                prev: None,
                next: None,
            });
            index
        }
    }

    fn release(&mut self, index: NodeIndex) -> T {
        let node = &mut self.nodes[index.slot()];
        let payload = node
            .payload
            .take()
            .expect("released node must carry a payload");
        node.prev = None;
        node.next = None;
        self.free.push(index);
        payload
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Doubly-linked sequence whose nodes live in a shared [`NodeArena`].
#[derive(Debug)]
pub struct PooledList<T> {
    head: Option<NodeIndex>,
    tail: Option<NodeIndex>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> PooledList<T> {
    /// Creates an empty list bound to no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Number of elements currently in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Attaches `item` at the front of the list in O(1).
    pub fn push_front(&mut self, arena: &mut NodeArena<T>, item: T) {
        let index = arena.acquire(item);
        arena.nodes[index.slot()].next = self.head;
        match self.head {
            Some(head) => arena.nodes[head.slot()].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
    }

    /// Attaches `item` at the back of the list in O(1).
    pub fn push_back(&mut self, arena: &mut NodeArena<T>, item: T) {
        let index = arena.acquire(item);
        arena.nodes[index.slot()].prev = self.tail;
        match self.tail {
            Some(tail) => arena.nodes[tail.slot()].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Detaches and returns the front element, or `None` when empty. The
    /// vacated node returns to the arena's free stack.
    pub fn pop_front(&mut self, arena: &mut NodeArena<T>) -> Option<T> {
        let head = self.head?;
        self.unlink(arena, head);
        Some(arena.release(head))
    }

    /// Detaches and returns the back element, or `None` when empty.
    pub fn pop_back(&mut self, arena: &mut NodeArena<T>) -> Option<T> {
        let tail = self.tail?;
        self.unlink(arena, tail);
        Some(arena.release(tail))
    }

    /// Scans front-to-back for the first element matching `predicate`,
    /// removes and returns it in O(n), or returns `None` when no element
    /// matches.
    pub fn remove_first_match(
        &mut self,
        arena: &mut NodeArena<T>,
        mut predicate: impl FnMut(&T) -> bool,
    ) -> Option<T> {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            cursor = arena.nodes[index.slot()].next;
            let matched = arena.nodes[index.slot()]
                .payload
                .as_ref()
                .map_or(false, |payload| predicate(payload));
            if matched {
                self.unlink(arena, index);
                return Some(arena.release(index));
            }
        }
        None
    }

    /// Borrows the front element without detaching it.
    #[must_use]
    pub fn front<'a>(&self, arena: &'a NodeArena<T>) -> Option<&'a T> {
        let head = self.head?;
        arena.nodes[head.slot()].payload.as_ref()
    }

    /// Iterates the elements front-to-back.
    pub fn iter<'a>(&self, arena: &'a NodeArena<T>) -> impl Iterator<Item = &'a T> + 'a {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let index = cursor?;
            let node = &arena.nodes[index.slot()];
            cursor = node.next;
            node.payload.as_ref()
        })
    }

    /// Applies `visit` to every element front-to-back with mutable access.
    pub fn for_each_mut(&self, arena: &mut NodeArena<T>, mut visit: impl FnMut(&mut T)) {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            cursor = arena.nodes[index.slot()].next;
            if let Some(payload) = arena.nodes[index.slot()].payload.as_mut() {
                visit(payload);
            }
        }
    }

    fn insert_before(&mut self, arena: &mut NodeArena<T>, anchor: NodeIndex, item: T) {
        let index = arena.acquire(item);
        let prev = arena.nodes[anchor.slot()].prev;
        arena.nodes[index.slot()].prev = prev;
        arena.nodes[index.slot()].next = Some(anchor);
        arena.nodes[anchor.slot()].prev = Some(index);
        match prev {
            Some(prev) => arena.nodes[prev.slot()].next = Some(index),
            None => self.head = Some(index),
        }
        self.len += 1;
    }

    fn unlink(&mut self, arena: &mut NodeArena<T>, index: NodeIndex) {
        let prev = arena.nodes[index.slot()].prev;
        let next = arena.nodes[index.slot()].next;
        match prev {
            Some(prev) => arena.nodes[prev.slot()].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => arena.nodes[next.slot()].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }
}

impl<T> Default for PooledList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`PooledList`] specialized to keep its elements ordered under an injected
/// comparison policy. Insertion is O(n), acceptable because list lengths are
/// bounded by the population cap.
#[derive(Debug)]
pub struct SortedPooledList<T> {
    list: PooledList<T>,
    compare: fn(&T, &T) -> Ordering,
}

impl<T> SortedPooledList<T> {
    /// Creates an empty sorted list using the provided comparator.
    #[must_use]
    pub fn new(compare: fn(&T, &T) -> Ordering) -> Self {
        Self {
            list: PooledList::new(),
            compare,
        }
    }

    /// Number of elements currently in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Inserts `item` immediately before the first element the comparator
    /// does not order strictly before it; appends when no such element
    /// exists. A new item therefore lands in front of its equals.
    pub fn insert_sorted(&mut self, arena: &mut NodeArena<T>, item: T) {
        let mut cursor = self.list.head;
        while let Some(index) = cursor {
            cursor = arena.nodes[index.slot()].next;
            let ordered_before = arena.nodes[index.slot()].payload.as_ref().map_or(
                false,
                |existing| (self.compare)(&item, existing) != Ordering::Greater,
            );
            if ordered_before {
                self.list.insert_before(arena, index, item);
                return;
            }
        }
        self.list.push_back(arena, item);
    }

    /// Detaches and returns the smallest element, or `None` when empty.
    pub fn pop_front(&mut self, arena: &mut NodeArena<T>) -> Option<T> {
        self.list.pop_front(arena)
    }

    /// Borrows the smallest element without detaching it.
    #[must_use]
    pub fn front<'a>(&self, arena: &'a NodeArena<T>) -> Option<&'a T> {
        self.list.front(arena)
    }

    /// Iterates the elements in comparator order.
    pub fn iter<'a>(&self, arena: &'a NodeArena<T>) -> impl Iterator<Item = &'a T> + 'a {
        self.list.iter(arena)
    }

    /// Applies `visit` to every element in comparator order with mutable
    /// access. Callers must not change the relative order of the sort keys.
    pub fn for_each_mut(&self, arena: &mut NodeArena<T>, visit: impl FnMut(&mut T)) {
        self.list.for_each_mut(arena, visit);
    }
}
