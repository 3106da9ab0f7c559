/// Fixed-capacity circular history, oldest entry first.
///
/// Slots live in a single arena; once the ring is full every insertion reuses
/// the oldest slot in place instead of allocating.
#[derive(Debug, Clone)]
pub struct SnapshotRing<T> {
    slots: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T> SnapshotRing<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.slots.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        Some(&self.slots[self.physical(index)])
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn push(&mut self, item: T) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Moves the oldest slot to the newest position and hands it out for
    /// overwriting. Grows with `T::default()` until the ring is warmed up.
    pub fn recycle(&mut self) -> &mut T
    where
        T: Default,
    {
        if self.slots.len() < self.capacity {
            self.slots.push(T::default());
            let last = self.slots.len() - 1;
            return &mut self.slots[last];
        }

        let index = self.head;
        self.head = (self.head + 1) % self.capacity;
        &mut self.slots[index]
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.iter().find(|item| predicate(*item))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}
