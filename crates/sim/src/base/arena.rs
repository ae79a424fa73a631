/// A fixed-capacity slot arena with live/dead marking.
///
/// Slots freed by removals are reused by later insertions, but iteration
/// always follows insertion order, so the relative order of survivors is
/// stable. Capacity never grows: [`BoundedArena::insert`] hands the value
/// back when every slot is live.
#[derive(Debug, Clone)]
pub struct BoundedArena<T> {
    slots: Vec<Option<T>>,
    /// Live slot indices in insertion order.
    order: Vec<usize>,
    /// Free slot indices; popped from the back.
    free: Vec<usize>,
}

impl<T> BoundedArena<T> {
    /// Create an arena with room for `capacity` live values.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            order: Vec::with_capacity(capacity),
            // Reversed so the lowest slot is handed out first.
            free: (0..capacity).rev().collect(),
        }
    }

    /// Maximum number of live values.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Insert a value, returning its slot, or give it back if the arena is full.
    pub fn insert(&mut self, value: T) -> Result<usize, T> {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                self.order.push(slot);
                Ok(slot)
            }
            None => Err(value),
        }
    }

    /// Access the value stored in `slot`, if live.
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Live slot indices in insertion order.
    pub fn slots(&self) -> &[usize] {
        &self.order
    }

    /// Iterate live values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(move |&s| self.slots[s].as_ref())
    }

    /// Keep only the values for which `keep` returns true, freeing the rest.
    ///
    /// `keep` sees values in insertion order and may modify them.
    pub fn retain_mut(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.order.retain(|&s| {
            let alive = slots[s].as_mut().is_some_and(&mut keep);
            if !alive {
                slots[s] = None;
                free.push(s);
            }
            alive
        });
    }
}
