use bitvec::vec::BitVec;

/// A set of `usize` keys in the range `0..capacity`, that can be iterated
/// in insertion order.
///
/// Membership is tracked with a bitmap that has one bit per possible key,
/// which makes `insert` and `contains` O(1). Clearing the set is proportional
/// to the number of keys in it, not to its capacity, as only the bits
/// corresponding to inserted keys are reset.
///
/// The matching engines use this type for keeping track of the instructions
/// that are alive at a given position, where the insertion order is the
/// priority of each thread.
#[derive(Debug, Clone, Default)]
pub(crate) struct BitmapSet {
    // Keys in the set, in insertion order.
    items: Vec<usize>,
    // One bit per possible key.
    bitmap: BitVec<usize>,
}

impl BitmapSet {
    /// Creates a set that can hold keys in the range `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            bitmap: BitVec::repeat(false, capacity),
        }
    }

    /// Adds a key to the set.
    ///
    /// Returns `true` if the key didn't exist in the set and was added, and
    /// `false` if it already existed.
    ///
    /// # Panics
    ///
    /// If `key >= capacity`.
    #[inline]
    pub fn insert(&mut self, key: usize) -> bool {
        if self.bitmap[key] {
            return false;
        }
        self.bitmap.set(key, true);
        self.items.push(key);
        true
    }

    #[inline]
    pub fn contains(&self, key: usize) -> bool {
        self.bitmap.get(key).map_or(false, |bit| *bit)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Maximum number of keys in the set.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bitmap.len()
    }

    /// Removes all keys in the set.
    #[inline]
    pub fn clear(&mut self) {
        for key in self.items.drain(0..) {
            self.bitmap.set(key, false);
        }
    }

    /// Returns an iterator for the keys in the set.
    ///
    /// Keys are returned in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.items.iter()
    }

    /// Returns the keys in the set as a slice, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        self.items.as_slice()
    }
}
