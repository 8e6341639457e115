//! A shared mutable cell with atomic read-modify-write operations.

use parking_lot::Mutex;

/// Thread-safe cell holding a `T`.
///
/// Every operation takes the internal lock once, so a compare-and-set or a
/// transform is atomic with respect to every other operation on the cell.
///
/// ```rust
/// use pullstream::AtomicCell;
///
/// let cell = AtomicCell::new(1);
/// assert!(cell.compare_and_set(&1, 2));
/// assert!(!cell.compare_and_set(&1, 3));
/// assert_eq!(cell.get_and_set(4), 2);
/// assert_eq!(cell.transform_and_get(|x| x * 10), 40);
/// ```
#[derive(Debug, Default)]
pub struct AtomicCell<T> {
    value: Mutex<T>,
}

impl<T> AtomicCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    pub fn set(&self, value: T) {
        *self.value.lock() = value;
    }

    /// Eventually stores `value`. The lock already orders every write, so
    /// this is the same as [`set`](AtomicCell::set).
    pub fn lazy_set(&self, value: T) {
        self.set(value);
    }

    /// Stores `value` and returns the previous one.
    pub fn get_and_set(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.lock(), value)
    }

    /// Applies `f` to the current value and stores the result.
    pub fn transform_and_get<G>(&self, f: G) -> T
    where
        G: FnOnce(&T) -> T,
        T: Clone,
    {
        let mut guard = self.value.lock();
        let next = f(&guard);
        *guard = next;
        guard.clone()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Clone> AtomicCell<T> {
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }
}

impl<T: PartialEq> AtomicCell<T> {
    /// Stores `update` if the current value equals `expected`.
    pub fn compare_and_set(&self, expected: &T, update: T) -> bool {
        let mut guard = self.value.lock();
        if *guard != *expected {
            return false;
        }
        *guard = update;
        true
    }
}
