use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// A pool of values that can be borrowed by multiple threads.
///
/// Each compiled regexp owns a pool of search caches, so that a regexp can
/// be shared among threads without synchronizing the searches themselves.
/// A thread takes a cache from the pool for the duration of a search and
/// returns it when done. If the pool is empty a new cache is created.
#[derive(Debug, Default)]
pub(crate) struct Pool<T> {
    stack: Mutex<Vec<Box<T>>>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { stack: Mutex::new(Vec::new()) }
    }

    /// Takes a value from the pool, or creates a new one with `create` if
    /// the pool is empty. The value goes back to the pool when the returned
    /// guard is dropped.
    pub fn get(&self, create: impl FnOnce() -> T) -> PoolGuard<'_, T> {
        let value = self
            .stack
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .pop()
            .unwrap_or_else(|| Box::new(create()));
        PoolGuard { pool: self, value: Some(value) }
    }

    fn put(&self, value: Box<T>) {
        self.stack.lock().unwrap_or_else(|err| err.into_inner()).push(value);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.stack.lock().unwrap().len()
    }
}

/// A value borrowed from a [`Pool`].
pub(crate) struct PoolGuard<'a, T> {
    pool: &'a Pool<T>,
    value: Option<Box<T>>,
}

impl<T> Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // `value` is `None` only while the guard is being dropped.
        self.value.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl<T> DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put(value);
        }
    }
}
