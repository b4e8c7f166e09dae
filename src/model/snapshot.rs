//! A shared, atomically replaceable value.
//!
//! Readers take an `Arc` clone and keep using it for as long as they need;
//! a concurrent `store` only affects loads that happen afterwards.

use std::sync::Arc;

use parking_lot::RwLock;

pub struct Snapshot<T> {
    current: RwLock<Arc<T>>,
}

impl<T> Snapshot<T> {
    pub fn new(initial: Arc<T>) -> Self { Self { current: RwLock::new(initial) } }

    pub fn from_value(value: T) -> Self { Self::new(Arc::new(value)) }

    #[inline]
    pub fn load(&self) -> Arc<T> { self.current.read().clone() }

    /// Replace the value, returning the previous one.
    #[inline]
    pub fn store(&self, value: Arc<T>) -> Arc<T> {
        std::mem::replace(&mut *self.current.write(), value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Snapshot").field(&*self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn loaded_value_survives_store() {
        let snap = Snapshot::from_value(String::from("old"));
        let held = snap.load();
        let prev = snap.store(Arc::new("new".into()));
        assert_eq!(*held, "old");
        assert_eq!(*prev, "old");
        assert_eq!(*snap.load(), "new");
    }

    #[test]
    fn concurrent_readers_see_whole_values() {
        let snap = Arc::new(Snapshot::from_value(vec![0u32; 64]));
        let writer = {
            let snap = snap.clone();
            thread::spawn(move || {
                for i in 1..200u32 {
                    snap.store(Arc::new(vec![i; 64]));
                }
            })
        };
        for _ in 0..200 {
            let v = snap.load();
            assert!(v.iter().all(|x| *x == v[0]));
        }
        writer.join().unwrap();
    }
}
