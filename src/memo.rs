use std::sync::Arc;

use tracing::trace;

/// Cache key component compared by pointer identity instead of by value.
///
/// Holding the `Arc` keeps the allocation alive, so an address can never be
/// reused by a different slice while it is cached.
#[derive(Debug)]
pub struct ByRef<T>(Arc<T>);

impl<T> ByRef<T> {
    pub fn new(value: &Arc<T>) -> Self {
        Self(Arc::clone(value))
    }
}

impl<T> PartialEq for ByRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Single-entry memo: the last key and the value computed for it.
///
/// When the key changes and the recomputed value equals the previous one,
/// the previous `Arc` is returned so downstream identity checks stay stable.
#[derive(Debug)]
pub struct Memo<K, V> {
    name: &'static str,
    last: Option<(K, Arc<V>)>,
    recomputations: u64,
}

impl<K: PartialEq, V: PartialEq> Memo<K, V> {
    pub fn new(name: &'static str) -> Self {
        Self { name, last: None, recomputations: 0 }
    }

    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((last_key, value)) = &self.last {
            if *last_key == key {
                trace!(selector = self.name, "memo hit");
                return Arc::clone(value);
            }
        }

        self.recomputations += 1;
        trace!(selector = self.name, recomputations = self.recomputations, "memo miss");
        let computed = compute();
        let value = match self.last.take() {
            Some((_, previous)) if *previous == computed => previous,
            _ => Arc::new(computed),
        };
        self.last = Some((key, Arc::clone(&value)));
        value
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
