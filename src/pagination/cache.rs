use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

/// Memoizes related-entity lookups for the duration of one page build.
///
/// A failed fetch is not stored, so a later item with the same key retries it.
#[derive(Debug)]
pub struct PageScopedCache<K, V> {
    entries: HashMap<K, V>,
    fetches: usize,
}

impl<K, V> Default for PageScopedCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            fetches: 0,
        }
    }
}

impl<K, V> PageScopedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_insert_with<F, Fut, E>(&mut self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.entries.get(key) {
            return Ok(value.clone());
        }

        self.fetches += 1;
        let value = fetch().await?;
        self.entries.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of times the underlying fetch was invoked.
    pub fn fetches(&self) -> usize {
        self.fetches
    }
}
