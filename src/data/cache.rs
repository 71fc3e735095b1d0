use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use super::model::ColumnData;
use super::store::ColumnStore;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Memo – keyed, single-flight memoisation
// ---------------------------------------------------------------------------

type Slot<V> = Arc<Mutex<Option<V>>>;

/// A memo table where each key owns its own slot.
///
/// The table lock is only held to look up (or create) a slot; the slot lock
/// is held while the value is computed. Concurrent callers asking for the
/// same key therefore wait for a single computation, callers for different
/// keys do not block each other. A failed computation stores nothing and
/// removes its slot again, so the table only grows with successful keys.
pub struct Memo<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut value = slot.lock();
        if let Some(v) = value.as_ref() {
            return Ok(v.clone());
        }
        match compute() {
            Ok(computed) => {
                *value = Some(computed.clone());
                Ok(computed)
            }
            Err(e) => {
                // Drop the empty slot unless another caller is already
                // waiting on it; that caller retries the computation.
                let mut slots = self.slots.lock();
                if Arc::strong_count(&slot) == 2
                    && slots.get(key).is_some_and(|s| Arc::ptr_eq(s, &slot))
                {
                    slots.remove(key);
                }
                Err(e)
            }
        }
    }

    /// The stored value for `key`, without computing it.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.lock().get(key).cloned()?;
        let value = slot.lock();
        value.clone()
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|s| s.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// DataCache – memoised column store reads
// ---------------------------------------------------------------------------

/// `(column, row)`; `row == None` means the whole column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub column: String,
    pub row: Option<usize>,
}

/// Read-through cache in front of a [`ColumnStore`].
///
/// Entries live as long as the cache and are never invalidated: the store is
/// read-only and assumed immutable while open.
pub struct DataCache {
    store: Arc<dyn ColumnStore>,
    entries: Memo<CacheKey, Arc<ColumnData>>,
}

impl DataCache {
    pub fn new(store: Arc<dyn ColumnStore>) -> Self {
        Self {
            store,
            entries: Memo::new(),
        }
    }

    pub fn store(&self) -> &dyn ColumnStore {
        self.store.as_ref()
    }

    /// Fetch `column` (whole, or one `row` of it), reading the store only on
    /// the first request for that key.
    pub fn get(&self, column: &str, row: Option<usize>) -> Result<Arc<ColumnData>> {
        let key = CacheKey {
            column: column.to_string(),
            row,
        };
        self.entries.get_or_try_insert_with(&key, || {
            log::debug!("cache miss for '{column}' row {row:?}");
            let data = match row {
                Some(row) => ColumnData::Values(self.store.read_row(column, row)?),
                None => self.store.read_full(column)?,
            };
            Ok(Arc::new(data))
        })
    }

    /// One object's samples of a numeric column.
    pub fn row(&self, column: &str, row: usize) -> Result<Arc<ColumnData>> {
        self.get(column, Some(row))
    }

    /// A whole column.
    pub fn column(&self, column: &str) -> Result<Arc<ColumnData>> {
        self.get(column, None)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
