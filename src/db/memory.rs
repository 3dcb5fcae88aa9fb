//! A process-local document store. Useful for development and tests, all data
//! is lost when the process exits.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{Document, Fields, Filter, Key};


type Collection = BTreeMap<Key, Vec<Option<String>>>;

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<&'static str, Collection>,
    last_key: u64,
}

impl Inner {
    fn collection<D: Document>(&mut self) -> &mut Collection {
        self.collections.entry(D::COLLECTION).or_default()
    }
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave a record half-written,
        // so poisoning is ignored.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn find<D: Document>(&self, filter: Filter<'_>) -> Vec<D> {
        let mut inner = self.lock();
        let matches = |values: &Vec<Option<String>>| match filter {
            Filter::All => true,
            Filter::Eq(field, expected) => {
                values[D::field_index(field)].as_deref() == Some(expected)
            }
        };

        inner.collection::<D>()
            .iter()
            .filter(|(_, values)| matches(values))
            .map(|(key, values)| D::from_values(*key, values.clone()))
            .collect()
    }

    pub(crate) fn find_by_key<D: Document>(&self, key: Key) -> Option<D> {
        self.lock()
            .collection::<D>()
            .get(&key)
            .map(|values| D::from_values(key, values.clone()))
    }

    pub(crate) fn insert<D: Document>(&self, fields: Fields) -> D {
        let mut values = vec![None; D::FIELDS.len()];
        for (name, value) in fields {
            values[D::field_index(name)] = value;
        }

        let mut inner = self.lock();
        inner.last_key += 1;
        let key = Key(inner.last_key);
        inner.collection::<D>().insert(key, values.clone());
        D::from_values(key, values)
    }

    pub(crate) fn update_by_key<D: Document>(&self, key: Key, fields: Fields) -> Option<D> {
        let mut inner = self.lock();
        let values = inner.collection::<D>().get_mut(&key)?;
        for (name, value) in fields {
            values[D::field_index(name)] = value;
        }

        Some(D::from_values(key, values.clone()))
    }

    pub(crate) fn delete_by_key<D: Document>(&self, key: Key) -> Option<D> {
        self.lock()
            .collection::<D>()
            .remove(&key)
            .map(|values| D::from_values(key, values))
    }
}
