//! In-memory key-value backend.

use std::collections::HashMap;

use crate::error::Result;
use crate::storage::traits::KeyValueStore;

/// Key-value store backed by a `HashMap`. Contents are lost on drop.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.get(name).cloned())
    }

    fn set(&mut self, name: &str, value: &[u8]) -> Result<()> {
        self.slots.insert(name.to_string(), value.to_vec());
        Ok(())
    }
}
