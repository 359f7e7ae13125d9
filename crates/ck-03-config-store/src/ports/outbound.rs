//! # Outbound Ports
//!
//! Key-value backing store for persisted sessions.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::errors::PersistenceError;

/// `localStorage`-shaped key-value store.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Process-local storage. Also serves as the test double.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.items.write().remove(key);
        Ok(())
    }
}
