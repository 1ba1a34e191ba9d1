//! Key-value store trait definition.
//!
//! The `KeyValueStore` trait is the only thing the encrypted layers need from
//! a backend. Values are opaque bytes; encryption happens above this trait.

use crate::error::Result;

/// Durable key-value byte store.
///
/// All implementations must ensure:
/// - `set` either fully replaces the previous value or leaves it untouched
/// - `get` after a successful `set` returns exactly the bytes written
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `name`.
    ///
    /// Returns `Ok(None)` if nothing has been stored under `name` yet.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Storage` if the backend cannot be read.
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `name`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Storage` if the write did not complete. The
    /// previous value must still be readable in that case.
    fn set(&mut self, name: &str, value: &[u8]) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: &[u8]) -> Result<()> {
        (**self).set(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_boxed(_store: Box<dyn KeyValueStore>) {}
        fn _accepts_store<T: KeyValueStore>(_store: T) {}
    }
}
