use crate::error::KVError;

/// KVStore is a flat string key/value interface.
///
/// `batch_set` and `batch_delete` apply all entries in one transaction: a
/// reader sees either none or all of them.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, KVError>;

    /// Set a single key.
    fn set(&self, key: &str, value: &str) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set several keys atomically.
    fn batch_set(&self, entries: &[(&str, &str)]) -> Result<(), KVError>;

    /// Delete several keys atomically.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;
}
