//! String key/value storage for client-side state.
//!
//! Plays the part browser local storage plays for a web front end: a flat
//! namespace of string keys holding string values, persisted across runs.

pub mod error;
pub mod memory;
pub mod redb;
pub mod traits;

pub use error::KVError;
pub use memory::MemoryStore;
pub use redb::RedbStore;
pub use traits::KVStore;
