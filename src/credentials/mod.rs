//! Credential module for insights
//!
//! Holds the fetch-once API key list and the lock-free rotation cursor.

mod pool;
mod provider;

pub use pool::{mask_key, CredentialPool, KeySnapshot};
pub use provider::{KeyProvider, KeysFile, StaticKeys};
