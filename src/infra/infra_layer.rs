// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "storage/mod.rs"]
pub mod storage;

#[path = "classifier/mod.rs"]
pub mod classifier;

#[path = "identity/file_identity.rs"]
pub mod identity;

#[path = "client/api_client.rs"]
pub mod client;
