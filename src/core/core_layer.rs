// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "confessions/mod.rs"]
pub mod confessions;

#[path = "identity/identity_provider.rs"]
pub mod identity;

#[path = "moderation/mod.rs"]
pub mod moderation;
