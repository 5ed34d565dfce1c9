// Anonymous confessions: a moderated submission pipeline, a confession and
// comment store, and the HTTP API in front of them.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (databases, classifiers, clients)
// - `http/` = axum adapters (routes, JSON envelope)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "http/http_layer.rs"]
pub mod http;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;
