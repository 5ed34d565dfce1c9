// Core confessions module - records, storage ports and the service façade.

pub mod confession_models;
pub mod confession_service;
pub mod confession_store;

pub use confession_models::*;
pub use confession_service::ConfessionService;
pub use confession_store::*;
