// The http module is the outermost adapter: axum handlers over ConfessionService.

#[path = "responses.rs"]
pub mod responses;

#[path = "routes.rs"]
pub mod routes;

pub use routes::router;
