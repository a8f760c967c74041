//! Command implementations.

pub mod routes;

pub use self::routes::{collect_routes, execute_routes};
