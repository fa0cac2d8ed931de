//! Configuration loading and schema definitions
//!
//! Tunables for clustering, proximity filtering, live sync and logging.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
