//! Configuration management for the layer daemon
//!
//! Values come from `config.toml`; command line flags override them.

mod defaults;
mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::*;
