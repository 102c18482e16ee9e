//! Server module for Switchyard
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Configuration checks and production warnings
//! - `state`: Shared handler state
//! - `init`: Component wiring and the main run loop

mod background_tasks;
pub mod config;
mod init;
mod loader;
mod state;
mod validation;

pub use init::{init_registry, run};
pub use loader::load_config;
pub use state::AppState;
pub use validation::validate_config;

#[cfg(test)]
pub use init::build_supervisor;
#[cfg(test)]
pub use loader::load_from_str;
