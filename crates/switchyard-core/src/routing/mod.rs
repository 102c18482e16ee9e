//! Agent selection
//!
//! [`select`] turns a query and a registry snapshot into the ordered list of
//! agents the supervisor will try.

mod selector;

pub use selector::{hint_tags, select, RoutingRules};

#[cfg(test)]
mod tests;
