//! Core infrastructure for tugtype.
//!
//! This crate provides the language-agnostic pieces shared by the trace
//! aligner and the call-graph builder:
//! - Source locations
//! - Structural type values and the tri-state parameter type slot
//! - TOML configuration
//! - Error types
//! - Tracing subscriber setup for hosts

pub mod config;
pub mod error;
pub mod logging;
pub mod type_node;
pub mod types;

pub use type_node::{TypeNode, TypeSlot};
pub use types::Location;
