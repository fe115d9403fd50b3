//! Shared type definitions.

pub mod id;
pub mod role;

pub use id::*;
pub use role::Role;
