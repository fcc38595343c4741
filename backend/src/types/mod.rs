//! Shared newtypes used across models, repositories, and handlers.

pub mod id;

pub use id::*;
