//! Shared types and error plumbing used across the hikka crates.
//!
//! The [`types`] module describes the data exchanged with the messaging
//! platform client; it carries no behaviour of its own.

pub mod error;
pub mod types;

pub use error::FromMessage;
