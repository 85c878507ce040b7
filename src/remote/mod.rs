//! Remote document store access.

pub mod client;
pub mod wire;

pub use client::DocumentClient;
