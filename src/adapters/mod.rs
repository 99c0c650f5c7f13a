//! Adapters - Implementations of port interfaces.
//!
//! - `gateways` - One `GatewayAdapter` per payment provider
//! - `rest` - `reqwest` client for the payments backend
//! - `checkpoint` - File-backed and in-memory checkpoint stores
//! - `mock` - Mock backend and provider scripts for tests and demos

pub mod checkpoint;
pub mod gateways;
pub mod mock;
pub mod rest;
