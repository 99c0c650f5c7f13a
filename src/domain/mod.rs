//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, money, errors, state machine)
//! - `payment` - Payment attempt lifecycle across gateways
//! - `subscription` - Billing cycles, artist plans and plan resolution

pub mod foundation;
pub mod payment;
pub mod subscription;
