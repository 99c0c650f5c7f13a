//! Encore Billing - payments and subscriptions for the Encore client.
//!
//! Drives one-off song and album purchases and artist subscriptions through
//! three payment gateways (card vault, hosted checkout, redirect approval)
//! and keeps a backend-confirmed view of what the listener owns.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
