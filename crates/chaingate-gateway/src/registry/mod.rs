//! Permission-registry decision client.
//!
//! Turns a caller identity into an allow/deny verdict by issuing a read-only
//! `eth_call` against the registry contract over JSON-RPC.

mod client;
pub mod rpc;


pub use client::{AccessDecider, PermissionQuery, RegistryClient, RegistryError};
