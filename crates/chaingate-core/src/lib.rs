//! `ChainGate` Core Library
//!
//! Shared functionality for `ChainGate` components:
//! - Caller identity type
//! - ABI encoding/decoding for permission-registry calls
//! - Configuration resolution and hierarchy
//! - Common error types

pub mod abi;
pub mod config;
pub mod error;
pub mod identity;
pub mod tracing_init;

pub use config::{AccessPolicy, GatewayConfig, RegistryConfig};
pub use error::{Error, Result};
pub use identity::Identity;
