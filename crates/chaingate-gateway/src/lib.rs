//! ChainGate Gateway Library
//!
//! Request gating against an on-chain permission registry:
//! - Registry client: identity -> `eth_call` -> verdict (fail-closed)
//! - Gating middleware: `X-Web3-Address` extraction and allow/deny mapping
//! - Reverse proxy to the protected backend
//! - Router assembly

pub mod filter;
pub mod proxy;
pub mod registry;
pub mod routes;

pub use filter::{GateState, IDENTITY_HEADER, require_access};
pub use proxy::Upstream;
pub use registry::{AccessDecider, RegistryClient, RegistryError};
pub use routes::{build_router, gate};
