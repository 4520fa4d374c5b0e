//! Protected backend for ChainGate.
//!
//! Reachable only through the gateway; it performs no authorization itself.

pub mod routes;
