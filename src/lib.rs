//! nfw-reconciler - Network firewall configuration reconciler
//!
//! Validates a directory of firewall, policy and rule group definitions
//! against the remote firewall service, and provides the retrying update
//! protocols used when applying them.

pub mod assets;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod telemetry;
pub mod validation;
