//! Remote reconciliation protocols
//!
//! This module provides the retry protocols used when mutating or reading
//! remote firewall resources:
//! - Stale update token retry for policy and rule group updates
//! - Throttle retry for read paths
//! - Sequential logging configuration synchronization
//! - A service facade combining them

pub mod logging;
pub mod service;
pub mod throttle;
pub mod token;

pub use logging::LoggingConfigSynchronizer;
pub use service::NetworkFirewallService;
pub use throttle::ThrottleRetryProtocol;
pub use token::{TokenGuardedUpdate, UpdateTokenProtocol};
