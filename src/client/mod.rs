//! Remote firewall service clients
//!
//! - [`traits`]: The `RemoteFirewallClient` transport seam
//! - [`http`]: JSON-protocol implementation over `reqwest`

pub mod http;
pub mod traits;

pub use http::HttpFirewallClient;
pub use traits::RemoteFirewallClient;

#[cfg(test)]
pub use traits::MockRemoteFirewallClient;
