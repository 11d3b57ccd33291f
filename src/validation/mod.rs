//! Configuration file graph validation
//!
//! - [`reader`]: access to configuration files
//! - [`validator`]: the firewall → policy → rule group walk

pub mod reader;
pub mod validator;

pub use reader::{ConfigFileReader, FsConfigReader};
pub use validator::{check_firewall_name_and_policy, ConfigGraphValidator};
