//! Test-environment fixtures. The node fixture lives in `node::dev_node`.

pub mod deployment;

pub use deployment::{DeployConfig, DeployError, DeployedContracts};
