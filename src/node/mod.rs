pub mod config;
pub mod dev_node;
pub mod service_handle;
pub mod cli;

pub use config::VerifierConfig;
pub use dev_node::{DevNode, DevNodeConfig};
pub use service_handle::ServiceHandle;
pub use cli::run_cli;
