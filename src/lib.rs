pub mod chain;
pub mod contracts;
pub mod fixtures;
pub mod node;
pub mod rpc;
pub mod utils;
pub mod verifier;

#[cfg(test)]
mod tests;
