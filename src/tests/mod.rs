//! Cross-module tests.
//!
//! - Integration tests (devnode over HTTP, deployment, full registration runs)

mod integration;
