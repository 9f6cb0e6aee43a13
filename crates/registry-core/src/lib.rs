//! Registry client facade.
//!
//! [`RegistryClient`] wires the provider manager, resolver, hierarchical
//! search, transaction executor and tracer together behind one handle that
//! front ends (the CLI, a UI) talk to. It is built from a
//! [`registry_config::RegistryConfig`] by [`RegistryClientBuilder`].

pub mod client;
pub mod error;

pub use client::{hash_file, RegistryClient, RegistryClientBuilder};
pub use error::CoreError;
