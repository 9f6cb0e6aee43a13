//! Shared types for the document registry client.
//!
//! Everything that crosses a crate boundary lives here: the chain access
//! seams, contract kinds and roles, decoded records, transaction outcomes
//! and the error taxonomy.

pub mod chain;
pub mod contract;
pub mod errors;
pub mod outcome;
pub mod record;

pub use chain::*;
pub use contract::*;
pub use errors::*;
pub use outcome::*;
pub use record::*;
