//! Ambient, dependency-light helpers shared by every crate in the workspace:
//! workspace path resolution, project hashing, and canonical JSON encoding
//! for the audit journal's hash chain.

pub mod canonical;
pub mod error;
pub mod path;

pub use error::{Error, Result};
