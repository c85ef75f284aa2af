//! CLI command implementations.

pub mod compare;
pub mod diff;
pub mod extract;
pub mod files;
pub mod infer;
pub mod ingest;
pub mod versions;
