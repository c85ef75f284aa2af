//! Schema inference.
//!
//! A run samples up to [`InferenceConfig::sample_limit`] documents from every
//! typed fragment of a source, records the JSON type of each field, and
//! stores the union as the source's next [`SchemaVersion`](crate::SchemaVersion).

mod accumulator;
mod engine;

pub use accumulator::TypeAccumulator;
pub use engine::{InferenceConfig, SchemaInferenceEngine};
