// Recipeflow Core Library
//
// Seeds a document store, exports it to JSON, normalizes the documents into
// flat tables, validates them and reports descriptive analytics.

pub mod analytics;
pub mod cleanup;
pub mod config;
pub mod export;
pub mod normalize;
pub mod processor;
pub mod rules;
pub mod seed;
pub mod store;
pub mod tables;
pub mod types;

// Re-export main types and functions for easy use
pub use config::PipelineConfig;
pub use normalize::Normalizer;
pub use processor::{Pipeline, StepProfiler};
pub use rules::{ValidationReport, Validator};
pub use store::{DocumentStore, EmulatorStore, LocalStore, StoreError};
pub use types::*;
