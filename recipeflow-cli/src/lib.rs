// All core functionality is in recipeflow-core
// This CLI acts as a thin wrapper around the core library

// Re-export core types for convenience
pub use recipeflow_core::*;
