// Main rules module - the validator's rule system
// - engine.rs: RowRules trait, rule runner, ValidationReport and Validator
// - validation.rs: the per-entity rule sets
// - violation.rs: Violation names and the shared cell predicates

pub mod engine;
pub mod validation;
pub mod violation;

pub use engine::*;
pub use violation::{NumericCell, Violation};
