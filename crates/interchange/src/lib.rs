//! sangha-interchange: shared JSON document types for forms, value
//! snapshots, and the organization tree.
//!
//! Both the rule evaluator (`sangha-eval`) and the hierarchy model
//! (`sangha-hierarchy`) consume these types. Each parses once here and
//! then converts to its own working representation.

pub mod deserialize;
pub mod types;

pub use deserialize::{
    form_from_json, organizations_from_json, snapshot_from_json, InterchangeError,
};
pub use types::*;
