//! sangha-hierarchy: the organization tree (organization > khanda > valaya >
//! milan > ghata) and the operations built on it.
//!
//! - [`tree`]: arena storage with edits and nested round-trip
//! - [`index`]: id → name lookup and path display
//! - [`selector`]: cascading level selection
//! - [`bulk`]: placing imported rows
//! - [`response`]: readable rows for a stored response

pub mod bulk;
pub mod error;
pub mod index;
pub mod response;
pub mod selector;
pub mod tree;

pub use bulk::{ensure_path, import_rows, validate_target, ImportSummary, PathNames, Placement};
pub use error::HierarchyError;
pub use index::{
    build_index, resolve_name, resolve_path, HierarchyIndex, IndexEntry, Selection, NOT_SPECIFIED,
};
pub use response::{display_response, display_value, DisplayRow};
pub use selector::{Choice, HierarchySelector, SelectorState};
pub use tree::OrgTree;

use sangha_interchange::InterchangeError;

/// Parse a fetched tree document (`{organizations: [...]}` or a bare array)
/// into an arena tree.
pub fn load_tree(doc: &serde_json::Value) -> Result<OrgTree, InterchangeError> {
    let orgs = sangha_interchange::organizations_from_json(doc)?;
    Ok(OrgTree::from_organizations(&orgs))
}
