use sangha_interchange::Level;

/// Errors from editing the organization tree or validating a target path.
///
/// Read-side operations (index lookups, selector children, path display)
/// never fail; only explicit edits and bulk-target checks return these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// No node with this id exists at this level.
    #[error("unknown {level} '{id}'")]
    UnknownNode { level: Level, id: String },

    /// A node with this id already exists somewhere in the tree.
    #[error("duplicate {level} id '{id}'")]
    DuplicateId { level: Level, id: String },

    /// The selected child is not under the selected parent.
    #[error("{child_level} '{child}' does not belong to {parent_level} '{parent}'")]
    NotAChild {
        child_level: Level,
        child: String,
        parent_level: Level,
        parent: String,
    },

    /// A level is set while the level it depends on is not.
    #[error("{level} is set but no {missing} is selected")]
    MissingLevel { level: Level, missing: Level },

    /// A new node needs a non-blank name.
    #[error("a new {level} needs a name")]
    EmptyName { level: Level },
}
