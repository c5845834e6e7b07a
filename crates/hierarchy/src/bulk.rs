//! Placing bulk-imported rows into the hierarchy.
//!
//! Imported rows name their khanda/valaya/milan/ghata rather than carrying
//! ids. [`ensure_path`] finds or creates each named node under one
//! organization; [`validate_target`] checks that an id selection is a
//! consistent path before anything is written against it.

use serde::{Deserialize, Serialize};

use sangha_interchange::Level;

use crate::error::HierarchyError;
use crate::index::Selection;
use crate::tree::{DirectMilan, OrgTree};

/// Node names for one imported row. Absent levels are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNames {
    #[serde(default)]
    pub khanda: Option<String>,
    #[serde(default)]
    pub valaya: Option<String>,
    #[serde(default)]
    pub milan: Option<String>,
    #[serde(default)]
    pub ghata: Option<String>,
}

/// Where a row landed and how many nodes were created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub selection: Selection,
    pub created: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub placements: Vec<Placement>,
    pub created: usize,
}

/// Check that every selected level belongs to the level selected above it.
///
/// Under a khanda with no valayas the milan is matched by name against the
/// khanda's own milans, the same value the selector stores.
pub fn validate_target(tree: &OrgTree, selection: &Selection) -> Result<(), HierarchyError> {
    let Some(khanda_id) = selection.khanda.as_deref() else {
        return match first_present(selection) {
            Some(level) => Err(HierarchyError::MissingLevel {
                level,
                missing: Level::Khanda,
            }),
            None => Ok(()),
        };
    };
    let khanda = tree.khanda(khanda_id).ok_or_else(|| unknown(Level::Khanda, khanda_id))?;

    let milan_id: Option<String> = match (selection.valaya.as_deref(), selection.milan.as_deref()) {
        (Some(valaya_id), milan) => {
            let valaya = tree.valaya(valaya_id).ok_or_else(|| unknown(Level::Valaya, valaya_id))?;
            if valaya.khanda != khanda.id {
                return Err(not_a_child(Level::Valaya, valaya_id, Level::Khanda, khanda_id));
            }
            match milan {
                Some(m) if valaya.milans.iter().any(|id| id == m) => Some(m.to_string()),
                Some(m) => {
                    return Err(not_a_child(Level::Milan, m, Level::Valaya, valaya_id));
                }
                None => None,
            }
        }
        (None, Some(m)) => {
            if !khanda.valayas.is_empty() {
                return Err(HierarchyError::MissingLevel {
                    level: Level::Milan,
                    missing: Level::Valaya,
                });
            }
            let found = khanda.direct_milans.iter().find_map(|d| match d {
                DirectMilan::Name(name) if name == m => Some(None),
                DirectMilan::Node(id) => tree
                    .milan(id)
                    .filter(|node| node.name == m || node.id == m)
                    .map(|node| Some(node.id.clone())),
                DirectMilan::Name(_) => None,
            });
            match found {
                Some(node_id) => node_id,
                None => return Err(not_a_child(Level::Milan, m, Level::Khanda, khanda_id)),
            }
        }
        (None, None) => None,
    };

    if let Some(ghata_id) = selection.ghata.as_deref() {
        if selection.milan.is_none() {
            return Err(HierarchyError::MissingLevel {
                level: Level::Ghata,
                missing: Level::Milan,
            });
        }
        let ghata = tree.ghata(ghata_id).ok_or_else(|| unknown(Level::Ghata, ghata_id))?;
        let milan_ref = selection.milan.as_deref().unwrap_or_default();
        if milan_id.as_deref() != Some(ghata.milan.as_str()) {
            return Err(not_a_child(Level::Ghata, ghata_id, Level::Milan, milan_ref));
        }
    }
    Ok(())
}

/// Find or create the named path under `org_id`, returning the selection
/// the row should be stored with. Names match case-insensitively after
/// trimming; new nodes get random v4 uuids.
pub fn ensure_path(
    tree: &mut OrgTree,
    org_id: &str,
    names: &PathNames,
) -> Result<Placement, HierarchyError> {
    if tree.organization(org_id).is_none() {
        return Err(unknown(Level::Organization, org_id));
    }
    let mut selection = Selection::new();
    let mut created = 0;

    let Some(khanda_name) = clean(&names.khanda) else {
        return match first_named(names) {
            Some(level) => Err(HierarchyError::MissingLevel {
                level,
                missing: Level::Khanda,
            }),
            None => Ok(Placement { selection, created }),
        };
    };
    let existing = tree
        .khandas_of(org_id)
        .into_iter()
        .find(|k| same_name(&k.name, khanda_name))
        .map(|k| k.id.clone());
    let khanda_id = match existing {
        Some(id) => id,
        None => {
            let id = new_id();
            tree.add_khanda(org_id, &id, khanda_name, "")?;
            created += 1;
            id
        }
    };
    selection.khanda = Some(khanda_id.clone());

    // Milan node the ghata should hang under, if any.
    let mut milan_node: Option<String> = None;

    match (clean(&names.valaya), clean(&names.milan)) {
        (Some(valaya_name), milan_name) => {
            let existing = tree
                .valayas_of(&khanda_id)
                .into_iter()
                .find(|v| same_name(&v.name, valaya_name))
                .map(|v| v.id.clone());
            let valaya_id = match existing {
                Some(id) => id,
                None => {
                    let id = new_id();
                    tree.add_valaya(&khanda_id, &id, valaya_name)?;
                    created += 1;
                    id
                }
            };
            selection.valaya = Some(valaya_id.clone());

            if let Some(milan_name) = milan_name {
                let existing = tree
                    .milans_of(&valaya_id)
                    .into_iter()
                    .find(|m| same_name(&m.name, milan_name))
                    .map(|m| m.id.clone());
                let milan_id = match existing {
                    Some(id) => id,
                    None => {
                        let id = new_id();
                        tree.add_milan(&valaya_id, &id, milan_name)?;
                        created += 1;
                        id
                    }
                };
                selection.milan = Some(milan_id.clone());
                milan_node = Some(milan_id);
            }
        }
        (None, Some(milan_name)) => {
            let has_valayas = tree
                .khanda(&khanda_id)
                .map(|k| !k.valayas.is_empty())
                .unwrap_or(false);
            if has_valayas {
                return Err(HierarchyError::MissingLevel {
                    level: Level::Milan,
                    missing: Level::Valaya,
                });
            }
            let found = tree.khanda(&khanda_id).and_then(|k| {
                k.direct_milans.iter().find_map(|d| match d {
                    DirectMilan::Name(n) if same_name(n, milan_name) => Some((n.clone(), None)),
                    DirectMilan::Node(id) => tree
                        .milan(id)
                        .filter(|m| same_name(&m.name, milan_name))
                        .map(|m| (m.name.clone(), Some(m.id.clone()))),
                    DirectMilan::Name(_) => None,
                })
            });
            match found {
                Some((stored_name, node)) => {
                    selection.milan = Some(stored_name);
                    milan_node = node;
                }
                None => {
                    let id = new_id();
                    tree.add_direct_milan(&khanda_id, &id, milan_name)?;
                    created += 1;
                    selection.milan = Some(milan_name.to_string());
                    milan_node = Some(id);
                }
            }
        }
        (None, None) => {}
    }

    if let Some(ghata_name) = clean(&names.ghata) {
        let Some(milan_id) = milan_node else {
            return Err(match &selection.milan {
                // a bare-name milan has no node to hold ghatas
                Some(name) => unknown(Level::Milan, name),
                None => HierarchyError::MissingLevel {
                    level: Level::Ghata,
                    missing: Level::Milan,
                },
            });
        };
        let existing = tree
            .ghatas_of(&milan_id)
            .into_iter()
            .find(|g| same_name(&g.name, ghata_name))
            .map(|g| g.id.clone());
        let ghata_id = match existing {
            Some(id) => id,
            None => {
                let id = new_id();
                tree.add_ghata(&milan_id, &id, ghata_name)?;
                created += 1;
                id
            }
        };
        selection.ghata = Some(ghata_id);
    }

    Ok(Placement { selection, created })
}

/// Place every row, or none of them: the batch is staged on a copy of
/// `tree` and committed only when the last row is placed.
pub fn import_rows(
    tree: &mut OrgTree,
    org_id: &str,
    rows: &[PathNames],
) -> Result<ImportSummary, HierarchyError> {
    let mut staged = tree.clone();
    let mut summary = ImportSummary::default();
    for (i, row) in rows.iter().enumerate() {
        let placement = ensure_path(&mut staged, org_id, row).inspect_err(|e| {
            tracing::warn!(row = i, error = %e, "row cannot be placed; import discarded");
        })?;
        summary.created += placement.created;
        summary.placements.push(placement);
    }
    *tree = staged;
    tracing::debug!(rows = rows.len(), created = summary.created, "import placed");
    Ok(summary)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn clean(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn first_present(selection: &Selection) -> Option<Level> {
    selection.levels().find(|(_, v)| v.is_some()).map(|(l, _)| l)
}

fn first_named(names: &PathNames) -> Option<Level> {
    [
        (Level::Valaya, &names.valaya),
        (Level::Milan, &names.milan),
        (Level::Ghata, &names.ghata),
    ]
    .into_iter()
    .find(|(_, n)| clean(n).is_some())
    .map(|(l, _)| l)
}

fn unknown(level: Level, id: &str) -> HierarchyError {
    tracing::warn!(%level, id, "dangling id in import target");
    HierarchyError::UnknownNode {
        level,
        id: id.to_string(),
    }
}

fn not_a_child(child_level: Level, child: &str, parent_level: Level, parent: &str) -> HierarchyError {
    HierarchyError::NotAChild {
        child_level,
        child: child.to_string(),
        parent_level,
        parent: parent.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;

    fn names(k: Option<&str>, v: Option<&str>, m: Option<&str>, g: Option<&str>) -> PathNames {
        PathNames {
            khanda: k.map(str::to_string),
            valaya: v.map(str::to_string),
            milan: m.map(str::to_string),
            ghata: g.map(str::to_string),
        }
    }

    #[test]
    fn consistent_targets_validate() {
        let tree = sample_tree();
        let full = Selection::new()
            .with(Level::Khanda, "k1")
            .with(Level::Valaya, "v1")
            .with(Level::Milan, "m1")
            .with(Level::Ghata, "g2");
        assert_eq!(validate_target(&tree, &full), Ok(()));
        assert_eq!(validate_target(&tree, &Selection::new()), Ok(()));

        let fallback = Selection::new().with(Level::Khanda, "k2").with(Level::Milan, "MilanA");
        assert_eq!(validate_target(&tree, &fallback), Ok(()));
        let fallback_ghata = Selection::new()
            .with(Level::Khanda, "k2")
            .with(Level::Milan, "MilanB")
            .with(Level::Ghata, "g9");
        assert_eq!(validate_target(&tree, &fallback_ghata), Ok(()));
    }

    #[test]
    fn inconsistent_targets_are_rejected() {
        let tree = sample_tree();
        let wrong_parent = Selection::new().with(Level::Khanda, "k2").with(Level::Valaya, "v1");
        assert!(matches!(
            validate_target(&tree, &wrong_parent),
            Err(HierarchyError::NotAChild { child_level: Level::Valaya, .. })
        ));

        let dangling = Selection::new().with(Level::Khanda, "nope");
        assert_eq!(
            validate_target(&tree, &dangling),
            Err(HierarchyError::UnknownNode { level: Level::Khanda, id: "nope".into() })
        );

        let orphan = Selection::new().with(Level::Valaya, "v1");
        assert_eq!(
            validate_target(&tree, &orphan),
            Err(HierarchyError::MissingLevel { level: Level::Valaya, missing: Level::Khanda })
        );

        let skipped_valaya = Selection::new().with(Level::Khanda, "k1").with(Level::Milan, "m1");
        assert!(matches!(
            validate_target(&tree, &skipped_valaya),
            Err(HierarchyError::MissingLevel { level: Level::Milan, .. })
        ));

        let foreign_ghata = Selection::new()
            .with(Level::Khanda, "k1")
            .with(Level::Valaya, "v1")
            .with(Level::Milan, "m2")
            .with(Level::Ghata, "g1");
        assert!(matches!(
            validate_target(&tree, &foreign_ghata),
            Err(HierarchyError::NotAChild { child_level: Level::Ghata, .. })
        ));
    }

    #[test]
    fn ensure_path_reuses_existing_nodes() {
        let mut tree = sample_tree();
        let placed = ensure_path(
            &mut tree,
            "org1",
            &names(Some("bengaluru"), Some(" Jayanagar "), Some("TILAK MILAN"), Some("ghata 2")),
        )
        .unwrap();
        assert_eq!(placed.created, 0);
        assert_eq!(placed.selection.ghata.as_deref(), Some("g2"));
        assert_eq!(placed.selection.milan.as_deref(), Some("m1"));
    }

    #[test]
    fn ensure_path_creates_missing_nodes() {
        let mut tree = sample_tree();
        let placed = ensure_path(
            &mut tree,
            "org1",
            &names(Some("Bengaluru"), Some("Banashankari"), Some("Keshava Milan"), None),
        )
        .unwrap();
        assert_eq!(placed.created, 2);
        assert_eq!(placed.selection.khanda.as_deref(), Some("k1"));
        let valaya = placed.selection.valaya.clone().unwrap();
        assert!(uuid::Uuid::parse_str(&valaya).is_ok());
        assert_eq!(tree.valaya(&valaya).unwrap().name, "Banashankari");
        assert_eq!(validate_target(&tree, &placed.selection), Ok(()));

        // same row again lands on the same nodes
        let again = ensure_path(
            &mut tree,
            "org1",
            &names(Some("Bengaluru"), Some("banashankari"), Some("keshava milan"), None),
        )
        .unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.selection, placed.selection);
    }

    #[test]
    fn ensure_path_under_valaya_less_khanda() {
        let mut tree = sample_tree();
        let existing = ensure_path(&mut tree, "org1", &names(Some("Mysuru"), None, Some("milana"), None))
            .unwrap();
        assert_eq!(existing.created, 0);
        assert_eq!(existing.selection.milan.as_deref(), Some("MilanA"));

        let fresh = ensure_path(
            &mut tree,
            "org1",
            &names(Some("Mysuru"), None, Some("MilanC"), Some("Ghata C")),
        )
        .unwrap();
        assert_eq!(fresh.created, 2);
        assert_eq!(fresh.selection.milan.as_deref(), Some("MilanC"));
        assert_eq!(validate_target(&tree, &fresh.selection), Ok(()));

        assert!(ensure_path(&mut tree, "org1", &names(Some("Mysuru"), None, Some("MilanA"), Some("G")))
            .is_err());
    }

    #[test]
    fn import_rows_sums_created_nodes() {
        let mut tree = sample_tree();
        let rows = vec![
            names(Some("Hubballi"), Some("Old Hubli"), None, None),
            names(Some("Hubballi"), Some("Old Hubli"), Some("Vivek Milan"), None),
            names(None, None, None, None),
        ];
        let summary = import_rows(&mut tree, "org1", &rows).unwrap();
        assert_eq!(summary.created, 3);
        assert_eq!(summary.placements.len(), 3);
        assert!(summary.placements[2].selection.is_empty());

        let bad = vec![names(None, Some("Orphan"), None, None)];
        assert!(import_rows(&mut tree, "org1", &bad).is_err());
        assert!(import_rows(&mut tree, "missing-org", &rows).is_err());
    }

    #[test]
    fn failed_import_leaves_tree_untouched() {
        let mut tree = sample_tree();
        let rows = vec![
            names(Some("Hubballi"), Some("Old Hubli"), Some("Vivek Milan"), None),
            names(None, Some("Orphan"), None, None),
        ];
        assert!(import_rows(&mut tree, "org1", &rows).is_err());
        assert_eq!(tree.count(Level::Khanda), 2);
        assert_eq!(tree.count(Level::Valaya), 2);
        assert_eq!(tree.count(Level::Milan), 3);
        assert_eq!(tree.to_organizations(), sample_tree().to_organizations());
    }
}
