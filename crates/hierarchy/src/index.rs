//! Flattened id lookup for turning stored hierarchy ids back into names.

use std::collections::HashMap;

use sangha_interchange::{sub_field_id, Level, MilanEntry, Organization, Snapshot};
use serde::{Deserialize, Serialize};

use crate::tree::{org_key, DirectMilan, OrgTree};

/// Shown by [`resolve_path`] when no level is selected.
pub const NOT_SPECIFIED: &str = "Not specified";

const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub parent: Option<String>,
}

/// id → name (and parent) per level, built once per tree fetch.
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    organizations: HashMap<String, IndexEntry>,
    khandas: HashMap<String, IndexEntry>,
    valayas: HashMap<String, IndexEntry>,
    milans: HashMap<String, IndexEntry>,
    ghatas: HashMap<String, IndexEntry>,
}

impl HierarchyIndex {
    /// One pass over the nested tree. Later duplicates overwrite earlier ones.
    pub fn build(orgs: &[Organization]) -> Self {
        let mut index = HierarchyIndex::default();
        for (position, org) in orgs.iter().enumerate() {
            let org_id = org_key(position, &org.id);
            index.put(Level::Organization, &org_id, &org.name, None);
            for k in &org.khandas {
                index.put(Level::Khanda, &k.id, &k.name, Some(&org_id));
                for v in &k.valayas {
                    index.put(Level::Valaya, &v.id, &v.name, Some(&k.id));
                    for m in &v.milans {
                        index.put(Level::Milan, &m.id, &m.name, Some(&v.id));
                        for g in &m.ghatas {
                            index.put(Level::Ghata, &g.id, &g.name, Some(&m.id));
                        }
                    }
                }
                for entry in &k.milans {
                    if let MilanEntry::Node(m) = entry {
                        index.put(Level::Milan, &m.id, &m.name, Some(&k.id));
                        for g in &m.ghatas {
                            index.put(Level::Ghata, &g.id, &g.name, Some(&m.id));
                        }
                    }
                }
            }
        }
        index
    }

    /// Index the live arena tree.
    pub fn from_tree(tree: &OrgTree) -> Self {
        let mut index = HierarchyIndex::default();
        for org in tree.organizations() {
            index.put(Level::Organization, &org.id, &org.name, None);
            for k in tree.khandas_of(&org.id) {
                index.put(Level::Khanda, &k.id, &k.name, Some(&org.id));
                for v in tree.valayas_of(&k.id) {
                    index.put(Level::Valaya, &v.id, &v.name, Some(&k.id));
                    for m in tree.milans_of(&v.id) {
                        index.put(Level::Milan, &m.id, &m.name, Some(&v.id));
                        for g in tree.ghatas_of(&m.id) {
                            index.put(Level::Ghata, &g.id, &g.name, Some(&m.id));
                        }
                    }
                }
                for d in &k.direct_milans {
                    let DirectMilan::Node(id) = d else { continue };
                    if let Some(m) = tree.milan(id) {
                        index.put(Level::Milan, &m.id, &m.name, Some(&k.id));
                        for g in tree.ghatas_of(&m.id) {
                            index.put(Level::Ghata, &g.id, &g.name, Some(&m.id));
                        }
                    }
                }
            }
        }
        index
    }

    fn level_map(&self, level: Level) -> &HashMap<String, IndexEntry> {
        match level {
            Level::Organization => &self.organizations,
            Level::Khanda => &self.khandas,
            Level::Valaya => &self.valayas,
            Level::Milan => &self.milans,
            Level::Ghata => &self.ghatas,
        }
    }

    fn put(&mut self, level: Level, id: &str, name: &str, parent: Option<&str>) {
        let map = match level {
            Level::Organization => &mut self.organizations,
            Level::Khanda => &mut self.khandas,
            Level::Valaya => &mut self.valayas,
            Level::Milan => &mut self.milans,
            Level::Ghata => &mut self.ghatas,
        };
        map.insert(
            id.to_string(),
            IndexEntry {
                name: name.to_string(),
                parent: parent.map(str::to_string),
            },
        );
    }

    pub fn get(&self, level: Level, id: &str) -> Option<&IndexEntry> {
        self.level_map(level).get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
            && self.khandas.is_empty()
            && self.valayas.is_empty()
            && self.milans.is_empty()
            && self.ghatas.is_empty()
    }

    /// Name for `id`, or `id` itself when the index does not know it.
    pub fn resolve_name<'a>(&'a self, id: &'a str, level: Level) -> &'a str {
        self.get(level, id).map(|e| e.name.as_str()).unwrap_or(id)
    }

    pub fn parent_of(&self, level: Level, id: &str) -> Option<&str> {
        self.get(level, id).and_then(|e| e.parent.as_deref())
    }

    /// Resolved names of the present levels joined with `" > "`.
    pub fn resolve_path(&self, selection: &Selection) -> String {
        let parts: Vec<&str> = selection
            .levels()
            .filter_map(|(level, id)| id.map(|id| self.resolve_name(id, level)))
            .collect();
        if parts.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            parts.join(PATH_SEPARATOR)
        }
    }
}

pub fn build_index(orgs: &[Organization]) -> HierarchyIndex {
    HierarchyIndex::build(orgs)
}

pub fn resolve_name(index: &HierarchyIndex, id: &str, level: Level) -> String {
    index.resolve_name(id, level).to_string()
}

pub fn resolve_path(index: &HierarchyIndex, selection: &Selection) -> String {
    index.resolve_path(selection)
}

/// A (possibly partial) khanda/valaya/milan/ghata selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub khanda: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valaya: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghata: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Organization => None,
            Level::Khanda => self.khanda.as_deref(),
            Level::Valaya => self.valaya.as_deref(),
            Level::Milan => self.milan.as_deref(),
            Level::Ghata => self.ghata.as_deref(),
        }
    }

    /// Blank values count as absent.
    pub fn set(&mut self, level: Level, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty()).map(str::to_string);
        match level {
            Level::Organization => {}
            Level::Khanda => self.khanda = value,
            Level::Valaya => self.valaya = value,
            Level::Milan => self.milan = value,
            Level::Ghata => self.ghata = value,
        }
    }

    pub fn with(mut self, level: Level, value: &str) -> Self {
        self.set(level, Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.levels().all(|(_, v)| v.is_none())
    }

    /// Khanda through ghata, in order.
    pub fn levels(&self) -> impl Iterator<Item = (Level, Option<&str>)> {
        sangha_interchange::SUB_LEVELS
            .into_iter()
            .map(move |level| (level, self.get(level)))
    }

    /// Read the `<field>-khanda` .. `<field>-ghata` sub-values of a sangha
    /// field from a snapshot.
    pub fn from_snapshot(field_id: &str, snapshot: &Snapshot) -> Self {
        let mut selection = Selection::new();
        for level in sangha_interchange::SUB_LEVELS {
            let value = snapshot
                .get(&sub_field_id(field_id, level))
                .and_then(|v| v.as_text());
            selection.set(level, value);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{sample_orgs, sample_tree};

    #[test]
    fn resolves_names_at_every_level() {
        let index = build_index(&sample_orgs());
        assert_eq!(resolve_name(&index, "org1", Level::Organization), "Karnataka Dakshina");
        assert_eq!(resolve_name(&index, "k1", Level::Khanda), "Bengaluru");
        assert_eq!(resolve_name(&index, "v1", Level::Valaya), "Jayanagar");
        assert_eq!(resolve_name(&index, "m1", Level::Milan), "Tilak Milan");
        assert_eq!(resolve_name(&index, "m9", Level::Milan), "MilanB");
        assert_eq!(resolve_name(&index, "g2", Level::Ghata), "Ghata 2");
        assert_eq!(index.parent_of(Level::Ghata, "g9"), Some("m9"));
        assert_eq!(index.parent_of(Level::Milan, "m9"), Some("k2"));
        assert_eq!(index.parent_of(Level::Organization, "org1"), None);
    }

    #[test]
    fn dangling_id_resolves_to_itself() {
        let index = build_index(&sample_orgs());
        assert_eq!(resolve_name(&index, "nonexistent-id", Level::Khanda), "nonexistent-id");
        // right id, wrong level
        assert_eq!(resolve_name(&index, "k1", Level::Valaya), "k1");
    }

    #[test]
    fn path_skips_absent_levels() {
        let index = build_index(&sample_orgs());
        let khanda_only = Selection::new().with(Level::Khanda, "k1");
        assert_eq!(resolve_path(&index, &khanda_only), "Bengaluru");

        let full = khanda_only
            .with(Level::Valaya, "v1")
            .with(Level::Milan, "m1")
            .with(Level::Ghata, "g1");
        assert_eq!(
            resolve_path(&index, &full),
            "Bengaluru > Jayanagar > Tilak Milan > Ghata 1"
        );

        let gap = Selection::new().with(Level::Khanda, "k1").with(Level::Milan, "m2");
        assert_eq!(resolve_path(&index, &gap), "Bengaluru > Shivaji Milan");
    }

    #[test]
    fn empty_selection_is_not_specified() {
        let index = build_index(&sample_orgs());
        assert_eq!(resolve_path(&index, &Selection::new()), NOT_SPECIFIED);
        assert_eq!(
            resolve_path(&index, &Selection::new().with(Level::Khanda, "")),
            "Not specified"
        );
    }

    #[test]
    fn empty_tree_resolves_nothing() {
        let index = build_index(&[]);
        assert!(index.is_empty());
        let sel = Selection::new().with(Level::Khanda, "k1").with(Level::Valaya, "v1");
        assert_eq!(resolve_path(&index, &sel), "k1 > v1");
    }

    #[test]
    fn tree_index_matches_nested_index() {
        let nested = build_index(&sample_orgs());
        let arena = HierarchyIndex::from_tree(&sample_tree());
        for (level, id) in [
            (Level::Organization, "org1"),
            (Level::Khanda, "k2"),
            (Level::Valaya, "v2"),
            (Level::Milan, "m9"),
            (Level::Ghata, "g1"),
        ] {
            assert_eq!(nested.get(level, id), arena.get(level, id));
        }
    }

    #[test]
    fn selection_from_snapshot_reads_sub_ids() {
        let snapshot = Snapshot::new()
            .with("region-khanda", "k1")
            .with("region-valaya", "")
            .with("region-milan", "m1")
            .with("other-khanda", "k2");
        let sel = Selection::from_snapshot("region", &snapshot);
        assert_eq!(sel.khanda.as_deref(), Some("k1"));
        assert_eq!(sel.valaya, None);
        assert_eq!(sel.milan.as_deref(), Some("m1"));
        assert_eq!(sel.ghata, None);
    }
}
