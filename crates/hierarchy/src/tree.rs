//! Arena storage for the organization tree.
//!
//! Each level lives in its own flat map keyed by id, with a back-pointer
//! to the parent and an ordered list of child ids. Lookups and edits are
//! O(1) id operations; the nested JSON shape is rebuilt only at the
//! serialization boundary by [`OrgTree::to_organizations`].

use std::collections::HashMap;

use sangha_interchange::{Ghata, Khanda, Level, Milan, MilanEntry, Organization, Valaya};

use crate::error::HierarchyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgNode {
    /// Arena key. For an organization fetched without an id this is a
    /// positional key from [`org_key`].
    pub id: String,
    pub name: String,
    pub khandas: Vec<String>,
    /// True when the fetched organization carried no id.
    pub anonymous: bool,
}

/// Arena key for the organization at `position` in a fetched list.
/// Organizations may arrive without ids; those are keyed by position.
pub fn org_key(position: usize, id: &str) -> String {
    if id.is_empty() {
        format!("#{}", position)
    } else {
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KhandaNode {
    pub id: String,
    pub name: String,
    pub code: String,
    pub organization: String,
    pub valayas: Vec<String>,
    /// Milans attached straight to the khanda. Only consulted when
    /// `valayas` is empty.
    pub direct_milans: Vec<DirectMilan>,
}

/// A milan listed under a khanda without a valaya in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectMilan {
    /// Bare name with no node of its own.
    Name(String),
    /// Id of a full milan node stored in the milan map.
    Node(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValayaNode {
    pub id: String,
    pub name: String,
    pub khanda: String,
    pub milans: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilanParent {
    Valaya(String),
    Khanda(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilanNode {
    pub id: String,
    pub name: String,
    pub parent: MilanParent,
    pub ghatas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhataNode {
    pub id: String,
    pub name: String,
    pub milan: String,
}

/// The organization tree, stored flat.
#[derive(Debug, Clone, Default)]
pub struct OrgTree {
    org_order: Vec<String>,
    organizations: HashMap<String, OrgNode>,
    khandas: HashMap<String, KhandaNode>,
    valayas: HashMap<String, ValayaNode>,
    milans: HashMap<String, MilanNode>,
    ghatas: HashMap<String, GhataNode>,
}

impl OrgTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fetched tree. Never fails: a node whose id was already seen
    /// at the same level is skipped along with its subtree.
    pub fn from_organizations(orgs: &[Organization]) -> Self {
        let mut tree = OrgTree::new();
        for (position, org) in orgs.iter().enumerate() {
            let key = org_key(position, &org.id);
            if tree.organizations.contains_key(&key) {
                tracing::warn!(id = %key, "skipping duplicate organization");
                continue;
            }
            tree.org_order.push(key.clone());
            tree.organizations.insert(
                key.clone(),
                OrgNode {
                    id: key.clone(),
                    name: org.name.clone(),
                    khandas: Vec::new(),
                    anonymous: org.id.is_empty(),
                },
            );
            for khanda in &org.khandas {
                tree.load_khanda(&key, khanda);
            }
        }
        tree
    }

    fn load_khanda(&mut self, org_id: &str, k: &Khanda) {
        if self.khandas.contains_key(&k.id) {
            tracing::warn!(id = %k.id, "skipping duplicate khanda");
            return;
        }
        self.khandas.insert(
            k.id.clone(),
            KhandaNode {
                id: k.id.clone(),
                name: k.name.clone(),
                code: k.code.clone(),
                organization: org_id.to_string(),
                valayas: Vec::new(),
                direct_milans: Vec::new(),
            },
        );
        push_child(&mut self.organizations, org_id, |o| &mut o.khandas, &k.id);

        for valaya in &k.valayas {
            self.load_valaya(&k.id, valaya);
        }
        for entry in &k.milans {
            match entry {
                MilanEntry::Name(name) => {
                    if let Some(node) = self.khandas.get_mut(&k.id) {
                        node.direct_milans.push(DirectMilan::Name(name.clone()));
                    }
                }
                MilanEntry::Node(milan) => {
                    if self.load_milan(MilanParent::Khanda(k.id.clone()), milan) {
                        if let Some(node) = self.khandas.get_mut(&k.id) {
                            node.direct_milans.push(DirectMilan::Node(milan.id.clone()));
                        }
                    }
                }
            }
        }
    }

    fn load_valaya(&mut self, khanda_id: &str, v: &Valaya) {
        if self.valayas.contains_key(&v.id) {
            tracing::warn!(id = %v.id, "skipping duplicate valaya");
            return;
        }
        self.valayas.insert(
            v.id.clone(),
            ValayaNode {
                id: v.id.clone(),
                name: v.name.clone(),
                khanda: khanda_id.to_string(),
                milans: Vec::new(),
            },
        );
        push_child(&mut self.khandas, khanda_id, |k| &mut k.valayas, &v.id);
        for milan in &v.milans {
            if self.load_milan(MilanParent::Valaya(v.id.clone()), milan) {
                push_child(&mut self.valayas, &v.id, |v| &mut v.milans, &milan.id);
            }
        }
    }

    /// Returns false when the milan was skipped as a duplicate.
    fn load_milan(&mut self, parent: MilanParent, m: &Milan) -> bool {
        if self.milans.contains_key(&m.id) {
            tracing::warn!(id = %m.id, "skipping duplicate milan");
            return false;
        }
        self.milans.insert(
            m.id.clone(),
            MilanNode {
                id: m.id.clone(),
                name: m.name.clone(),
                parent,
                ghatas: Vec::new(),
            },
        );
        for ghata in &m.ghatas {
            self.load_ghata(&m.id, ghata);
        }
        true
    }

    fn load_ghata(&mut self, milan_id: &str, g: &Ghata) {
        if self.ghatas.contains_key(&g.id) {
            tracing::warn!(id = %g.id, "skipping duplicate ghata");
            return;
        }
        self.ghatas.insert(
            g.id.clone(),
            GhataNode {
                id: g.id.clone(),
                name: g.name.clone(),
                milan: milan_id.to_string(),
            },
        );
        push_child(&mut self.milans, milan_id, |m| &mut m.ghatas, &g.id);
    }

    // ── Lookups ─────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }

    pub fn organization(&self, id: &str) -> Option<&OrgNode> {
        self.organizations.get(id)
    }

    pub fn khanda(&self, id: &str) -> Option<&KhandaNode> {
        self.khandas.get(id)
    }

    pub fn valaya(&self, id: &str) -> Option<&ValayaNode> {
        self.valayas.get(id)
    }

    pub fn milan(&self, id: &str) -> Option<&MilanNode> {
        self.milans.get(id)
    }

    pub fn ghata(&self, id: &str) -> Option<&GhataNode> {
        self.ghatas.get(id)
    }

    /// Organizations in fetched order.
    pub fn organizations(&self) -> impl Iterator<Item = &OrgNode> {
        self.org_order
            .iter()
            .filter_map(move |id| self.organizations.get(id))
    }

    pub fn khandas_of(&self, org_id: &str) -> Vec<&KhandaNode> {
        self.organizations
            .get(org_id)
            .map(|o| o.khandas.iter().filter_map(|id| self.khandas.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn valayas_of(&self, khanda_id: &str) -> Vec<&ValayaNode> {
        self.khandas
            .get(khanda_id)
            .map(|k| k.valayas.iter().filter_map(|id| self.valayas.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn milans_of(&self, valaya_id: &str) -> Vec<&MilanNode> {
        self.valayas
            .get(valaya_id)
            .map(|v| v.milans.iter().filter_map(|id| self.milans.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn ghatas_of(&self, milan_id: &str) -> Vec<&GhataNode> {
        self.milans
            .get(milan_id)
            .map(|m| m.ghatas.iter().filter_map(|id| self.ghatas.get(id)).collect())
            .unwrap_or_default()
    }

    /// Number of nodes at `level`.
    pub fn count(&self, level: Level) -> usize {
        match level {
            Level::Organization => self.organizations.len(),
            Level::Khanda => self.khandas.len(),
            Level::Valaya => self.valayas.len(),
            Level::Milan => self.milans.len(),
            Level::Ghata => self.ghatas.len(),
        }
    }

    fn contains(&self, level: Level, id: &str) -> bool {
        match level {
            Level::Organization => self.organizations.contains_key(id),
            Level::Khanda => self.khandas.contains_key(id),
            Level::Valaya => self.valayas.contains_key(id),
            Level::Milan => self.milans.contains_key(id),
            Level::Ghata => self.ghatas.contains_key(id),
        }
    }

    // ── Edits ───────────────────────────────────────────────────────

    fn check_new(&self, level: Level, id: &str, name: &str) -> Result<(), HierarchyError> {
        if name.trim().is_empty() {
            return Err(HierarchyError::EmptyName { level });
        }
        if self.contains(level, id) {
            return Err(HierarchyError::DuplicateId {
                level,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn require(&self, level: Level, id: &str) -> Result<(), HierarchyError> {
        if self.contains(level, id) {
            Ok(())
        } else {
            Err(HierarchyError::UnknownNode {
                level,
                id: id.to_string(),
            })
        }
    }

    pub fn add_organization(&mut self, id: &str, name: &str) -> Result<(), HierarchyError> {
        self.check_new(Level::Organization, id, name)?;
        self.org_order.push(id.to_string());
        self.organizations.insert(
            id.to_string(),
            OrgNode {
                id: id.to_string(),
                name: name.to_string(),
                khandas: Vec::new(),
                anonymous: false,
            },
        );
        Ok(())
    }

    pub fn add_khanda(
        &mut self,
        org_id: &str,
        id: &str,
        name: &str,
        code: &str,
    ) -> Result<(), HierarchyError> {
        self.require(Level::Organization, org_id)?;
        self.check_new(Level::Khanda, id, name)?;
        self.khandas.insert(
            id.to_string(),
            KhandaNode {
                id: id.to_string(),
                name: name.to_string(),
                code: code.to_string(),
                organization: org_id.to_string(),
                valayas: Vec::new(),
                direct_milans: Vec::new(),
            },
        );
        push_child(&mut self.organizations, org_id, |o| &mut o.khandas, id);
        Ok(())
    }

    pub fn add_valaya(&mut self, khanda_id: &str, id: &str, name: &str) -> Result<(), HierarchyError> {
        self.require(Level::Khanda, khanda_id)?;
        self.check_new(Level::Valaya, id, name)?;
        self.valayas.insert(
            id.to_string(),
            ValayaNode {
                id: id.to_string(),
                name: name.to_string(),
                khanda: khanda_id.to_string(),
                milans: Vec::new(),
            },
        );
        push_child(&mut self.khandas, khanda_id, |k| &mut k.valayas, id);
        Ok(())
    }

    pub fn add_milan(&mut self, valaya_id: &str, id: &str, name: &str) -> Result<(), HierarchyError> {
        self.require(Level::Valaya, valaya_id)?;
        self.check_new(Level::Milan, id, name)?;
        self.milans.insert(
            id.to_string(),
            MilanNode {
                id: id.to_string(),
                name: name.to_string(),
                parent: MilanParent::Valaya(valaya_id.to_string()),
                ghatas: Vec::new(),
            },
        );
        push_child(&mut self.valayas, valaya_id, |v| &mut v.milans, id);
        Ok(())
    }

    /// Attach a milan node straight to a khanda (no valaya).
    pub fn add_direct_milan(
        &mut self,
        khanda_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), HierarchyError> {
        self.require(Level::Khanda, khanda_id)?;
        self.check_new(Level::Milan, id, name)?;
        self.milans.insert(
            id.to_string(),
            MilanNode {
                id: id.to_string(),
                name: name.to_string(),
                parent: MilanParent::Khanda(khanda_id.to_string()),
                ghatas: Vec::new(),
            },
        );
        if let Some(k) = self.khandas.get_mut(khanda_id) {
            k.direct_milans.push(DirectMilan::Node(id.to_string()));
        }
        Ok(())
    }

    pub fn add_ghata(&mut self, milan_id: &str, id: &str, name: &str) -> Result<(), HierarchyError> {
        self.require(Level::Milan, milan_id)?;
        self.check_new(Level::Ghata, id, name)?;
        self.ghatas.insert(
            id.to_string(),
            GhataNode {
                id: id.to_string(),
                name: name.to_string(),
                milan: milan_id.to_string(),
            },
        );
        push_child(&mut self.milans, milan_id, |m| &mut m.ghatas, id);
        Ok(())
    }

    pub fn rename(&mut self, level: Level, id: &str, name: &str) -> Result<(), HierarchyError> {
        if name.trim().is_empty() {
            return Err(HierarchyError::EmptyName { level });
        }
        let slot = match level {
            Level::Organization => self.organizations.get_mut(id).map(|n| &mut n.name),
            Level::Khanda => self.khandas.get_mut(id).map(|n| &mut n.name),
            Level::Valaya => self.valayas.get_mut(id).map(|n| &mut n.name),
            Level::Milan => self.milans.get_mut(id).map(|n| &mut n.name),
            Level::Ghata => self.ghatas.get_mut(id).map(|n| &mut n.name),
        };
        match slot {
            Some(n) => {
                *n = name.to_string();
                Ok(())
            }
            None => Err(HierarchyError::UnknownNode {
                level,
                id: id.to_string(),
            }),
        }
    }

    /// Remove a node and everything below it.
    pub fn remove(&mut self, level: Level, id: &str) -> Result<(), HierarchyError> {
        self.require(level, id)?;
        match level {
            Level::Organization => {
                self.remove_organization(id);
            }
            Level::Khanda => {
                if let Some(k) = self.remove_khanda(id) {
                    detach(&mut self.organizations, &k.organization, |o| &mut o.khandas, id);
                }
            }
            Level::Valaya => {
                if let Some(v) = self.remove_valaya(id) {
                    detach(&mut self.khandas, &v.khanda, |k| &mut k.valayas, id);
                }
            }
            Level::Milan => {
                if let Some(m) = self.remove_milan(id) {
                    match &m.parent {
                        MilanParent::Valaya(v) => {
                            detach(&mut self.valayas, v, |v| &mut v.milans, id);
                        }
                        MilanParent::Khanda(k) => {
                            if let Some(k) = self.khandas.get_mut(k) {
                                k.direct_milans
                                    .retain(|d| !matches!(d, DirectMilan::Node(n) if n == id));
                            }
                        }
                    }
                }
            }
            Level::Ghata => {
                if let Some(g) = self.ghatas.remove(id) {
                    detach(&mut self.milans, &g.milan, |m| &mut m.ghatas, id);
                }
            }
        }
        Ok(())
    }

    fn remove_organization(&mut self, id: &str) {
        if let Some(org) = self.organizations.remove(id) {
            for k in &org.khandas {
                self.remove_khanda(k);
            }
        }
        self.org_order.retain(|o| o != id);
    }

    fn remove_khanda(&mut self, id: &str) -> Option<KhandaNode> {
        let k = self.khandas.remove(id)?;
        for v in &k.valayas {
            self.remove_valaya(v);
        }
        for d in &k.direct_milans {
            if let DirectMilan::Node(m) = d {
                self.remove_milan(m);
            }
        }
        Some(k)
    }

    fn remove_valaya(&mut self, id: &str) -> Option<ValayaNode> {
        let v = self.valayas.remove(id)?;
        for m in &v.milans {
            self.remove_milan(m);
        }
        Some(v)
    }

    fn remove_milan(&mut self, id: &str) -> Option<MilanNode> {
        let m = self.milans.remove(id)?;
        for g in &m.ghatas {
            self.ghatas.remove(g);
        }
        Some(m)
    }

    // ── Serialization boundary ──────────────────────────────────────

    /// Rebuild the nested organization shape.
    pub fn to_organizations(&self) -> Vec<Organization> {
        self.organizations()
            .map(|o| Organization {
                id: if o.anonymous { String::new() } else { o.id.clone() },
                name: o.name.clone(),
                khandas: self
                    .khandas_of(&o.id)
                    .into_iter()
                    .map(|k| self.nested_khanda(k))
                    .collect(),
            })
            .collect()
    }

    fn nested_khanda(&self, k: &KhandaNode) -> Khanda {
        Khanda {
            id: k.id.clone(),
            name: k.name.clone(),
            code: k.code.clone(),
            valayas: self
                .valayas_of(&k.id)
                .into_iter()
                .map(|v| Valaya {
                    id: v.id.clone(),
                    name: v.name.clone(),
                    milans: self
                        .milans_of(&v.id)
                        .into_iter()
                        .map(|m| self.nested_milan(m))
                        .collect(),
                })
                .collect(),
            milans: k
                .direct_milans
                .iter()
                .filter_map(|d| match d {
                    DirectMilan::Name(n) => Some(MilanEntry::Name(n.clone())),
                    DirectMilan::Node(id) => self
                        .milans
                        .get(id)
                        .map(|m| MilanEntry::Node(self.nested_milan(m))),
                })
                .collect(),
        }
    }

    fn nested_milan(&self, m: &MilanNode) -> Milan {
        Milan {
            id: m.id.clone(),
            name: m.name.clone(),
            ghatas: self
                .ghatas_of(&m.id)
                .into_iter()
                .map(|g| Ghata {
                    id: g.id.clone(),
                    name: g.name.clone(),
                })
                .collect(),
        }
    }
}

fn push_child<T>(
    map: &mut HashMap<String, T>,
    parent: &str,
    children: impl FnOnce(&mut T) -> &mut Vec<String>,
    child: &str,
) {
    if let Some(node) = map.get_mut(parent) {
        children(node).push(child.to_string());
    }
}

fn detach<T>(
    map: &mut HashMap<String, T>,
    parent: &str,
    children: impl FnOnce(&mut T) -> &mut Vec<String>,
    child: &str,
) {
    if let Some(node) = map.get_mut(parent) {
        children(node).retain(|c| c != child);
    }
}
