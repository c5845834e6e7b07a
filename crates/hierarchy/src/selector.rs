//! Cascading khanda → valaya → milan → ghata selection.
//!
//! Picking a level clears every level below it. Available options for the
//! next level are always read from the live [`OrgTree`]; a parent the tree
//! no longer knows yields no options rather than an error.

use serde::Serialize;

use sangha_interchange::Level;

use crate::index::Selection;
use crate::tree::{DirectMilan, OrgTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorState {
    NoneSelected,
    KhandaSelected,
    ValayaSelected,
    MilanSelected,
}

/// One option of a level dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    fn new(value: &str, label: &str) -> Self {
        Choice {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchySelector {
    selection: Selection,
}

impl HierarchySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a stored selection. No cascade is applied.
    pub fn from_selection(selection: Selection) -> Self {
        HierarchySelector { selection }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn into_selection(self) -> Selection {
        self.selection
    }

    pub fn state(&self) -> SelectorState {
        let s = &self.selection;
        match (&s.khanda, &s.valaya, &s.milan) {
            (None, _, _) => SelectorState::NoneSelected,
            (Some(_), _, Some(_)) => SelectorState::MilanSelected,
            (Some(_), Some(_), None) => SelectorState::ValayaSelected,
            (Some(_), None, None) => SelectorState::KhandaSelected,
        }
    }

    /// An empty `id` clears the khanda.
    pub fn select_khanda(&mut self, id: &str) {
        self.selection.set(Level::Khanda, Some(id));
        self.selection.valaya = None;
        self.selection.milan = None;
        self.selection.ghata = None;
    }

    pub fn select_valaya(&mut self, id: &str) {
        self.selection.set(Level::Valaya, Some(id));
        self.selection.milan = None;
        self.selection.ghata = None;
    }

    /// `value` is a milan id, or a milan name when the khanda has no valayas.
    pub fn select_milan(&mut self, value: &str) {
        self.selection.set(Level::Milan, Some(value));
        self.selection.ghata = None;
    }

    pub fn select_ghata(&mut self, id: &str) {
        self.selection.set(Level::Ghata, Some(id));
    }

    pub fn select(&mut self, level: Level, value: &str) {
        match level {
            Level::Organization => {}
            Level::Khanda => self.select_khanda(value),
            Level::Valaya => self.select_valaya(value),
            Level::Milan => self.select_milan(value),
            Level::Ghata => self.select_ghata(value),
        }
    }

    /// Every khanda of every organization, in tree order.
    pub fn available_khandas(&self, tree: &OrgTree) -> Vec<Choice> {
        tree.organizations()
            .flat_map(|o| tree.khandas_of(&o.id))
            .map(|k| Choice::new(&k.id, &k.name))
            .collect()
    }

    pub fn available_valayas(&self, tree: &OrgTree) -> Vec<Choice> {
        let Some(khanda) = self.selection.khanda.as_deref() else {
            return Vec::new();
        };
        tree.valayas_of(khanda)
            .into_iter()
            .map(|v| Choice::new(&v.id, &v.name))
            .collect()
    }

    /// Milans of the selected valaya. A khanda with no valayas lists its own
    /// milans instead, valued by name.
    pub fn available_milans(&self, tree: &OrgTree) -> Vec<Choice> {
        let Some(khanda_id) = self.selection.khanda.as_deref() else {
            return Vec::new();
        };
        let Some(khanda) = tree.khanda(khanda_id) else {
            return Vec::new();
        };
        if khanda.valayas.is_empty() {
            tracing::debug!(khanda = %khanda_id, "khanda has no valayas, listing its milans");
            return khanda
                .direct_milans
                .iter()
                .filter_map(|d| match d {
                    DirectMilan::Name(name) => Some(Choice::new(name, name)),
                    DirectMilan::Node(id) => tree.milan(id).map(|m| Choice::new(&m.name, &m.name)),
                })
                .collect();
        }
        let Some(valaya) = self.selection.valaya.as_deref() else {
            return Vec::new();
        };
        tree.milans_of(valaya)
            .into_iter()
            .map(|m| Choice::new(&m.id, &m.name))
            .collect()
    }

    pub fn available_ghatas(&self, tree: &OrgTree) -> Vec<Choice> {
        let Some(milan) = self.selection.milan.as_deref() else {
            return Vec::new();
        };
        let milan_id = match tree.milan(milan) {
            Some(m) => Some(m.id.as_str()),
            None => self.fallback_milan_id(tree, milan),
        };
        milan_id
            .map(|id| {
                tree.ghatas_of(id)
                    .into_iter()
                    .map(|g| Choice::new(&g.id, &g.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Options for `level` under the current selection.
    pub fn available(&self, level: Level, tree: &OrgTree) -> Vec<Choice> {
        match level {
            Level::Organization => tree
                .organizations()
                .map(|o| Choice::new(&o.id, &o.name))
                .collect(),
            Level::Khanda => self.available_khandas(tree),
            Level::Valaya => self.available_valayas(tree),
            Level::Milan => self.available_milans(tree),
            Level::Ghata => self.available_ghatas(tree),
        }
    }

    /// A milan picked by name under a valaya-less khanda.
    fn fallback_milan_id<'t>(&self, tree: &'t OrgTree, name: &str) -> Option<&'t str> {
        let khanda = tree.khanda(self.selection.khanda.as_deref()?)?;
        if !khanda.valayas.is_empty() {
            return None;
        }
        khanda.direct_milans.iter().find_map(|d| match d {
            DirectMilan::Node(id) => tree
                .milan(id)
                .filter(|m| m.name == name)
                .map(|m| m.id.as_str()),
            DirectMilan::Name(_) => None,
        })
    }
}
