//! The in-memory entity tree: children, their checklists, and quantities.
//!
//! The roster is the single source of truth for rendering. The remote store
//! is only a durability backstop; it never feeds back into the roster except
//! through an explicit rollback after a failed write.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{ChildId, ItemTypeId, MutationKey, Quantity};

/// The roster shared between the engine's components.
pub(crate) type SharedRoster = Arc<Mutex<Roster>>;

/// A named item on a child's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    /// Unique identifier for this item type
    pub id: ItemTypeId,
    /// Display name
    pub name: String,
    /// Whether this type was seeded by default
    pub is_default: bool,
    /// Position within the owning child's checklist
    pub sort_order: u32,
}

impl ItemType {
    /// Create a new item type.
    pub fn new(
        id: impl Into<ItemTypeId>,
        name: impl Into<String>,
        is_default: bool,
        sort_order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default,
            sort_order,
        }
    }
}

/// A quantity record joining a child and an item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildItem {
    /// Unique identifier for this record
    pub id: String,
    /// Current quantity, always non-negative
    pub quantity: Quantity,
    /// The item type this quantity belongs to
    pub item_type_id: ItemTypeId,
}

impl ChildItem {
    /// Create a new quantity record.
    pub fn new(id: impl Into<String>, quantity: Quantity, item_type_id: impl Into<ItemTypeId>) -> Self {
        Self {
            id: id.into(),
            quantity,
            item_type_id: item_type_id.into(),
        }
    }
}

/// A child and their packing checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    /// Unique identifier for this child
    pub id: ChildId,
    /// Display name
    pub name: String,
    /// Position within the top-level list
    pub sort_order: u32,
    /// Ordered checklist of item types
    pub item_types: Vec<ItemType>,
    /// Quantity records, at most one per item type
    pub items: Vec<ChildItem>,
}

impl Child {
    /// Create a child with an empty checklist.
    pub fn new(id: impl Into<ChildId>, name: impl Into<String>, sort_order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sort_order,
            item_types: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Append an item type to the checklist (builder style).
    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.item_types.push(item_type);
        self
    }

    /// Append a quantity record (builder style).
    pub fn with_item(mut self, item: ChildItem) -> Self {
        self.items.push(item);
        self
    }
}

/// The full entity tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    children: Vec<Child>,
}

impl Roster {
    /// Create a roster from an initial list of children.
    pub fn new(children: Vec<Child>) -> Self {
        Self { children }
    }

    /// All children, in display order.
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Look up a child by id.
    pub fn child(&self, id: &str) -> Option<&Child> {
        self.children.iter().find(|child| child.id == id)
    }

    fn child_mut(&mut self, id: &str) -> Option<&mut Child> {
        self.children.iter_mut().find(|child| child.id == id)
    }

    /// Whether the entity a key refers to still exists.
    pub fn contains_item(&self, key: &MutationKey) -> bool {
        self.child(&key.child_id)
            .is_some_and(|child| child.item_types.iter().any(|it| it.id == key.item_type_id))
    }

    /// The displayed quantity for a key. Absent records read as zero.
    pub fn quantity(&self, key: &MutationKey) -> Quantity {
        self.child(&key.child_id)
            .and_then(|child| {
                child
                    .items
                    .iter()
                    .find(|item| item.item_type_id == key.item_type_id)
            })
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    /// Upsert the quantity record for a key.
    ///
    /// A record is created on first edit; it carries a synthesized `temp-`
    /// id until the remote upsert assigns a durable one. Returns false when
    /// the child or item type does not exist.
    pub fn set_quantity(&mut self, key: &MutationKey, quantity: Quantity) -> bool {
        let Some(child) = self.child_mut(&key.child_id) else {
            return false;
        };
        if !child.item_types.iter().any(|it| it.id == key.item_type_id) {
            return false;
        }

        match child
            .items
            .iter_mut()
            .find(|item| item.item_type_id == key.item_type_id)
        {
            Some(item) => item.quantity = quantity,
            None => child.items.push(ChildItem::new(
                format!("temp-{key}"),
                quantity,
                key.item_type_id.clone(),
            )),
        }
        true
    }

    /// Move a child within the top-level list.
    ///
    /// Returns the new id order, or `None` when nothing moved (equal
    /// indices or `from` out of range).
    pub fn move_child(&mut self, from: usize, to: usize) -> Option<Vec<ChildId>> {
        if !move_element(&mut self.children, from, to) {
            return None;
        }
        for (position, child) in self.children.iter_mut().enumerate() {
            child.sort_order = position as u32;
        }
        Some(self.child_order())
    }

    /// Move an item type within one child's checklist.
    ///
    /// Returns the new id order, or `None` when nothing moved or the child
    /// is unknown.
    pub fn move_item_type(&mut self, child_id: &str, from: usize, to: usize) -> Option<Vec<ItemTypeId>> {
        let child = self.child_mut(child_id)?;
        if !move_element(&mut child.item_types, from, to) {
            return None;
        }
        for (position, item_type) in child.item_types.iter_mut().enumerate() {
            item_type.sort_order = position as u32;
        }
        Some(child.item_types.iter().map(|it| it.id.clone()).collect())
    }

    /// Ids of all children, in display order.
    pub fn child_order(&self) -> Vec<ChildId> {
        self.children.iter().map(|child| child.id.clone()).collect()
    }

    /// Ids of one child's item types, in display order.
    pub fn item_order(&self, child_id: &str) -> Option<Vec<ItemTypeId>> {
        self.child(child_id)
            .map(|child| child.item_types.iter().map(|it| it.id.clone()).collect())
    }

    /// Append a child to the end of the list.
    pub fn add_child(&mut self, child: Child) {
        self.children.push(child);
    }

    /// Remove a child and everything it owns. Returns false if unknown.
    pub fn remove_child(&mut self, child_id: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|child| child.id != child_id);
        self.children.len() != before
    }

    /// Append an item type to a child's checklist. Returns false if the
    /// child is unknown.
    pub fn add_item_type(&mut self, child_id: &str, item_type: ItemType) -> bool {
        match self.child_mut(child_id) {
            Some(child) => {
                child.item_types.push(item_type);
                true
            }
            None => false,
        }
    }

    /// Remove an item type and its quantity record. Returns false if
    /// nothing was removed.
    pub fn remove_item_type(&mut self, child_id: &str, item_type_id: &str) -> bool {
        let Some(child) = self.child_mut(child_id) else {
            return false;
        };
        let before = child.item_types.len();
        child.item_types.retain(|it| it.id != item_type_id);
        child.items.retain(|item| item.item_type_id != item_type_id);
        child.item_types.len() != before
    }

    /// Rename a child. Returns false if unknown.
    pub fn rename_child(&mut self, child_id: &str, name: &str) -> bool {
        match self.child_mut(child_id) {
            Some(child) => {
                child.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Rename an item type. Returns false if unknown.
    pub fn rename_item_type(&mut self, child_id: &str, item_type_id: &str, name: &str) -> bool {
        let Some(child) = self.child_mut(child_id) else {
            return false;
        };
        match child.item_types.iter_mut().find(|it| it.id == item_type_id) {
            Some(item_type) => {
                item_type.name = name.to_string();
                true
            }
            None => false,
        }
    }
}

/// Move one element of a list from `from` to `to`, preserving the relative
/// order of all other elements. `to` is clamped into range. Returns whether
/// the list changed.
pub(crate) fn move_element<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let to = to.min(items.len() - 1);
    if from == to {
        return false;
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_roster() -> Roster {
        Roster::new(vec![
            Child::new("child-1", "Mio", 0)
                .with_item_type(ItemType::new("towel", "タオル", true, 0))
                .with_item_type(ItemType::new("cup", "コップ", true, 1))
                .with_item(ChildItem::new("ci-1", 2, "towel")),
            Child::new("child-2", "Ren", 1)
                .with_item_type(ItemType::new("towel", "タオル", true, 0)),
        ])
    }

    #[test]
    fn quantity_defaults_to_zero() {
        let roster = test_roster();
        assert_eq!(roster.quantity(&MutationKey::new("child-1", "cup")), 0);
        assert_eq!(roster.quantity(&MutationKey::new("child-1", "towel")), 2);
        assert_eq!(roster.quantity(&MutationKey::new("nobody", "towel")), 0);
    }

    #[test]
    fn set_quantity_updates_existing_record() {
        let mut roster = test_roster();
        let key = MutationKey::new("child-1", "towel");
        assert!(roster.set_quantity(&key, 5));
        assert_eq!(roster.quantity(&key), 5);
        // Still one record for the pair
        assert_eq!(roster.child("child-1").unwrap().items.len(), 1);
    }

    #[test]
    fn set_quantity_creates_record_with_temp_id() {
        let mut roster = test_roster();
        let key = MutationKey::new("child-1", "cup");
        assert!(roster.set_quantity(&key, 3));
        assert_eq!(roster.quantity(&key), 3);

        let child = roster.child("child-1").unwrap();
        let item = child.items.iter().find(|i| i.item_type_id == "cup").unwrap();
        assert!(item.id.starts_with("temp-"));
    }

    #[test]
    fn set_quantity_unknown_entity_is_rejected() {
        let mut roster = test_roster();
        assert!(!roster.set_quantity(&MutationKey::new("nobody", "towel"), 1));
        assert!(!roster.set_quantity(&MutationKey::new("child-1", "hat"), 1));
    }

    #[test]
    fn contains_item_tracks_item_types_not_records() {
        let roster = test_roster();
        // cup has no quantity record yet but the item type exists
        assert!(roster.contains_item(&MutationKey::new("child-1", "cup")));
        assert!(!roster.contains_item(&MutationKey::new("child-2", "cup")));
    }

    #[test]
    fn move_element_single_move_semantics() {
        let mut items = vec!["A", "B", "C", "D"];
        assert!(move_element(&mut items, 0, 2));
        assert_eq!(items, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn move_element_noop_on_equal_indices() {
        let mut items = vec!["A", "B", "C", "D"];
        assert!(!move_element(&mut items, 1, 1));
        assert_eq!(items, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn move_element_rejects_out_of_range_source() {
        let mut items = vec!["A", "B"];
        assert!(!move_element(&mut items, 7, 0));
        assert_eq!(items, vec!["A", "B"]);
    }

    #[test]
    fn move_element_clamps_destination() {
        let mut items = vec!["A", "B", "C"];
        assert!(move_element(&mut items, 0, 99));
        assert_eq!(items, vec!["B", "C", "A"]);
    }

    #[test]
    fn move_child_renumbers_sort_order() {
        let mut roster = test_roster();
        let order = roster.move_child(0, 1).unwrap();
        assert_eq!(order, vec!["child-2".to_string(), "child-1".to_string()]);
        assert_eq!(roster.children()[0].sort_order, 0);
        assert_eq!(roster.children()[1].sort_order, 1);
        assert_eq!(roster.children()[1].id, "child-1");
    }

    #[test]
    fn move_item_type_within_child() {
        let mut roster = test_roster();
        let order = roster.move_item_type("child-1", 1, 0).unwrap();
        assert_eq!(order, vec!["cup".to_string(), "towel".to_string()]);

        let child = roster.child("child-1").unwrap();
        assert_eq!(child.item_types[0].sort_order, 0);
        assert_eq!(child.item_types[1].sort_order, 1);
    }

    #[test]
    fn move_item_type_unknown_child() {
        let mut roster = test_roster();
        assert!(roster.move_item_type("nobody", 0, 1).is_none());
    }

    #[test]
    fn remove_item_type_drops_quantity_record() {
        let mut roster = test_roster();
        assert!(roster.remove_item_type("child-1", "towel"));
        let child = roster.child("child-1").unwrap();
        assert!(child.item_types.iter().all(|it| it.id != "towel"));
        assert!(child.items.is_empty());
    }

    #[test]
    fn remove_child_removes_everything() {
        let mut roster = test_roster();
        assert!(roster.remove_child("child-1"));
        assert!(roster.child("child-1").is_none());
        assert!(!roster.remove_child("child-1"));
    }

    #[test]
    fn rename_operations() {
        let mut roster = test_roster();
        assert!(roster.rename_child("child-1", "Mio-chan"));
        assert_eq!(roster.child("child-1").unwrap().name, "Mio-chan");

        assert!(roster.rename_item_type("child-1", "towel", "バスタオル"));
        assert!(!roster.rename_item_type("child-1", "hat", "帽子"));
    }

    #[test]
    fn serialization_roundtrip() {
        let roster = test_roster();
        let json = serde_json::to_string(&roster).unwrap();
        assert!(json.contains("itemTypes")); // camelCase
        assert!(json.contains("sortOrder"));
        let parsed: Roster = serde_json::from_str(&json).unwrap();
        assert_eq!(roster, parsed);
    }
}
