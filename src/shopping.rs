//! Client-local shopping list.
//!
//! The list is the single source of truth for which ingredients are
//! "checked" on a recipe: the checked view of a recipe is always computed
//! from the list, never kept alongside it. Every mutation writes the full
//! list back to durable storage before returning.
//!
//! Storage keys:
//! - `shoppingList`: JSON array of [`ShoppingListItem`]
//! - `checkedIngredients/<recipe-id>`: JSON array of checked names, a
//!   write-through mirror for other readers of the store. Never read here.

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Ingredient, ShoppingListItem};
use crate::storage::{KeyValueStore, StorageError};

pub const LIST_KEY: &str = "shoppingList";
pub const CHECKED_KEY_PREFIX: &str = "checkedIngredients/";

fn checked_key(recipe_id: Uuid) -> String {
    format!("{}{}", CHECKED_KEY_PREFIX, recipe_id)
}

/// Outcome of [`ShoppingList::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Items sharing an ingredient name, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingGroup<'a> {
    pub name: &'a str,
    pub items: Vec<&'a ShoppingListItem>,
}

/// The persisted shopping list.
#[derive(Debug)]
pub struct ShoppingList<S: KeyValueStore> {
    store: S,
    items: Vec<ShoppingListItem>,
    persist_error: Option<StorageError>,
}

impl<S: KeyValueStore> ShoppingList<S> {
    /// Hydrates the list from `store`. Missing or unreadable data yields an
    /// empty list.
    pub fn load(store: S) -> Self {
        let items = match store.get(LIST_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<ShoppingListItem>>(&raw) {
                Ok(items) => dedup(items),
                Err(e) => {
                    tracing::warn!("Discarding unreadable shopping list: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        tracing::debug!("Loaded shopping list with {} item(s)", items.len());

        Self {
            store,
            items,
            persist_error: None,
        }
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str, recipe_id: Uuid) -> bool {
        self.items.iter().any(|i| i.matches(name, recipe_id))
    }

    /// Appends `item` unless an entry with the same (name, recipe) exists.
    ///
    /// Returns true if the item was inserted.
    pub fn add(&mut self, item: ShoppingListItem) -> bool {
        if self.items.iter().any(|i| i.same_entry(&item)) {
            return false;
        }

        let recipe_id = item.recipe_id;
        self.items.push(item);
        self.persist(recipe_id);
        true
    }

    /// Removes the entry matching `item`'s (name, recipe).
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, item: &ShoppingListItem) -> bool {
        self.remove_entry(&item.name, item.recipe_id)
    }

    /// Removes the entry for (`name`, `recipe_id`), if any.
    pub fn remove_entry(&mut self, name: &str, recipe_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(name, recipe_id));
        if self.items.len() == before {
            return false;
        }

        self.persist(recipe_id);
        true
    }

    /// Flips membership of `ingredient` for the given recipe.
    pub fn toggle(
        &mut self,
        ingredient: &Ingredient,
        recipe_id: Uuid,
        recipe_name: &str,
    ) -> Toggle {
        if self.remove_entry(&ingredient.name, recipe_id) {
            Toggle::Removed
        } else {
            self.add(ShoppingListItem::from_ingredient(
                ingredient,
                recipe_id,
                recipe_name,
            ));
            Toggle::Added
        }
    }

    /// Empties the list and erases every persisted checked view.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist_error = None;

        let mut keys = vec![LIST_KEY.to_string()];
        keys.extend(
            self.store
                .keys()
                .into_iter()
                .filter(|k| k.starts_with(CHECKED_KEY_PREFIX)),
        );

        for key in keys {
            if let Err(e) = self.store.remove(&key) {
                tracing::warn!("Failed to erase {} from storage: {}", key, e);
                self.persist_error = Some(e);
            }
        }
    }

    /// Names checked for `recipe_id`, in list order.
    ///
    /// Names are unique per recipe since (name, recipe) is the entry key.
    pub fn checked_names_for(&self, recipe_id: Uuid) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.recipe_id == recipe_id)
            .map(|i| i.name.as_str())
            .collect()
    }

    pub fn is_checked(&self, name: &str, recipe_id: Uuid) -> bool {
        self.contains(name, recipe_id)
    }

    /// Groups items by ingredient name.
    ///
    /// Groups appear in the order their name was first inserted; items
    /// inside a group keep insertion order.
    pub fn grouped(&self) -> Vec<ShoppingGroup<'_>> {
        let mut groups: Vec<ShoppingGroup<'_>> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|g| g.name == item.name) {
                Some(group) => group.items.push(item),
                None => groups.push(ShoppingGroup {
                    name: &item.name,
                    items: vec![item],
                }),
            }
        }
        groups
    }

    /// The last storage failure, if the most recent write did not stick.
    ///
    /// In-memory state stays authoritative either way.
    pub fn persist_error(&self) -> Option<&StorageError> {
        self.persist_error.as_ref()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self, recipe_id: Uuid) {
        self.persist_error = None;

        if let Err(e) = self.write_list() {
            tracing::warn!("Failed to persist shopping list: {}", e);
            self.persist_error = Some(e);
            return;
        }

        if let Err(e) = self.write_checked(recipe_id) {
            tracing::warn!(
                "Failed to persist checked ingredients for {}: {}",
                recipe_id,
                e
            );
            self.persist_error = Some(e);
        }
    }

    fn write_list(&mut self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.items)?;
        self.store.set(LIST_KEY, &raw)
    }

    fn write_checked(&mut self, recipe_id: Uuid) -> Result<(), StorageError> {
        let key = checked_key(recipe_id);
        let names = self.checked_names_for(recipe_id);
        if names.is_empty() {
            return self.store.remove(&key);
        }
        let raw = serde_json::to_string(&names)?;
        self.store.set(&key, &raw)
    }
}

/// Drops repeated (name, recipe) entries, keeping the first.
fn dedup(items: Vec<ShoppingListItem>) -> Vec<ShoppingListItem> {
    let mut seen: HashSet<(String, Uuid)> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|i| seen.insert((i.name.clone(), i.recipe_id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn flour(recipe_id: Uuid) -> ShoppingListItem {
        ShoppingListItem::new("Flour", "2 cups", recipe_id, "Bread")
    }

    fn names(list: &ShoppingList<impl KeyValueStore>, recipe_id: Uuid) -> HashSet<String> {
        list.checked_names_for(recipe_id)
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(
                PathBuf::from("/readonly"),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.set(key, "")
        }

        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());

        assert!(list.add(flour(r1)));
        assert!(!list.add(flour(r1)));

        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_same_name_different_recipes_are_distinct() {
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut list = ShoppingList::load(MemoryStore::new());

        list.add(ShoppingListItem::new("egg", "1", r1, "Omelette"));
        list.add(ShoppingListItem::new("egg", "2", r2, "Cake"));

        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());

        for name in ["Salt", "Butter", "Apples"] {
            list.add(ShoppingListItem::new(name, "1", r1, "Pie"));
        }

        let order: Vec<&str> = list.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["Salt", "Butter", "Apples"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());
        list.add(flour(r1));

        assert!(!list.remove(&flour(Uuid::new_v4())));
        assert!(list.remove(&flour(r1)));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_list() {
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut list = ShoppingList::load(MemoryStore::new());
        list.add(ShoppingListItem::new("Milk", "1 l", r1, "Bread"));
        list.add(ShoppingListItem::new("Sugar", "50 g", r2, "Cake"));
        let before = list.items().to_vec();

        let yeast = Ingredient::new("7 g", "Yeast");
        assert_eq!(list.toggle(&yeast, r1, "Bread"), Toggle::Added);
        assert!(list.is_checked("Yeast", r1));
        assert_eq!(list.toggle(&yeast, r1, "Bread"), Toggle::Removed);

        assert_eq!(list.items(), before.as_slice());
    }

    #[test]
    fn test_toggle_carries_recipe_details() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());

        list.toggle(&Ingredient::new("3", "Eggs"), r1, "Omelette");

        let item = &list.items()[0];
        assert_eq!(item.amount, "3");
        assert_eq!(item.recipe_id, r1);
        assert_eq!(item.recipe_name, "Omelette");
    }

    #[test]
    fn test_checked_names_follow_every_mutation() {
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut list = ShoppingList::load(MemoryStore::new());

        list.add(flour(r1));
        list.add(ShoppingListItem::new("Eggs", "2", r1, "Bread"));
        list.add(ShoppingListItem::new("Flour", "1 cup", r2, "Cake"));
        assert_eq!(names(&list, r1), HashSet::from([String::from("Flour"), String::from("Eggs")]));
        assert_eq!(names(&list, r2), HashSet::from([String::from("Flour")]));

        // Unrelated removal leaves r1 untouched
        list.remove_entry("Flour", r2);
        assert!(names(&list, r2).is_empty());
        assert_eq!(names(&list, r1).len(), 2);

        list.clear();
        assert!(names(&list, r1).is_empty());
        assert!(names(&list, r2).is_empty());
    }

    #[test]
    fn test_grouping_by_first_insertion() {
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut list = ShoppingList::load(MemoryStore::new());
        list.add(ShoppingListItem::new("Flour", "2 cups", r1, "Bread"));
        list.add(ShoppingListItem::new("Eggs", "2", r1, "Bread"));
        list.add(ShoppingListItem::new("Flour", "1 cup", r2, "Cake"));

        let groups = list.grouped();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Flour");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[0].items[0].recipe_name, "Bread");
        assert_eq!(groups[0].items[1].recipe_name, "Cake");
        assert_eq!(groups[1].name, "Eggs");
    }

    #[test]
    fn test_persists_and_hydrates() {
        let temp_dir = TempDir::new().unwrap();
        let r1 = Uuid::new_v4();

        let mut list = ShoppingList::load(FileStore::open(temp_dir.path()));
        list.add(flour(r1));
        list.add(ShoppingListItem::new("Eggs", "2", r1, "Bread"));
        drop(list);

        let reloaded = ShoppingList::load(FileStore::open(temp_dir.path()));
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.items()[0], flour(r1));
    }

    #[test]
    fn test_writes_checked_mirror_and_clear_erases_it() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());

        list.add(flour(r1));
        let store = list.into_store();
        assert_eq!(
            store.get(&checked_key(r1)).as_deref(),
            Some(r#"["Flour"]"#)
        );

        let mut list = ShoppingList::load(store);
        list.clear();
        let store = list.into_store();
        assert!(store.get(LIST_KEY).is_none());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_corrupt_storage_hydrates_empty() {
        let mut store = MemoryStore::new();
        store.set(LIST_KEY, "[{\"broken\":").unwrap();

        let list = ShoppingList::load(store);
        assert!(list.is_empty());
    }

    #[test]
    fn test_hydrate_drops_duplicate_entries() {
        let r1 = Uuid::new_v4();
        let mut store = MemoryStore::new();
        let raw = serde_json::to_string(&vec![flour(r1), flour(r1)]).unwrap();
        store.set(LIST_KEY, &raw).unwrap();

        let list = ShoppingList::load(store);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(ReadOnlyStore);

        assert!(list.add(flour(r1)));

        assert_eq!(list.len(), 1);
        assert!(list.persist_error().is_some());
        assert_eq!(list.checked_names_for(r1), vec!["Flour"]);
    }

    #[test]
    fn test_flour_scenario() {
        let r1 = Uuid::new_v4();
        let mut list = ShoppingList::load(MemoryStore::new());

        list.add(ShoppingListItem::new("Flour", "2 cups", r1, "Bread"));
        list.add(ShoppingListItem::new("Flour", "2 cups", r1, "Bread"));

        assert_eq!(list.len(), 1);
    }
}
