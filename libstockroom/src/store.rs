//! Application state store
//!
//! Single source of truth for session and inventory data. All mutation goes
//! through the closed [`Transition`] vocabulary applied by a synchronous,
//! I/O-free reducer; actions and views never touch fields directly.

use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::types::{Category, CategoryPatch, Part, PartPatch, User};

/// In-memory application state. Created empty at session start and reset to
/// the empty form when the authenticated session ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryState {
    pub user: Option<User>,
    pub parts: Vec<Part>,
    pub categories: Vec<Category>,
    pub loading: bool,
    pub parts_loading: bool,
    pub categories_loading: bool,
    /// Last-error-wins slot; a new error overwrites the prior one.
    pub error: Option<String>,
}

/// The closed set of state transitions. Each is total and synchronous.
#[derive(Debug, Clone)]
pub enum Transition {
    SetLoading(bool),
    SetPartsLoading(bool),
    SetCategoriesLoading(bool),
    SetUser(Option<User>),
    SetParts(Vec<Part>),
    SetCategories(Vec<Category>),
    AddPart(Part),
    AddCategory(Category),
    /// Merges the given fields and stamps `updated_at` to local "now".
    UpdatePart { id: String, patch: PartPatch },
    /// Merges the given fields. No timestamp stamp.
    UpdateCategory { id: String, patch: CategoryPatch },
    RemovePart(String),
    RemoveCategory(String),
    SetError(Option<String>),
    ClearError,
}

impl InventoryState {
    /// Apply one transition. Pure state-to-state; never performs I/O.
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::SetLoading(value) => self.loading = value,
            Transition::SetPartsLoading(value) => self.parts_loading = value,
            Transition::SetCategoriesLoading(value) => self.categories_loading = value,
            Transition::SetUser(user) => self.user = user,
            Transition::SetParts(parts) => self.parts = parts,
            Transition::SetCategories(categories) => self.categories = categories,
            Transition::AddPart(part) => self.parts.push(part),
            Transition::AddCategory(category) => self.categories.push(category),
            Transition::UpdatePart { id, patch } => {
                if let Some(part) = self.parts.iter_mut().find(|p| p.id == id) {
                    patch.apply(part);
                    part.updated_at = Utc::now();
                }
            }
            Transition::UpdateCategory { id, patch } => {
                if let Some(category) = self.categories.iter_mut().find(|c| c.id == id) {
                    patch.apply(category);
                }
            }
            Transition::RemovePart(id) => self.parts.retain(|p| p.id != id),
            Transition::RemoveCategory(id) => self.categories.retain(|c| c.id != id),
            Transition::SetError(error) => self.error = error,
            Transition::ClearError => self.error = None,
        }
    }
}

/// Shared handle to the state. Cheap to clone; all clones observe the same
/// state. Mutation is serialized through [`Store::dispatch`].
#[derive(Clone, Default)]
pub struct Store {
    state: Arc<RwLock<InventoryState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition to the shared state.
    pub fn dispatch(&self, transition: Transition) {
        self.state.write().unwrap().apply(transition);
    }

    /// A cloned snapshot of the current state.
    pub fn snapshot(&self) -> InventoryState {
        self.state.read().unwrap().clone()
    }

    /// Current session subject, if any.
    pub fn user(&self) -> Option<User> {
        self.state.read().unwrap().user.clone()
    }

    /// Current part list.
    pub fn parts(&self) -> Vec<Part> {
        self.state.read().unwrap().parts.clone()
    }

    /// Current category list.
    pub fn categories(&self) -> Vec<Category> {
        self.state.read().unwrap().categories.clone()
    }

    /// The last stored error message, if any.
    pub fn error(&self) -> Option<String> {
        self.state.read().unwrap().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartDraft;

    fn part(id: &str, name: &str) -> Part {
        Part::from_draft(
            PartDraft {
                name: name.to_string(),
                description: String::new(),
                quantity: 1,
                price: 1.0,
                category: "General".to_string(),
                min_stock: 5,
                image_url: None,
            },
            id.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_set_parts_yields_exactly_the_given_list() {
        let mut state = InventoryState::default();
        let parts = vec![part("a", "A"), part("b", "B")];

        state.apply(Transition::SetParts(parts.clone()));
        assert_eq!(state.parts, parts);
    }

    #[test]
    fn test_add_part_is_append() {
        let mut state = InventoryState::default();
        let existing = vec![part("a", "A")];
        state.apply(Transition::SetParts(existing.clone()));

        let new = part("b", "B");
        state.apply(Transition::AddPart(new.clone()));

        let mut expected = existing;
        expected.push(new);
        assert_eq!(state.parts, expected);
    }

    #[test]
    fn test_remove_part_removes_at_most_one() {
        let mut state = InventoryState::default();
        state.apply(Transition::SetParts(vec![
            part("a", "A"),
            part("b", "B"),
            part("c", "C"),
        ]));

        state.apply(Transition::RemovePart("b".to_string()));
        assert_eq!(state.parts.len(), 2);
        assert!(state.parts.iter().all(|p| p.id != "b"));
    }

    #[test]
    fn test_remove_part_absent_id_is_noop() {
        let mut state = InventoryState::default();
        let parts = vec![part("a", "A")];
        state.apply(Transition::SetParts(parts.clone()));

        state.apply(Transition::RemovePart("missing".to_string()));
        assert_eq!(state.parts, parts);
    }

    #[test]
    fn test_update_part_leaves_other_parts_unchanged() {
        let mut state = InventoryState::default();
        let untouched = part("a", "A");
        state.apply(Transition::SetParts(vec![untouched.clone(), part("b", "B")]));

        state.apply(Transition::UpdatePart {
            id: "b".to_string(),
            patch: PartPatch {
                quantity: Some(50),
                ..Default::default()
            },
        });

        assert_eq!(state.parts[0], untouched);
        assert_eq!(state.parts[1].quantity, 50);
    }

    #[test]
    fn test_update_part_merges_and_advances_timestamp() {
        let mut state = InventoryState::default();
        let original = part("a", "A");
        let previous = original.updated_at;
        state.apply(Transition::SetParts(vec![original]));

        state.apply(Transition::UpdatePart {
            id: "a".to_string(),
            patch: PartPatch {
                price: Some(42.0),
                ..Default::default()
            },
        });

        let updated = &state.parts[0];
        assert_eq!(updated.price, 42.0);
        assert_eq!(updated.name, "A");
        assert!(updated.updated_at >= previous);
    }

    #[test]
    fn test_update_part_empty_patch_still_stamps() {
        let mut state = InventoryState::default();
        let original = part("a", "A");
        let previous = original.updated_at;
        state.apply(Transition::SetParts(vec![original.clone()]));

        state.apply(Transition::UpdatePart {
            id: "a".to_string(),
            patch: PartPatch::default(),
        });

        let updated = &state.parts[0];
        assert!(updated.updated_at >= previous);
        assert_eq!(updated.name, original.name);
        assert_eq!(updated.quantity, original.quantity);
        assert_eq!(updated.price, original.price);
        assert_eq!(updated.created_at, original.created_at);
    }

    #[test]
    fn test_update_part_absent_id_is_noop() {
        let mut state = InventoryState::default();
        let parts = vec![part("a", "A")];
        state.apply(Transition::SetParts(parts.clone()));

        state.apply(Transition::UpdatePart {
            id: "missing".to_string(),
            patch: PartPatch {
                quantity: Some(7),
                ..Default::default()
            },
        });
        assert_eq!(state.parts, parts);
    }

    #[test]
    fn test_update_category_has_no_timestamp_stamp() {
        let mut state = InventoryState::default();
        let category = Category {
            id: "c1".to_string(),
            name: "Brakes".to_string(),
            description: None,
            color: "#fff".to_string(),
            created_at: Utc::now(),
        };
        let created = category.created_at;
        state.apply(Transition::SetCategories(vec![category]));

        state.apply(Transition::UpdateCategory {
            id: "c1".to_string(),
            patch: CategoryPatch {
                name: Some("Brake system".to_string()),
                ..Default::default()
            },
        });

        assert_eq!(state.categories[0].name, "Brake system");
        assert_eq!(state.categories[0].created_at, created);
    }

    #[test]
    fn test_loading_flags_are_independent() {
        let mut state = InventoryState::default();

        state.apply(Transition::SetLoading(true));
        state.apply(Transition::SetPartsLoading(true));
        state.apply(Transition::SetCategoriesLoading(true));
        state.apply(Transition::SetPartsLoading(false));

        assert!(state.loading);
        assert!(!state.parts_loading);
        assert!(state.categories_loading);
    }

    #[test]
    fn test_error_slot_is_last_error_wins() {
        let mut state = InventoryState::default();

        state.apply(Transition::SetError(Some("first".to_string())));
        state.apply(Transition::SetError(Some("second".to_string())));
        assert_eq!(state.error.as_deref(), Some("second"));

        state.apply(Transition::ClearError);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_store_clones_share_state() {
        let store = Store::new();
        let other = store.clone();

        store.dispatch(Transition::AddPart(part("a", "A")));
        assert_eq!(other.parts().len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = Store::new();
        let snapshot = store.snapshot();

        store.dispatch(Transition::SetLoading(true));
        assert!(!snapshot.loading);
        assert!(store.snapshot().loading);
    }
}
