use indexmap::IndexMap;

use crate::{SurveyError, SurveyItem};

/// The survey tree: an owned arena of items keyed by full key, ordered
/// by insertion.
///
/// All structural mutation is expected to flow through the editor-facing
/// operations (insert, remove, rename); the arena itself enforces only
/// key uniqueness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    items: IndexMap<String, SurveyItem>,
}

impl Survey {
    /// Create an empty survey.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, keyed by its own full key.
    pub fn insert_item(&mut self, item: SurveyItem) -> Result<(), SurveyError> {
        let full_key = item.key().full_key().to_owned();
        if self.items.contains_key(&full_key) {
            return Err(SurveyError::DuplicateKey(full_key));
        }
        self.items.insert(full_key, item);
        Ok(())
    }

    /// Get an item by full key.
    pub fn item(&self, full_key: &str) -> Option<&SurveyItem> {
        self.items.get(full_key)
    }

    /// Get a mutable reference to an item by full key.
    pub fn item_mut(&mut self, full_key: &str) -> Option<&mut SurveyItem> {
        self.items.get_mut(full_key)
    }

    /// Check if an item with the given full key exists.
    pub fn contains(&self, full_key: &str) -> bool {
        self.items.contains_key(full_key)
    }

    /// Remove an item by full key, preserving the order of the rest.
    pub fn remove_item(&mut self, full_key: &str) -> Option<SurveyItem> {
        self.items.shift_remove(full_key)
    }

    /// Iterate over the items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &SurveyItem> {
        self.items.values()
    }

    /// Iterate mutably over the items in insertion order.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut SurveyItem> {
        self.items.values_mut()
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the survey has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the survey, yielding the underlying arena.
    pub fn into_items(self) -> IndexMap<String, SurveyItem> {
        self.items
    }

    /// Rebuild a survey from an arena (keys are trusted to match the
    /// items' own keys).
    pub fn from_items(items: IndexMap<String, SurveyItem>) -> Self {
        Self { items }
    }
}
