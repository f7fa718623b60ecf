use std::collections::HashMap;

use crate::Value;

/// Collected responses for a survey, supplied per evaluation call.
///
/// Keys are item full keys. Each item's response carries an optional
/// primary value plus any number of component-scoped slot values keyed
/// by component full key.
#[derive(Debug, Clone, Default)]
pub struct SurveyResponses {
    items: HashMap<String, ItemResponse>,
}

impl SurveyResponses {
    /// Create an empty response collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the response for an item.
    pub fn insert(&mut self, item_full_key: impl Into<String>, response: ItemResponse) {
        self.items.insert(item_full_key.into(), response);
    }

    /// Insert a primary value for an item, without slots.
    pub fn insert_value(&mut self, item_full_key: impl Into<String>, value: impl Into<Value>) {
        self.insert(item_full_key, ItemResponse::new(value));
    }

    /// Get the response for an item.
    pub fn get(&self, item_full_key: &str) -> Option<&ItemResponse> {
        self.items.get(item_full_key)
    }

    /// Check if a response exists for the given item.
    pub fn contains(&self, item_full_key: &str) -> bool {
        self.items.contains_key(item_full_key)
    }

    /// Remove the response for an item.
    pub fn remove(&mut self, item_full_key: &str) -> Option<ItemResponse> {
        self.items.remove(item_full_key)
    }

    /// Iterate over all item responses.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemResponse)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The number of item responses.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no responses.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for SurveyResponses {
    type Item = (String, ItemResponse);
    type IntoIter = std::collections::hash_map::IntoIter<String, ItemResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// The response recorded for one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemResponse {
    /// The item's own primary value.
    value: Option<Value>,

    /// Component-scoped slot values, keyed by component full key.
    slots: HashMap<String, Value>,
}

impl ItemResponse {
    /// Create a response with the given primary value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            slots: HashMap::new(),
        }
    }

    /// Create a response with no value yet (the item was visited but
    /// not answered).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a slot value, keyed by component full key.
    pub fn with_slot(mut self, slot_full_key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(slot_full_key.into(), value.into());
        self
    }

    /// The value for the given slot, or the primary value when no slot
    /// is requested. `None` means undefined.
    pub fn get(&self, slot_full_key: Option<&str>) -> Option<&Value> {
        match slot_full_key {
            Some(slot) => self.slots.get(slot),
            None => self.value.as_ref(),
        }
    }

    /// The primary value.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Set the primary value.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }

    /// Set a slot value.
    pub fn set_slot(&mut self, slot_full_key: impl Into<String>, value: impl Into<Value>) {
        self.slots.insert(slot_full_key.into(), value.into());
    }
}
