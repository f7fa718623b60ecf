use std::fmt;

use crate::ItemKey;

/// The path to a component within an item, anchored to the owning item.
///
/// Components nest, e.g. an option inside a choice group inside a question:
/// local key `"yes"` under parent component `"scg"` yields the component
/// full key `"scg.yes"`. The item anchor only changes through explicit
/// propagation when the owning item is renamed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    /// Local segment, e.g. "yes".
    component_key: String,

    /// Full key of the parent component, if this component is nested.
    parent_component_full_key: Option<String>,

    /// Key of the item that owns this component.
    parent_item_key: ItemKey,
}

impl ComponentKey {
    /// Create a component key from a dot-separated component full key.
    /// The last segment becomes the local key.
    pub fn from_full_key(full: &str, parent_item_key: ItemKey) -> Self {
        match full.rfind('.') {
            Some(last_dot) => Self {
                component_key: full[last_dot + 1..].to_owned(),
                parent_component_full_key: Some(full[..last_dot].to_owned()),
                parent_item_key,
            },
            None => Self {
                component_key: full.to_owned(),
                parent_component_full_key: None,
                parent_item_key,
            },
        }
    }

    /// Create a component key from explicit parts.
    pub fn from_parts(
        parent_item_key: ItemKey,
        parent_component_full_key: Option<&str>,
        component_key: &str,
    ) -> Self {
        Self {
            component_key: component_key.to_owned(),
            parent_component_full_key: parent_component_full_key
                .filter(|parent| !parent.is_empty())
                .map(str::to_owned),
            parent_item_key,
        }
    }

    /// The local segment of this component.
    pub fn component_key(&self) -> &str {
        &self.component_key
    }

    /// The full key of the parent component, if any.
    pub fn parent_component_full_key(&self) -> Option<&str> {
        self.parent_component_full_key.as_deref()
    }

    /// The key of the owning item.
    pub fn parent_item_key(&self) -> &ItemKey {
        &self.parent_item_key
    }

    /// The dot-joined component full key, e.g. "scg.yes".
    pub fn full_key(&self) -> String {
        match &self.parent_component_full_key {
            Some(parent) => format!("{parent}.{}", self.component_key),
            None => self.component_key.clone(),
        }
    }

    /// Return a new key with the same local segment under a new parent
    /// component. Does not mutate the owner.
    pub fn with_new_parent(&self, new_parent_component_full_key: Option<&str>) -> Self {
        Self::from_parts(
            self.parent_item_key.clone(),
            new_parent_component_full_key,
            &self.component_key,
        )
    }

    /// Return a new key re-anchored to a renamed owning item.
    pub fn with_parent_item_key(&self, parent_item_key: ItemKey) -> Self {
        Self {
            component_key: self.component_key.clone(),
            parent_component_full_key: self.parent_component_full_key.clone(),
            parent_item_key,
        }
    }

    /// Replace a segment-exact prefix of a component full key, keeping
    /// the remaining segments unchanged. Returns `None` when `old_prefix`
    /// is not the key itself or a segment-exact prefix of it.
    pub fn splice_full_key(full: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
        if full == old_prefix {
            Some(new_prefix.to_owned())
        } else if full.starts_with(old_prefix) && full[old_prefix.len()..].starts_with('.') {
            Some(format!("{new_prefix}{}", &full[old_prefix.len()..]))
        } else {
            None
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_key())
    }
}
