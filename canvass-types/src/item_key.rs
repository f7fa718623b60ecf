use std::fmt;

/// The path to a survey item, e.g., `"intake.symptoms.fever"`.
///
/// Keys are hierarchical, using dot notation for nesting: the item
/// `intake.symptoms.fever` lives inside the group `intake.symptoms`.
/// An `ItemKey` is never mutated after construction — renaming an item
/// produces a new key that replaces the old one on the owning item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Dot-separated full key, e.g., "intake.symptoms.fever".
    full: String,
}

impl ItemKey {
    /// Create a key from a dot-separated full-key string.
    ///
    /// Splitting is purely syntactic; no segment charset is enforced
    /// beyond "non-empty, no embedded separator sequence".
    pub fn from_full_key(full: impl Into<String>) -> Self {
        Self { full: full.into() }
    }

    /// Create a key from a local segment and an optional parent full key.
    pub fn from_parts(parent_full_key: Option<&str>, local_key: &str) -> Self {
        match parent_full_key {
            Some(parent) if !parent.is_empty() => Self {
                full: format!("{parent}.{local_key}"),
            },
            _ => Self {
                full: local_key.to_owned(),
            },
        }
    }

    /// The canonical dot-joined full key.
    pub fn full_key(&self) -> &str {
        &self.full
    }

    /// The last segment of the key.
    pub fn local_key(&self) -> &str {
        self.full.rsplit('.').next().unwrap_or(&self.full)
    }

    /// All-but-last segments joined, or `None` for a root item
    /// (a key with a single segment).
    pub fn parent_full_key(&self) -> Option<&str> {
        self.full.rfind('.').map(|last_dot| &self.full[..last_dot])
    }

    /// The segments of this key in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.full.split('.').filter(|s| !s.is_empty())
    }

    /// The number of segments in this key.
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Check if the key has no segments.
    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    /// Return a new key with the same local segment under a new parent.
    ///
    /// Does not mutate the owner; the owning item must re-point its
    /// stored key to the returned value.
    pub fn with_new_parent(&self, new_parent_full_key: Option<&str>) -> Self {
        Self::from_parts(new_parent_full_key, self.local_key())
    }

    /// Segment-exact prefix test, true for equal keys.
    ///
    /// `item1` is a prefix of `item1.x` but not of `item10.x`.
    pub fn is_prefix_of(&self, other: &ItemKey) -> bool {
        other.full == self.full
            || (other.full.starts_with(&self.full)
                && other.full[self.full.len()..].starts_with('.'))
    }

    /// Replace a segment-exact prefix of this key, keeping the remaining
    /// local segments unchanged. Returns `None` when `old_prefix` is not
    /// a prefix of this key.
    pub fn splice_prefix(&self, old_prefix: &ItemKey, new_prefix: &ItemKey) -> Option<Self> {
        if self.full == old_prefix.full {
            return Some(new_prefix.clone());
        }
        if old_prefix.is_prefix_of(self) {
            let rest = &self.full[old_prefix.full.len() + 1..];
            Some(Self {
                full: format!("{}.{rest}", new_prefix.full),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        Self::from_full_key(s)
    }
}

impl From<String> for ItemKey {
    fn from(s: String) -> Self {
        Self::from_full_key(s)
    }
}
