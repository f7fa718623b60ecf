use std::fmt;
use std::str::FromStr;

use crate::{ComponentKey, ItemKey, ReferenceError};

/// The literal separator between the parts of a value reference.
pub const REF_SEPARATOR: &str = "...";

/// How a referenced value is read: the value itself, or its presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefMethod {
    /// Read the stored value.
    Get,

    /// Read whether a value is present.
    IsDefined,
}

impl RefMethod {
    /// The exact string form used inside reference strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::IsDefined => "isDefined",
        }
    }
}

impl FromStr for RefMethod {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "isDefined" => Ok(Self::IsDefined),
            other => Err(ReferenceError::UnknownMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for RefMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A string-addressable pointer to one evaluable value:
/// `<itemFullKey>...<method>[...<componentFullKey>]`.
///
/// The canonical string form is the identity used for set deduplication
/// and for joining used references against declared ones; `parse` and
/// `Display` are exact inverses with no normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueReference {
    item_key: ItemKey,
    method: RefMethod,
    slot_key: Option<ComponentKey>,
}

impl ValueReference {
    /// Parse a reference string.
    ///
    /// Fails with [`ReferenceError::Malformed`] when fewer than two or
    /// more than three separator-delimited parts exist or the item part
    /// is empty, and with [`ReferenceError::UnknownMethod`] when the
    /// method part is not a recognized method.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let parts: Vec<&str> = s.split(REF_SEPARATOR).collect();
        if !(2..=3).contains(&parts.len()) || parts[0].is_empty() {
            return Err(ReferenceError::Malformed(s.to_owned()));
        }
        let item_key = ItemKey::from_full_key(parts[0]);
        let method = parts[1].parse()?;
        let slot_key = match parts.get(2) {
            Some(&"") => return Err(ReferenceError::Malformed(s.to_owned())),
            Some(component) => Some(ComponentKey::from_full_key(component, item_key.clone())),
            None => None,
        };
        Ok(Self {
            item_key,
            method,
            slot_key,
        })
    }

    /// Build a reference from parts, producing a string identical to what
    /// parsing the equivalent reference string yields. The slot key is
    /// re-anchored to `item_key` so structural equality coincides with
    /// string equality.
    pub fn from_parts(
        item_key: ItemKey,
        method: RefMethod,
        slot_key: Option<ComponentKey>,
    ) -> Self {
        let slot_key = slot_key.map(|slot| slot.with_parent_item_key(item_key.clone()));
        Self {
            item_key,
            method,
            slot_key,
        }
    }

    /// The referenced item's key.
    pub fn item_key(&self) -> &ItemKey {
        &self.item_key
    }

    /// How the referenced value is read.
    pub fn method(&self) -> RefMethod {
        self.method
    }

    /// The component-scoped slot, if the reference names one.
    pub fn slot_key(&self) -> Option<&ComponentKey> {
        self.slot_key.as_ref()
    }
}

impl fmt::Display for ValueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{REF_SEPARATOR}{}", self.item_key, self.method)?;
        if let Some(slot) = &self.slot_key {
            write!(f, "{REF_SEPARATOR}{}", slot.full_key())?;
        }
        Ok(())
    }
}

impl FromStr for ValueReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
