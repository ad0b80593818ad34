use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use std::str::FromStr;

new_key_type! {
    /// Identifies an inventory owned by the host (cargo container, assembler
    /// input or output slot).
    pub struct InventoryId;

    /// Identifies a worker unit (assembler) owned by the host.
    pub struct WorkerId;
}

/// A category and subtype of material or good, e.g. `ingot:iron`.
///
/// Parses from and displays as `category:subtype`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKind {
    category: String,
    subtype: String,
}

impl ItemKind {
    pub fn new(category: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subtype: subtype.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.subtype)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid item kind '{0}', expected 'category:subtype'")]
pub struct ParseItemKindError(pub String);

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((category, subtype))
                if !category.is_empty() && !subtype.is_empty() && !subtype.contains(':') =>
            {
                Ok(Self::new(category, subtype))
            }
            _ => Err(ParseItemKindError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ItemKind {
    type Error = ParseItemKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.to_string()
    }
}

/// Identifies a producible blueprint, e.g. `tech2x`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub String);

impl RecipeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
