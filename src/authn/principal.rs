//! Authenticated principal model.
//!
//! A principal is produced by a credential validator and is immutable once
//! created: construction takes the full attribute map, the accessors only
//! read. Group membership travels in the `memberOf` attribute.

use std::collections::BTreeMap;

/// Attribute conveying group membership.
pub const GROUP_ATTRIBUTE: &str = "memberOf";

/// An authenticated identity with multivalued attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    id: String,
    attributes: BTreeMap<String, Vec<String>>,
}

impl Principal {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(
        id: impl Into<String>,
        attributes: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Values for `name`, if the attribute is present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Whether `name` carries `value` (exact match).
    #[must_use]
    pub fn has_attribute_value(&self, name: &str, value: &str) -> bool {
        self.attribute(name)
            .is_some_and(|values| values.iter().any(|candidate| candidate == value))
    }

    /// Whether the principal is a member of `group` per `memberOf`.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.has_attribute_value(GROUP_ATTRIBUTE, group)
    }
}
