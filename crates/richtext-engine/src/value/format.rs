//! Format handles and replacement payloads.
//!
//! A [`Format`] is an `Arc` around an immutable [`FormatData`]. Cloning a
//! handle is cheap and keeps its identity: two slots that belong to the same
//! run hold clones of one handle, and [`Format::same`] tells runs apart in
//! O(1). `PartialEq` compares the data instead.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Attribute name to value.
pub type Attributes = BTreeMap<String, String>;

/// The formats active at one offset, outermost first. Empty means unformatted.
pub type Formats = Vec<Format>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatData {
    /// Registered format name (`core/bold`) or a bare lowercase tag name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// `None` when the source element carried no attributes at all.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attributes: Option<Attributes>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unregistered_attributes: Option<Attributes>,
    /// Verbatim inner markup of a non-editable replacement.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inner_html: Option<String>,
}

#[derive(Clone)]
pub struct Format(Arc<FormatData>);

impl Format {
    /// A format with no attributes.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::from_data(FormatData {
            type_name: type_name.into(),
            ..FormatData::default()
        })
    }

    pub fn with_attributes<K, V>(
        type_name: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_data(FormatData {
            type_name: type_name.into(),
            attributes: Some(
                attributes
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..FormatData::default()
        })
    }

    pub fn from_data(data: FormatData) -> Self {
        Self(Arc::new(data))
    }

    /// Whether both handles point at the same allocation.
    pub fn same(a: &Format, b: &Format) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.0
            .attributes
            .as_ref()
            .and_then(|attrs| attrs.get(name))
            .map(String::as_str)
    }

    pub fn data(&self) -> &FormatData {
        &self.0
    }
}

impl Deref for Format {
    type Target = FormatData;

    fn deref(&self) -> &FormatData {
        &self.0
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        Format::same(self, other) || *self.0 == *other.0
    }
}

impl Eq for Format {}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Format {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        FormatData::deserialize(deserializer).map(Format::from_data)
    }
}

/// What a reserved character stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Replacement {
    /// Payload of an object-replacement character.
    Object(Format),
    /// List nesting of a line separator, outermost first. Never empty.
    Markers(Vec<Format>),
}

impl Replacement {
    pub fn as_object(&self) -> Option<&Format> {
        match self {
            Replacement::Object(format) => Some(format),
            Replacement::Markers(_) => None,
        }
    }

    pub fn markers(&self) -> &[Format] {
        match self {
            Replacement::Markers(markers) => markers,
            Replacement::Object(_) => &[],
        }
    }
}

/// Depth-aware structural lookup: a format equal to `format` at `index` in
/// either neighbouring slot, so a run can extend instead of splitting.
pub(crate) fn equal_neighbour<'a>(
    before: Option<&'a Formats>,
    after: Option<&'a Formats>,
    index: usize,
    format: &Format,
) -> Option<&'a Format> {
    [before, after]
        .into_iter()
        .flatten()
        .filter_map(|slot| slot.get(index))
        .find(|candidate| *candidate == format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clones_share_identity() {
        let em = Format::new("em");
        let copy = em.clone();
        assert!(Format::same(&em, &copy));
    }

    #[test]
    fn equal_data_is_not_the_same_handle() {
        let a = Format::new("em");
        let b = Format::new("em");
        assert_eq!(a, b);
        assert!(!Format::same(&a, &b));
    }

    #[test]
    fn attributes_take_part_in_equality() {
        let a = Format::with_attributes("a", [("href", "#x")]);
        let b = Format::with_attributes("a", [("href", "#y")]);
        assert_ne!(a, b);
        assert_eq!(a.attribute("href"), Some("#x"));
    }

    #[test]
    fn missing_and_empty_attributes_differ() {
        assert_ne!(
            Format::new("a"),
            Format::with_attributes("a", Vec::<(String, String)>::new())
        );
    }

    #[test]
    fn serializes_like_a_plain_record() {
        let link = Format::with_attributes("core/link", [("url", "x")]);
        assert_eq!(
            serde_json::to_string(&link).unwrap(),
            r#"{"type":"core/link","attributes":{"url":"x"}}"#
        );
    }

    #[test]
    fn neighbour_lookup_respects_depth() {
        let em = Format::new("em");
        let strong = Format::new("strong");
        let before = vec![em.clone(), strong.clone()];
        let found = equal_neighbour(Some(&before), None, 1, &Format::new("strong"));
        assert!(found.is_some_and(|f| Format::same(f, &strong)));
        assert!(equal_neighbour(Some(&before), None, 0, &Format::new("strong")).is_none());
    }
}
