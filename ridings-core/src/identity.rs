//! Canonical identities for boundary features.
//!
//! Source files name the same attribute in several ways depending on their
//! vintage and language. The [`IdentityResolver`] evaluates ordered candidate
//! lists against the attribute mapping and never fails: missing data resolves
//! to the [`UNKNOWN`] sentinel.

use std::fmt;

use crate::{Attributes, Feature};

/// Sentinel used when a name or parent region cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Two-digit province and territory codes mapped to their canonical names.
pub const PROVINCE_CODES: [(&str, &str); 13] = [
    ("10", "Newfoundland and Labrador"),
    ("11", "Prince Edward Island"),
    ("12", "Nova Scotia"),
    ("13", "New Brunswick"),
    ("24", "Quebec"),
    ("35", "Ontario"),
    ("46", "Manitoba"),
    ("47", "Saskatchewan"),
    ("48", "Alberta"),
    ("59", "British Columbia"),
    ("60", "Yukon"),
    ("61", "Northwest Territories"),
    ("62", "Nunavut"),
];

/// Look up a province or territory by its two-digit code.
///
/// # Examples
/// ```
/// use ridings_core::province_name;
///
/// assert_eq!(province_name("35"), Some("Ontario"));
/// assert_eq!(province_name("99"), None);
/// ```
pub fn province_name(code: &str) -> Option<&'static str> {
    PROVINCE_CODES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}

const FEDERAL_NAME_FIELDS: [&str; 6] = ["FEDNAME", "FEDENAME", "FEDFNAME", "ED_NAME", "EDNAME", "NAME"];
const FEDERAL_CODE_FIELDS: [&str; 2] = ["PRUID", "PROV"];
const FEDERAL_PARENT_NAME_FIELDS: [&str; 2] = ["PRNAME", "PROVINCE"];
const FEDERAL_SOURCE_CODE_FIELDS: [&str; 1] = ["FEDUID"];

/// The pair that identifies a stored boundary.
///
/// Comparison is exact: case and whitespace are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DedupKey {
    region_name: String,
    parent_region: String,
}

impl DedupKey {
    /// Build a key from its two components.
    pub fn new(region_name: impl Into<String>, parent_region: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            parent_region: parent_region.into(),
        }
    }

    /// Region (riding) name.
    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    /// Parent region (province or territory).
    pub fn parent_region(&self) -> &str {
        &self.parent_region
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.region_name, self.parent_region)
    }
}

/// Resolved identity of a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    /// Region name; never empty.
    pub region_name: String,
    /// Parent region name or [`UNKNOWN`].
    pub parent_region: String,
    /// Source-assigned code, empty when the source did not provide one.
    pub source_code: String,
}

impl Identity {
    /// Construct an identity.
    pub fn new(
        region_name: impl Into<String>,
        parent_region: impl Into<String>,
        source_code: impl Into<String>,
    ) -> Self {
        Self {
            region_name: region_name.into(),
            parent_region: parent_region.into(),
            source_code: source_code.into(),
        }
    }

    /// Key used to match this identity against stored records.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.region_name.clone(), self.parent_region.clone())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.region_name, self.parent_region)
    }
}

/// Derives [`Identity`] values from attribute mappings.
///
/// Each list is evaluated in order and the first present, non-empty value
/// wins. The default layout matches federal electoral district files.
///
/// # Examples
/// ```
/// use ridings_core::{Attributes, IdentityResolver};
/// use serde_json::json;
///
/// let resolver = IdentityResolver::default();
/// let identity = resolver.resolve(&Attributes::from_pairs([
///     ("FEDENAME", json!("Ottawa Centre")),
///     ("PRUID", json!("35")),
///     ("FEDUID", json!("35075")),
/// ]));
/// assert_eq!(identity.region_name, "Ottawa Centre");
/// assert_eq!(identity.parent_region, "Ontario");
/// assert_eq!(identity.source_code, "35075");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    name_fields: Vec<String>,
    code_fields: Vec<String>,
    parent_name_fields: Vec<String>,
    source_code_fields: Vec<String>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::federal()
    }
}

fn owned<const N: usize>(fields: [&str; N]) -> Vec<String> {
    fields.iter().map(|field| (*field).to_owned()).collect()
}

impl IdentityResolver {
    /// Field layout of federal electoral district boundary files.
    pub fn federal() -> Self {
        Self {
            name_fields: owned(FEDERAL_NAME_FIELDS),
            code_fields: owned(FEDERAL_CODE_FIELDS),
            parent_name_fields: owned(FEDERAL_PARENT_NAME_FIELDS),
            source_code_fields: owned(FEDERAL_SOURCE_CODE_FIELDS),
        }
    }

    /// Replace the ordered region-name candidates.
    #[must_use]
    pub fn with_name_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ordered province-code candidates.
    #[must_use]
    pub fn with_code_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.code_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ordered parent-name override candidates.
    #[must_use]
    pub fn with_parent_name_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_name_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ordered source-code candidates.
    #[must_use]
    pub fn with_source_code_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_code_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the identity of an attribute mapping.
    pub fn resolve(&self, attributes: &Attributes) -> Identity {
        let region_name = first(attributes, &self.name_fields).unwrap_or_else(|| UNKNOWN.to_owned());
        let parent_region = self.resolve_parent(attributes);
        let source_code = first(attributes, &self.source_code_fields).unwrap_or_default();
        Identity {
            region_name,
            parent_region,
            source_code,
        }
    }

    /// Resolve the identity of a feature.
    pub fn resolve_feature(&self, feature: &Feature) -> Identity {
        self.resolve(&feature.attributes)
    }

    /// Source code of a feature without resolving the rest of its identity.
    pub fn source_code(&self, attributes: &Attributes) -> Option<String> {
        first(attributes, &self.source_code_fields)
    }

    fn resolve_parent(&self, attributes: &Attributes) -> String {
        first(attributes, &self.code_fields)
            .and_then(|code| province_name(&code))
            .map(str::to_owned)
            .or_else(|| first(attributes, &self.parent_name_fields))
            .unwrap_or_else(|| UNKNOWN.to_owned())
    }
}

fn first(attributes: &Attributes, fields: &[String]) -> Option<String> {
    attributes.first_text(fields.iter().map(String::as_str))
}
