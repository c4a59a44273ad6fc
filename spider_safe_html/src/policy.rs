//! Tag to attribute policies.

use crate::error::{json_type, ConfigWarning};
use crate::normalize::{NameNormalizer, WILDCARD};
use hashbrown::HashMap;
use indexmap::IndexSet;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// How a policy table is interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    /// The table is an allow-list. Anything not listed is dropped or escaped.
    Keep,
    /// The table is a deny-list. Anything not listed passes through.
    Remove,
}

impl Mode {
    /// Parse a mode name.
    pub fn parse(s: &str) -> Option<Mode> {
        if s.eq_ignore_ascii_case("keep") {
            Some(Mode::Keep)
        } else if s.eq_ignore_ascii_case("remove") {
            Some(Mode::Remove)
        } else {
            None
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Mode::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown mode {s:?}")))
    }
}

/// Safe formatting tags kept by default.
const SAFE_KEEP: &[(&str, &[&str])] = &[
    ("#text", &[]),
    ("a", &["href"]),
    ("b", &[]),
    ("br", &[]),
    ("strong", &[]),
    ("i", &[]),
    ("em", &[]),
    ("u", &[]),
    ("ins", &[]),
    ("s", &[]),
    ("del", &[]),
    ("strike", &[]),
    ("q", &[]),
    ("small", &[]),
    ("big", &[]),
    ("sup", &[]),
    ("sub", &[]),
];

/// Unsafe tags removed by default.
const SAFE_REMOVE: &[(&str, &[&str])] = &[
    ("code", &[]),
    ("pre", &[]),
    ("script", &[]),
    ("style", &[]),
];

/// A named built-in policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    #[default]
    /// Inline formatting only: `a[href]`, `b`, `strong`, `em` and friends.
    SafeKeep,
    /// Strip `code`, `pre`, `script` and `style`.
    SafeRemove,
}

impl Preset {
    /// Parse a preset name.
    pub fn parse(s: &str) -> Option<Preset> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "safe-keep" | "keep" => Some(Preset::SafeKeep),
            "safe-remove" | "remove" => Some(Preset::SafeRemove),
            _ => None,
        }
    }

    /// The default preset for a mode.
    pub fn for_mode(mode: Mode) -> Preset {
        match mode {
            Mode::Keep => Preset::SafeKeep,
            Mode::Remove => Preset::SafeRemove,
        }
    }

    /// The raw policy of the preset.
    pub fn policy(&self) -> Policy {
        let entries = match self {
            Preset::SafeKeep => SAFE_KEEP,
            Preset::SafeRemove => SAFE_REMOVE,
        };

        entries
            .iter()
            .map(|(tag, attributes)| (*tag, attributes.to_vec()))
            .collect()
    }
}

impl<'de> Deserialize<'de> for Preset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Preset::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown preset {s:?}")))
    }
}

/// The attributes given for a tag in a raw policy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AttributeSpec {
    #[default]
    /// No attributes given.
    Omitted,
    /// A single attribute name.
    Single(String),
    /// An ordered list of attribute names.
    List(Vec<String>),
}

impl From<&str> for AttributeSpec {
    fn from(name: &str) -> Self {
        AttributeSpec::Single(name.into())
    }
}

impl From<String> for AttributeSpec {
    fn from(name: String) -> Self {
        AttributeSpec::Single(name)
    }
}

impl From<Vec<String>> for AttributeSpec {
    fn from(names: Vec<String>) -> Self {
        AttributeSpec::List(names)
    }
}

impl From<Vec<&str>> for AttributeSpec {
    fn from(names: Vec<&str>) -> Self {
        AttributeSpec::List(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttributeSpec {
    fn from(names: [&str; N]) -> Self {
        AttributeSpec::List(names.iter().map(|name| name.to_string()).collect())
    }
}

/// A user supplied, not yet normalized policy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Policy {
    entries: Vec<(String, AttributeSpec)>,
}

impl Policy {
    /// An empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag entry. Use `*` as the tag for any tag not listed and `*` as an
    /// attribute for every attribute.
    pub fn with_tag(
        &mut self,
        tag: impl Into<String>,
        attributes: impl Into<AttributeSpec>,
    ) -> &mut Self {
        self.entries.push((tag.into(), attributes.into()));
        self
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[(String, AttributeSpec)] {
        &self.entries
    }

    /// Load a policy from a json object of `tag -> [attribute] | attribute | null`.
    ///
    /// Returns `None` when the value is absent or not an object, in which case
    /// the caller falls back to a preset.
    pub fn from_value(value: &Value) -> (Option<Policy>, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();

        let map = match value {
            Value::Object(map) => map,
            Value::Null => return (None, warnings),
            other => {
                warnings.push(ConfigWarning::invalid_option(
                    "policy",
                    format!("expected an object, got {}", json_type(other)),
                ));
                return (None, warnings);
            }
        };

        let mut policy = Policy::new();

        for (tag, attributes) in map {
            let spec = match attributes {
                Value::Array(items) => AttributeSpec::List(
                    items
                        .iter()
                        .filter_map(|item| match item.as_str() {
                            Some(name) => Some(name.to_string()),
                            _ => {
                                warnings.push(ConfigWarning::malformed_policy(
                                    tag,
                                    format!("skipped attribute of type {}", json_type(item)),
                                ));
                                None
                            }
                        })
                        .collect(),
                ),
                Value::String(name) => AttributeSpec::Single(name.clone()),
                Value::Null => AttributeSpec::Omitted,
                other => {
                    warnings.push(ConfigWarning::malformed_policy(
                        tag,
                        format!("unsupported attribute value {}", json_type(other)),
                    ));
                    AttributeSpec::Omitted
                }
            };

            policy.with_tag(tag.as_str(), spec);
        }

        (Some(policy), warnings)
    }
}

impl<T, A> FromIterator<(T, A)> for Policy
where
    T: Into<String>,
    A: Into<AttributeSpec>,
{
    fn from_iter<I: IntoIterator<Item = (T, A)>>(iter: I) -> Self {
        let mut policy = Policy::new();

        for (tag, attributes) in iter {
            policy.with_tag(tag, attributes);
        }

        policy
    }
}

/// Normalized attribute names of one policy entry.
///
/// An empty set means the tag decision does not depend on attributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttributeSet {
    names: IndexSet<String>,
    wildcard: bool,
}

impl AttributeSet {
    /// Add a normalized name. `*` marks the set as matching every attribute.
    pub fn insert(&mut self, name: String) {
        if name == WILDCARD {
            self.wildcard = true;
        } else {
            self.names.insert(name);
        }
    }

    /// No names and no wildcard.
    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.names.is_empty()
    }

    /// The set contains `*`.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// The attribute is named by the set, directly or through `*`.
    pub fn contains(&self, name: &str) -> bool {
        self.wildcard || self.names.contains(name)
    }

    /// Named attributes in insertion order, without the wildcard.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// A validated, normalized tag to attribute-set mapping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    entries: HashMap<String, AttributeSet>,
}

impl PolicyTable {
    /// Normalize a raw policy, falling back to the preset when absent.
    pub fn build(raw: Option<&Policy>, defaults: Preset, names: &NameNormalizer) -> Self {
        let preset;
        let policy = match raw {
            Some(policy) => policy,
            _ => {
                preset = defaults.policy();
                &preset
            }
        };

        let mut entries = HashMap::with_capacity(policy.entries().len());

        for (tag, spec) in policy.entries() {
            let mut attributes = AttributeSet::default();

            match spec {
                AttributeSpec::List(list) => {
                    for name in list {
                        attributes.insert(names.normalize_attribute(name));
                    }
                }
                AttributeSpec::Single(name) if !name.is_empty() => {
                    attributes.insert(names.normalize_attribute(name));
                }
                _ => (),
            }

            entries.insert(names.normalize_tag(tag), attributes);
        }

        Self { entries }
    }

    /// The entry for a normalized tag, or the `*` entry.
    pub fn lookup(&self, tag: &str) -> Option<&AttributeSet> {
        self.entries.get(tag).or_else(|| self.entries.get(WILDCARD))
    }

    /// The entry for a special node key such as `#text`. Never falls back to `*`.
    pub fn lookup_special(&self, key: &str) -> Option<&AttributeSet> {
        self.entries.get(key)
    }

    /// The tag has an explicit entry.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
