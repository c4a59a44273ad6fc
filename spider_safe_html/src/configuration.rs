//! Sanitizer options and tag lists.

use crate::error::{json_type, ConfigWarning};
use crate::normalize::{NameNormalizer, TextCase, DOCTYPE_SYNTHETIC, WILDCARD};
use hashbrown::HashSet;
use serde_json::Value;

/// Void elements that never get a closing tag.
pub const DEFAULT_SELF_CLOSING_TAGS: [&str; 16] = [
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Tags emitted by keep mode even when they end up with no attributes or content.
pub const DEFAULT_EMPTY_TAGS: [&str; 2] = ["td", "th"];

/// Tags whose whole subtree is discarded when the tag itself is dropped.
pub const DEFAULT_CLEAN_CONTENT_TAGS: [&str; 2] = ["script", "style"];

fn to_strings(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

/// Sanitizer options. Immutable once handed to a sanitizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Quote character wrapping attribute values.
    pub quote: char,
    /// Case of emitted tag names.
    pub tag_name_case: TextCase,
    /// Case of attribute names.
    pub attribute_name_case: TextCase,
    /// Case of attribute values.
    pub attribute_value_case: TextCase,
    /// Case of text content.
    pub text_case: TextCase,
    /// Render rejected markup as escaped text instead of dropping it.
    pub entities_encode: bool,
    /// Keep the attributes of escaped tags.
    pub keep_attributes: bool,
    /// Opening delimiter of live tags.
    pub tag_open: String,
    /// Closing delimiter of live tags.
    pub tag_close: String,
    /// Collapse whitespace in text and trim it.
    pub minify: bool,
    /// Tags without a closing tag.
    pub self_closing_tags: Vec<String>,
    /// Tags kept even when empty. `*` allows every empty tag.
    pub empty_tags: Vec<String>,
    /// Tags dropped together with their content.
    pub clean_content_tags: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            quote: '\'',
            tag_name_case: TextCase::Lowercase,
            attribute_name_case: TextCase::Lowercase,
            attribute_value_case: TextCase::None,
            text_case: TextCase::None,
            entities_encode: false,
            keep_attributes: true,
            tag_open: "<".into(),
            tag_close: ">".into(),
            minify: false,
            self_closing_tags: to_strings(&DEFAULT_SELF_CLOSING_TAGS),
            empty_tags: to_strings(&DEFAULT_EMPTY_TAGS),
            clean_content_tags: to_strings(&DEFAULT_CLEAN_CONTENT_TAGS),
        }
    }
}

impl Configuration {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote character for attribute values.
    pub fn with_quote(&mut self, quote: char) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Case of tag names.
    pub fn with_tag_name_case(&mut self, case: TextCase) -> &mut Self {
        self.tag_name_case = case;
        self
    }

    /// Case of attribute names.
    pub fn with_attribute_name_case(&mut self, case: TextCase) -> &mut Self {
        self.attribute_name_case = case;
        self
    }

    /// Case of attribute values.
    pub fn with_attribute_value_case(&mut self, case: TextCase) -> &mut Self {
        self.attribute_value_case = case;
        self
    }

    /// Case of text content.
    pub fn with_text_case(&mut self, case: TextCase) -> &mut Self {
        self.text_case = case;
        self
    }

    /// Escape rejected markup instead of dropping it.
    pub fn with_entities_encode(&mut self, entities_encode: bool) -> &mut Self {
        self.entities_encode = entities_encode;
        self
    }

    /// Keep the attributes of escaped tags.
    pub fn with_keep_attributes(&mut self, keep_attributes: bool) -> &mut Self {
        self.keep_attributes = keep_attributes;
        self
    }

    /// Delimiters of live tags.
    pub fn with_tag_delimiters(&mut self, open: &str, close: &str) -> &mut Self {
        self.tag_open = open.into();
        self.tag_close = close.into();
        self
    }

    /// Collapse and trim text whitespace.
    pub fn with_minify(&mut self, minify: bool) -> &mut Self {
        self.minify = minify;
        self
    }

    /// Replace the self-closing tag list.
    pub fn with_self_closing_tags(&mut self, tags: Vec<String>) -> &mut Self {
        self.self_closing_tags = tags;
        self
    }

    /// Replace the allowed empty tag list.
    pub fn with_empty_tags(&mut self, tags: Vec<String>) -> &mut Self {
        self.empty_tags = tags;
        self
    }

    /// Replace the clean content tag list.
    pub fn with_clean_content_tags(&mut self, tags: Vec<String>) -> &mut Self {
        self.clean_content_tags = tags;
        self
    }

    /// The name normalizer for these options.
    pub fn names(&self) -> NameNormalizer {
        NameNormalizer::new(self.tag_name_case, self.attribute_name_case)
    }

    /// The tag lists in canonical form.
    pub fn tag_rules(&self) -> TagRules {
        let names = self.names();
        let normalize = |tags: &[String]| -> HashSet<String> {
            tags.iter().map(|tag| names.normalize_tag(tag)).collect()
        };

        let mut self_closing = normalize(&self.self_closing_tags[..]);
        self_closing.insert(names.normalize_tag(DOCTYPE_SYNTHETIC));

        let empty = normalize(&self.empty_tags[..]);

        TagRules {
            self_closing,
            empty_wildcard: empty.contains(WILDCARD),
            empty,
            clean_content: normalize(&self.clean_content_tags[..]),
        }
    }

    /// Load options from a json object. Keys match case-insensitively and
    /// ignore `_` and `-`. Unknown keys and badly shaped values are reported
    /// and the default is kept.
    pub fn from_value(value: &Value) -> (Self, Vec<ConfigWarning>) {
        let mut configuration = Self::default();
        let mut warnings = Vec::new();

        let map = match value {
            Value::Object(map) => map,
            Value::Null => return (configuration, warnings),
            other => {
                warnings.push(ConfigWarning::invalid_option(
                    "options",
                    format!("expected an object, got {}", json_type(other)),
                ));
                return (configuration, warnings);
            }
        };

        for (option, value) in map {
            let key: String = option
                .chars()
                .filter(|c| *c != '_' && *c != '-')
                .collect::<String>()
                .to_ascii_uppercase();

            match key.as_str() {
                "QUOTATION" | "QUOTE" => {
                    if let Some(quote) = expect_char(option, value, &mut warnings) {
                        configuration.quote = quote;
                    }
                }
                "ENTITIESENCODE" => {
                    if let Some(flag) = expect_bool(option, value, &mut warnings) {
                        configuration.entities_encode = flag;
                    }
                }
                "KEEPATTRIBUTES" => {
                    if let Some(flag) = expect_bool(option, value, &mut warnings) {
                        configuration.keep_attributes = flag;
                    }
                }
                "MINIFY" => {
                    if let Some(flag) = expect_bool(option, value, &mut warnings) {
                        configuration.minify = flag;
                    }
                }
                "TAGNAME" => {
                    if let Some(case) = expect_case(option, value, &mut warnings) {
                        configuration.tag_name_case = case;
                    }
                }
                "ATTRIBUTENAME" => {
                    if let Some(case) = expect_case(option, value, &mut warnings) {
                        configuration.attribute_name_case = case;
                    }
                }
                "ATTRIBUTEVALUE" => {
                    if let Some(case) = expect_case(option, value, &mut warnings) {
                        configuration.attribute_value_case = case;
                    }
                }
                "TEXT" => {
                    if let Some(case) = expect_case(option, value, &mut warnings) {
                        configuration.text_case = case;
                    }
                }
                "TAGOPEN" => {
                    if let Some(open) = expect_str(option, value, &mut warnings) {
                        configuration.tag_open = open.into();
                    }
                }
                "TAGCLOSE" => {
                    if let Some(close) = expect_str(option, value, &mut warnings) {
                        configuration.tag_close = close.into();
                    }
                }
                "SELFCLOSINGTAGS" => {
                    if let Some(tags) = expect_list(option, value, &mut warnings) {
                        configuration.self_closing_tags = tags;
                    }
                }
                "EMPTYTAGS" => {
                    if let Some(tags) = expect_list(option, value, &mut warnings) {
                        configuration.empty_tags = tags;
                    }
                }
                "CLEANCONTENTTAGS" => {
                    if let Some(tags) = expect_list(option, value, &mut warnings) {
                        configuration.clean_content_tags = tags;
                    }
                }
                _ => warnings.push(ConfigWarning::invalid_option(option, "unknown option")),
            }
        }

        (configuration, warnings)
    }
}

fn expect_bool(option: &str, value: &Value, warnings: &mut Vec<ConfigWarning>) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        other => {
            warnings.push(ConfigWarning::invalid_option(
                option,
                format!("expected a boolean, got {}", json_type(other)),
            ));
            None
        }
    }
}

fn expect_str<'a>(
    option: &str,
    value: &'a Value,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<&'a str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        other => {
            warnings.push(ConfigWarning::invalid_option(
                option,
                format!("expected a string, got {}", json_type(other)),
            ));
            None
        }
    }
}

fn expect_char(option: &str, value: &Value, warnings: &mut Vec<ConfigWarning>) -> Option<char> {
    let s = expect_str(option, value, warnings)?;
    let mut chars = s.chars();

    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => {
            warnings.push(ConfigWarning::invalid_option(
                option,
                format!("expected a single character, got {s:?}"),
            ));
            None
        }
    }
}

fn expect_case(option: &str, value: &Value, warnings: &mut Vec<ConfigWarning>) -> Option<TextCase> {
    let s = expect_str(option, value, warnings)?;

    match TextCase::parse(s) {
        Some(case) => Some(case),
        _ => {
            warnings.push(ConfigWarning::invalid_option(
                option,
                format!("unknown text case {s:?}"),
            ));
            None
        }
    }
}

fn expect_list(
    option: &str,
    value: &Value,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<Vec<String>> {
    match value {
        Value::String(tag) => Some(vec![tag.clone()]),
        Value::Array(items) => {
            let mut tags = Vec::with_capacity(items.len());

            for item in items {
                match item.as_str() {
                    Some(tag) => tags.push(tag.to_string()),
                    _ => {
                        warnings.push(ConfigWarning::invalid_option(
                            option,
                            format!("expected a list of strings, found {}", json_type(item)),
                        ));
                        return None;
                    }
                }
            }

            Some(tags)
        }
        other => {
            warnings.push(ConfigWarning::invalid_option(
                option,
                format!("expected a string or a list of strings, got {}", json_type(other)),
            ));
            None
        }
    }
}

/// Configured tag lists in canonical form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagRules {
    /// Tags that never get a closing tag. Always holds the synthetic doctype.
    pub self_closing: HashSet<String>,
    /// Tags kept even when empty.
    pub empty: HashSet<String>,
    /// The empty list contains `*`.
    pub empty_wildcard: bool,
    /// Tags dropped together with their content.
    pub clean_content: HashSet<String>,
}

impl TagRules {
    /// The tag never gets a closing tag.
    pub fn is_self_closing(&self, tag: &str) -> bool {
        self.self_closing.contains(tag)
    }

    /// The tag may be emitted with no attributes and no content.
    pub fn allows_empty(&self, tag: &str) -> bool {
        self.empty_wildcard || self.empty.contains(tag) || self.self_closing.contains(tag)
    }

    /// The tag's content goes with it when it is dropped.
    pub fn is_clean_content(&self, tag: &str) -> bool {
        self.clean_content.contains(tag)
    }
}
