//! Rendering of retained elements, text and comments.

use crate::configuration::{Configuration, TagRules};
use crate::encoder::{escape_text, AttributeEncoder};
use crate::normalize::{restore_reserved_tags, NameNormalizer};
use lazy_static::lazy_static;
use regex::Regex;

/// Opening delimiter of escaped markup.
pub const LT: &str = "&lt;";
/// Closing delimiter of escaped markup.
pub const GT: &str = "&gt;";

lazy_static! {
    static ref LINE_BREAK_PATTERN: Regex = Regex::new(r"\r\n|\r|\n").expect("valid regex pattern");
    static ref EXCESSIVE_WHITESPACE_PATTERN: Regex = Regex::new(r"\s{2,}").expect("valid regex pattern");
}

/// Collapse line breaks and whitespace runs to single spaces and trim.
pub fn minify_text(text: &str) -> String {
    let text = LINE_BREAK_PATTERN.replace_all(text, " ");
    let text = EXCESSIVE_WHITESPACE_PATTERN.replace_all(&text, " ");

    text.trim().to_string()
}

/// Renders output according to a configuration.
#[derive(Debug, Clone)]
pub struct Serializer<'a> {
    configuration: &'a Configuration,
    rules: &'a TagRules,
    names: NameNormalizer,
    encoder: AttributeEncoder,
}

impl<'a> Serializer<'a> {
    /// A serializer for the configuration and its canonical tag rules.
    pub fn new(configuration: &'a Configuration, rules: &'a TagRules) -> Self {
        Self {
            configuration,
            rules,
            names: configuration.names(),
            encoder: AttributeEncoder::new(
                configuration.quote,
                configuration.attribute_value_case,
            ),
        }
    }

    fn delimiters(&self, escaped: bool) -> (&str, &str) {
        if escaped {
            (LT, GT)
        } else {
            (
                self.configuration.tag_open.as_str(),
                self.configuration.tag_close.as_str(),
            )
        }
    }

    /// Join canonical attribute names with their raw values.
    pub fn attributes<'b, I>(&self, attrs: I, escaped: bool) -> String
    where
        I: IntoIterator<Item = (&'b str, &'b str)>,
    {
        let mut joined = String::new();

        for (name, value) in attrs {
            let value = restore_reserved_tags(value);

            if escaped {
                joined.push_str(&self.encoder.join_attribute(&escape_text(name), &value));
            } else {
                joined.push_str(&self.encoder.join_attribute(name, &value));
            }
        }

        joined
    }

    fn tag_name(&self, tag: &str, escaped: bool) -> String {
        let name = self.names.restore_tag(tag);

        if escaped {
            escape_text(&name).into_owned()
        } else {
            name
        }
    }

    /// `<tag attrs>` for a canonical tag name and joined attributes.
    pub fn open_tag(&self, tag: &str, attributes: &str, escaped: bool) -> String {
        let (open, close) = self.delimiters(escaped);

        format!("{open}{}{attributes}{close}", self.tag_name(tag, escaped))
    }

    /// `</tag>`, or `None` for self-closing tags.
    pub fn close_tag(&self, tag: &str, escaped: bool) -> Option<String> {
        if self.rules.is_self_closing(tag) {
            None
        } else {
            let (open, close) = self.delimiters(escaped);

            Some(format!("{open}/{}{close}", self.tag_name(tag, escaped)))
        }
    }

    /// Text content: case transformed, minified when configured and escaped.
    pub fn text(&self, text: &str) -> String {
        let text = restore_reserved_tags(text);
        let text = self.configuration.text_case.apply(&text);

        if self.configuration.minify {
            escape_text(&minify_text(&text)).into_owned()
        } else {
            escape_text(&text).into_owned()
        }
    }

    /// A comment with its delimiters. Escaped comments escape their content too.
    pub fn comment(&self, content: &str, escaped: bool) -> String {
        let content = restore_reserved_tags(content);
        let (open, close) = self.delimiters(escaped);

        if escaped {
            format!("{open}!--{}--{close}", escape_text(&content))
        } else {
            format!("{open}!--{content}--{close}")
        }
    }
}
