//! Name normalization and the reserved tag rename.
//!
//! html5ever gives a handful of tags special treatment: it injects
//! `<html>`/`<head>`/`<body>` wrappers, swallows doctypes, parses `<script>`
//! and `<style>` bodies as raw text and auto-closes void elements. To keep
//! that from distorting filtering decisions, those names are rewritten to
//! synthetic `safe_html_*` names on the raw markup before parsing and mapped
//! back when serializing. This is a narrow, best-effort rewrite of literal tag
//! occurrences and not a general purpose HTML rewriter.

use lazy_static::lazy_static;
use phf::phf_set;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;

/// Prefix given to reserved tag names before parsing.
pub const RESERVED_PREFIX: &str = "safe_html_";

/// Synthetic name of the doctype declaration.
pub const DOCTYPE_SYNTHETIC: &str = "safe_html_doctype";

/// Policy key addressing text nodes.
pub const TEXT_KEY: &str = "#text";

/// Policy key addressing comment nodes.
pub const COMMENT_KEY: &str = "#comment";

/// Wildcard tag or attribute.
pub const WILDCARD: &str = "*";

/// Tags renamed before parsing.
static RESERVED_TAG_SET: phf::Set<&'static str> = phf_set! {
    "!doctype",
    "html",
    "head",
    "body",
    "img",
    "script",
    "iframe",
    "object",
    "applet",
    "source",
    "embed",
    "frame",
    "style",
    "track",
};

lazy_static! {
    /// Opening and closing occurrences of a reserved tag in raw markup.
    static ref RESERVED_TAG_PATTERN: Regex = Regex::new(&format!(
        r"(?i)<(/?)({})([\s/>])",
        RESERVED_TAG_SET.iter().copied().collect::<Vec<_>>().join("|")
    ))
    .expect("valid regex pattern");
    /// Occurrences of an already renamed tag.
    static ref SYNTHETIC_TAG_PATTERN: Regex = Regex::new(&format!(
        r"(?i)<(/?){}({})([\s/>])",
        RESERVED_PREFIX,
        RESERVED_TAG_SET
            .iter()
            .map(|tag| tag.trim_start_matches('!'))
            .collect::<Vec<_>>()
            .join("|")
    ))
    .expect("valid regex pattern");
}

/// Text case transform for names, values and text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextCase {
    #[default]
    /// Leave the text as is.
    None,
    /// Lowercase.
    Lowercase,
    /// Uppercase.
    Uppercase,
}

impl TextCase {
    /// Parse a case name. Unknown names yield `None` so callers can warn.
    pub fn parse(s: &str) -> Option<TextCase> {
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            Some(TextCase::None)
        } else if s.eq_ignore_ascii_case("lowercase") || s.eq_ignore_ascii_case("lower") {
            Some(TextCase::Lowercase)
        } else if s.eq_ignore_ascii_case("uppercase") || s.eq_ignore_ascii_case("upper") {
            Some(TextCase::Uppercase)
        } else {
            None
        }
    }

    /// Apply the transform.
    pub fn apply<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self {
            TextCase::None => Cow::Borrowed(s),
            TextCase::Lowercase => {
                if s.chars().any(char::is_uppercase) {
                    Cow::Owned(s.to_lowercase())
                } else {
                    Cow::Borrowed(s)
                }
            }
            TextCase::Uppercase => {
                if s.chars().any(char::is_lowercase) {
                    Cow::Owned(s.to_uppercase())
                } else {
                    Cow::Borrowed(s)
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for TextCase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        TextCase::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown text case {s:?}")))
    }
}

/// Direction of the reserved name mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Real name to synthetic name, before parsing.
    ToSynthetic,
    /// Synthetic name back to the real name, when serializing.
    ToOriginal,
}

/// Map a single tag name to or from its synthetic form.
///
/// `ToSynthetic` expects a lowercase name. Names outside the reserved set are
/// returned unchanged in both directions.
pub fn reserved_rename(name: &str, direction: Direction) -> Cow<'_, str> {
    match direction {
        Direction::ToSynthetic => {
            if !RESERVED_TAG_SET.contains(name) {
                Cow::Borrowed(name)
            } else if name == "!doctype" {
                Cow::Borrowed(DOCTYPE_SYNTHETIC)
            } else {
                Cow::Owned(format!("{RESERVED_PREFIX}{name}"))
            }
        }
        Direction::ToOriginal => match name.get(..RESERVED_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(RESERVED_PREFIX) => {
                let rest = &name[RESERVED_PREFIX.len()..];

                if rest.eq_ignore_ascii_case("doctype") {
                    Cow::Owned(format!("!{rest}"))
                } else if RESERVED_TAG_SET.contains(rest.to_ascii_lowercase().as_str()) {
                    Cow::Borrowed(rest)
                } else {
                    Cow::Borrowed(name)
                }
            }
            _ => Cow::Borrowed(name),
        },
    }
}

/// Rewrite reserved tags in raw markup to their synthetic names.
pub fn rename_reserved_tags(markup: &str) -> Cow<'_, str> {
    RESERVED_TAG_PATTERN.replace_all(markup, |caps: &Captures| {
        format!(
            "<{}{}{}{}",
            &caps[1],
            RESERVED_PREFIX,
            caps[2].trim_start_matches('!'),
            &caps[3]
        )
    })
}

/// Undo `rename_reserved_tags` inside text, comments and attribute values.
pub fn restore_reserved_tags(text: &str) -> Cow<'_, str> {
    if !text.contains('<') {
        return Cow::Borrowed(text);
    }

    SYNTHETIC_TAG_PATTERN.replace_all(text, |caps: &Captures| {
        let name = &caps[2];
        let bang = if name.eq_ignore_ascii_case("doctype") {
            "!"
        } else {
            ""
        };

        format!("<{}{}{}{}", &caps[1], bang, name, &caps[3])
    })
}

/// Case folds tag and attribute names into the canonical form used for
/// policy matching.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NameNormalizer {
    /// Case of tag names.
    pub tag_case: TextCase,
    /// Case of attribute names.
    pub attribute_case: TextCase,
}

impl NameNormalizer {
    /// A new normalizer.
    pub fn new(tag_case: TextCase, attribute_case: TextCase) -> Self {
        Self {
            tag_case,
            attribute_case,
        }
    }

    /// Canonical tag name: lowercased, reserved names renamed, then the tag
    /// case applied. Used for policy keys, configured tag lists and element
    /// names alike so every comparison is between canonical forms.
    pub fn normalize_tag(&self, name: &str) -> String {
        let lower = name.to_lowercase();
        let renamed = reserved_rename(&lower, Direction::ToSynthetic);

        self.tag_case.apply(&renamed).into_owned()
    }

    /// Canonical attribute name.
    pub fn normalize_attribute(&self, name: &str) -> String {
        self.attribute_case.apply(name).into_owned()
    }

    /// The name to emit for a canonical tag name.
    pub fn restore_tag(&self, name: &str) -> String {
        let original = reserved_rename(name, Direction::ToOriginal);

        self.tag_case.apply(&original).into_owned()
    }
}
