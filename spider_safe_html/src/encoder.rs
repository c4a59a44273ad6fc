//! Attribute and text escaping.

use crate::normalize::TextCase;
use std::borrow::Cow;

/// Escape `&`, `<` and `>` so text can never open markup.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

/// Renders `name=value` pairs against the configured quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeEncoder {
    quote: char,
    value_case: TextCase,
}

impl Default for AttributeEncoder {
    fn default() -> Self {
        Self::new('\'', TextCase::None)
    }
}

impl AttributeEncoder {
    /// A new encoder.
    pub fn new(quote: char, value_case: TextCase) -> Self {
        Self { quote, value_case }
    }

    /// Escape a value: the quote becomes a numeric character reference and
    /// `&`, `<`, `>` become named entities.
    pub fn escape_value(&self, value: &str) -> String {
        let value = self.value_case.apply(value);
        let mut escaped = String::with_capacity(value.len());

        for c in value.chars() {
            if c == self.quote {
                escaped.push_str(&format!("&#{};", c as u32));
            } else {
                match c {
                    '&' => escaped.push_str("&amp;"),
                    '<' => escaped.push_str("&lt;"),
                    '>' => escaped.push_str("&gt;"),
                    _ => escaped.push(c),
                }
            }
        }

        escaped
    }

    /// ` name` for a value-less attribute, ` name=QvalueQ` otherwise.
    pub fn join_attribute(&self, name: &str, value: &str) -> String {
        if value.is_empty() {
            format!(" {name}")
        } else {
            format!(
                " {name}={quote}{value}{quote}",
                quote = self.quote,
                value = self.escape_value(value)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert!(matches!(escape_text("plain 'text'"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_join_attribute() {
        let encoder = AttributeEncoder::default();

        assert_eq!(encoder.join_attribute("disabled", ""), " disabled");
        assert_eq!(encoder.join_attribute("href", "/a?b=1&c=2"), " href='/a?b=1&amp;c=2'");
        assert_eq!(encoder.join_attribute("title", "it's"), " title='it&#39;s'");
        assert_eq!(
            encoder.join_attribute("title", r#"say "hi""#),
            r#" title='say "hi"'"#
        );
    }

    #[test]
    fn test_double_quote() {
        let encoder = AttributeEncoder::new('"', TextCase::None);

        assert_eq!(
            encoder.join_attribute("title", r#"say "hi" it's"#),
            r#" title="say &#34;hi&#34; it's""#
        );
    }

    #[test]
    fn test_value_case_and_markup() {
        let encoder = AttributeEncoder::new('\'', TextCase::Uppercase);

        assert_eq!(
            encoder.join_attribute("title", "<script>'x'"),
            " title='&lt;SCRIPT&gt;&#39;X&#39;'"
        );
    }

    #[test]
    fn test_no_unescaped_quote() {
        let encoder = AttributeEncoder::default();
        let value = "''a'b''";
        let joined = encoder.join_attribute("x", value);
        let inner = &joined[4..joined.len() - 1];

        assert!(!inner.contains('\''));
    }
}
