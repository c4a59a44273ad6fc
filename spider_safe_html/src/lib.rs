#![warn(missing_docs)]

//! Policy driven HTML sanitizing.
//!
//! Markup is parsed as a fragment with html5ever, flattened into an arena and
//! walked against a tag to attribute policy. In [`Mode::Keep`] the policy is an
//! allow-list, in [`Mode::Remove`] a deny-list.
//!
//! ```
//! use spider_safe_html::{keep_tags, remove_tags};
//! use serde_json::json;
//!
//! assert_eq!(
//!     keep_tags(r#"<p onclick="x()">Hi <b>there</b><script>evil()</script></p>"#, None, None),
//!     "Hi <b>there</b>"
//! );
//!
//! assert_eq!(
//!     remove_tags("<div><code>x=1</code> ok</div>", Some(&json!({ "code": [] })), None),
//!     "<div>x=1 ok</div>"
//! );
//! ```
//!
//! Build a [`Sanitizer`] once to reuse a policy:
//!
//! ```
//! use spider_safe_html::{Configuration, Mode, Policy, Sanitizer};
//!
//! let mut policy = Policy::new();
//! policy
//!     .with_tag("a", ["href"])
//!     .with_tag("p", Vec::<String>::new())
//!     .with_tag("#text", Vec::<String>::new());
//!
//! let mut configuration = Configuration::new();
//! configuration.with_quote('"');
//!
//! let sanitizer = Sanitizer::new(Mode::Keep, Some(&policy), configuration);
//!
//! assert_eq!(
//!     sanitizer.sanitize("<p><a href='/x' style='y'>link</a></p>"),
//!     r#"<p><a href="/x">link</a></p>"#
//! );
//! ```

/// Options and tag lists.
pub mod configuration;
/// Parsed fragment arena.
pub mod dom;
/// Attribute and text escaping.
pub mod encoder;
/// Configuration warnings.
pub mod error;
/// The tree filter.
pub mod filter;
/// Name case folding and reserved tag renaming.
pub mod normalize;
/// Policies and presets.
pub mod policy;
/// Reusable sanitizers.
pub mod sanitizer;
/// Output rendering.
pub mod serializer;

pub use configuration::Configuration;
pub use error::ConfigWarning;
pub use normalize::TextCase;
pub use policy::{AttributeSpec, Mode, Policy, PolicyTable, Preset};
pub use sanitizer::{keep_tags, remove_tags, Sanitizer};
