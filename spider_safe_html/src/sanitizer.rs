//! Reusable sanitizers and the json entry points.

use crate::configuration::{Configuration, TagRules};
use crate::dom::Fragment;
use crate::error::ConfigWarning;
use crate::filter::TreeFilter;
use crate::normalize::rename_reserved_tags;
use crate::policy::{Mode, Policy, PolicyTable, Preset};
use serde_json::Value;

/// A mode, a normalized policy table and the options to render with.
///
/// Nothing is mutated while sanitizing, so one instance can be built once and
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    mode: Mode,
    policy: PolicyTable,
    configuration: Configuration,
    rules: TagRules,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(Mode::Keep, None, Configuration::default())
    }
}

impl Sanitizer {
    /// A sanitizer from typed parts. Without a policy the preset for the mode
    /// is used.
    pub fn new(mode: Mode, policy: Option<&Policy>, configuration: Configuration) -> Self {
        let policy = PolicyTable::build(policy, Preset::for_mode(mode), &configuration.names());
        let rules = configuration.tag_rules();

        Self {
            mode,
            policy,
            configuration,
            rules,
        }
    }

    /// A sanitizer from loose json values. Problems with either value are
    /// logged, returned and otherwise ignored.
    pub fn from_values(
        mode: Mode,
        policy: Option<&Value>,
        options: Option<&Value>,
    ) -> (Self, Vec<ConfigWarning>) {
        let (configuration, mut warnings) = match options {
            Some(options) => Configuration::from_value(options),
            _ => (Configuration::default(), Vec::new()),
        };

        let policy = match policy {
            Some(policy) => {
                let (policy, policy_warnings) = Policy::from_value(policy);
                warnings.extend(policy_warnings);
                policy
            }
            _ => None,
        };

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        (Self::new(mode, policy.as_ref(), configuration), warnings)
    }

    /// Sanitize a markup string.
    pub fn sanitize(&self, html: &str) -> String {
        if html.is_empty() {
            return String::new();
        }

        let markup = rename_reserved_tags(html);
        let fragment = Fragment::parse(&markup);

        log::trace!("parsed {} nodes", fragment.len());

        self.filter_fragment(&fragment)
    }

    /// Sanitize an already parsed fragment. Reserved tag names are expected to
    /// carry their synthetic names already.
    pub fn filter_fragment(&self, fragment: &Fragment) -> String {
        TreeFilter::new(self.mode, &self.policy, &self.configuration, &self.rules).filter(fragment)
    }

    /// The mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The normalized policy table.
    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// The options.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

/// Keep only the tags and attributes the policy lists. Without a policy the
/// safe formatting preset is used.
pub fn keep_tags(html: &str, policy: Option<&Value>, options: Option<&Value>) -> String {
    Sanitizer::from_values(Mode::Keep, policy, options).0.sanitize(html)
}

/// Remove the tags and attributes the policy lists. Without a policy `code`,
/// `pre`, `script` and `style` are removed.
pub fn remove_tags(html: &str, policy: Option<&Value>, options: Option<&Value>) -> String {
    Sanitizer::from_values(Mode::Remove, policy, options).0.sanitize(html)
}
