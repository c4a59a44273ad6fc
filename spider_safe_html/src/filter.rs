//! The tree filter.
//!
//! Walks a `Fragment` with an explicit work stack, consults the policy for
//! every node and writes the sanitized markup into a buffer. Elements that may
//! be suppressed when empty record where they started so they can be rolled
//! back once their children are known.
//!
//! Table structure is only written where the html parser accepts it again:
//! table parts outside a matching live container are unwrapped, and content
//! left directly inside table structure is written in front of its table.

use crate::configuration::{Configuration, TagRules};
use crate::dom::{Element, Fragment, Node, NodeId};
use crate::normalize::{NameNormalizer, COMMENT_KEY, TEXT_KEY, WILDCARD};
use crate::policy::{Mode, PolicyTable};
use crate::serializer::Serializer;

/// What happens to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    /// Emit the tag, live or escaped, with the joined attributes.
    Retain {
        attributes: String,
        escaped: bool,
        suppress_empty: bool,
    },
    /// Drop the tag and its attributes, keep the filtered children.
    Unwrap,
    /// Drop the element with everything under it.
    Discard,
}

/// Table elements the parser only accepts inside specific parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TablePart {
    Table,
    Caption,
    ColumnGroup,
    Column,
    Section,
    Row,
    Cell,
}

const TABLE_PARTS: [(&str, TablePart); 10] = [
    ("table", TablePart::Table),
    ("caption", TablePart::Caption),
    ("colgroup", TablePart::ColumnGroup),
    ("col", TablePart::Column),
    ("tbody", TablePart::Section),
    ("thead", TablePart::Section),
    ("tfoot", TablePart::Section),
    ("tr", TablePart::Row),
    ("td", TablePart::Cell),
    ("th", TablePart::Cell),
];

impl TablePart {
    /// The part named by a canonical tag.
    fn of(tag: &str) -> Option<TablePart> {
        TABLE_PARTS
            .iter()
            .find(|(name, _)| tag.eq_ignore_ascii_case(name))
            .map(|(_, part)| *part)
    }

    /// Only table parts may be written directly inside.
    fn is_structural(self) -> bool {
        matches!(
            self,
            TablePart::Table | TablePart::ColumnGroup | TablePart::Section | TablePart::Row
        )
    }

    /// The part may be written inside the nearest live ancestor.
    fn fits(self, parent: Option<TablePart>) -> bool {
        match self {
            TablePart::Table => !parent.is_some_and(TablePart::is_structural),
            TablePart::Caption | TablePart::ColumnGroup | TablePart::Section => {
                parent == Some(TablePart::Table)
            }
            TablePart::Column => {
                matches!(parent, Some(TablePart::Table | TablePart::ColumnGroup))
            }
            TablePart::Row => matches!(parent, Some(TablePart::Table | TablePart::Section)),
            TablePart::Cell => matches!(
                parent,
                Some(TablePart::Table | TablePart::Section | TablePart::Row)
            ),
        }
    }
}

/// Whitespace the parser leaves inside table structure.
fn is_table_whitespace(text: &str) -> bool {
    text.chars()
        .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'))
}

/// An element whose closing tag is still pending.
#[derive(Debug)]
struct Frame {
    tag: String,
    escaped: bool,
    /// Output length before the opening tag.
    start: usize,
    /// Output length after the opening tag.
    content_start: usize,
    /// Roll the element back if no content follows the opening tag.
    suppress_if_empty: bool,
    /// A live table holding content to write in front of it.
    table: bool,
}

#[derive(Debug)]
enum Step {
    Enter(NodeId),
    Leave(Frame),
    /// Move the node rendered since the matching `begin_foster` in front of
    /// its table.
    EndFoster,
}

/// Output buffers and the live ancestry of the node being written.
#[derive(Debug)]
struct Writer {
    /// The output, then one buffer per node moved out of table structure.
    buffers: Vec<String>,
    /// Table part of every live ancestor, innermost last. `None` for other
    /// elements and for content moved out of a table.
    ancestry: Vec<Option<TablePart>>,
    /// Content to write in front of each open live table.
    fostered: Vec<String>,
}

impl Writer {
    fn new() -> Self {
        Self {
            buffers: vec![String::new()],
            ancestry: Vec::new(),
            fostered: Vec::new(),
        }
    }

    fn buffer(&mut self) -> &mut String {
        if self.buffers.is_empty() {
            self.buffers.push(String::new());
        }
        let last = self.buffers.len() - 1;
        &mut self.buffers[last]
    }

    fn parent(&self) -> Option<TablePart> {
        self.ancestry.last().copied().flatten()
    }

    fn in_table_structure(&self) -> bool {
        self.parent().is_some_and(TablePart::is_structural)
    }

    fn begin_foster(&mut self) {
        self.buffers.push(String::new());
        self.ancestry.push(None);
    }

    fn end_foster(&mut self) {
        self.ancestry.pop();
        let content = self.buffers.pop().unwrap_or_default();

        match self.fostered.last_mut() {
            Some(fostered) => fostered.push_str(&content),
            _ => self.buffer().push_str(&content),
        }
    }

    /// Write text, moving it in front of the table when it may not stay in
    /// table structure.
    fn write_text(&mut self, text: &str) {
        if self.in_table_structure() && !is_table_whitespace(text) {
            self.begin_foster();
            self.buffer().push_str(text);
            self.end_foster();
        } else {
            self.buffer().push_str(text);
        }
    }

    fn finish(self) -> String {
        self.buffers.concat()
    }
}

/// Applies a policy table to parsed fragments.
#[derive(Debug, Clone)]
pub struct TreeFilter<'a> {
    mode: Mode,
    policy: &'a PolicyTable,
    configuration: &'a Configuration,
    rules: &'a TagRules,
    names: NameNormalizer,
    serializer: Serializer<'a>,
    text_key: String,
    comment_key: String,
}

impl<'a> TreeFilter<'a> {
    /// A filter over a normalized policy and the canonical tag rules of the
    /// same configuration.
    pub fn new(
        mode: Mode,
        policy: &'a PolicyTable,
        configuration: &'a Configuration,
        rules: &'a TagRules,
    ) -> Self {
        let names = configuration.names();

        Self {
            mode,
            policy,
            configuration,
            rules,
            names,
            serializer: Serializer::new(configuration, rules),
            text_key: names.normalize_tag(TEXT_KEY),
            comment_key: names.normalize_tag(COMMENT_KEY),
        }
    }

    /// Sanitize every top level node of the fragment.
    pub fn filter(&self, fragment: &Fragment) -> String {
        self.filter_nodes(fragment, fragment.roots())
    }

    /// Sanitize the given nodes and their descendants, in order.
    pub fn filter_nodes(&self, fragment: &Fragment, nodes: &[NodeId]) -> String {
        let mut writer = Writer::new();
        let mut stack: Vec<Step> = nodes.iter().rev().map(|id| Step::Enter(*id)).collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => match fragment.get(id) {
                    Some(Node::Text(text)) => {
                        if self.keep_text() {
                            writer.write_text(&self.serializer.text(text));
                        }
                    }
                    Some(Node::Comment(comment)) => {
                        if self.keep_comment() {
                            let encode = self.configuration.entities_encode;
                            let comment = self.serializer.comment(comment, encode);

                            if encode {
                                writer.write_text(&comment);
                            } else {
                                writer.buffer().push_str(&comment);
                            }
                        }
                    }
                    Some(Node::Element(element)) => {
                        let tag = self.names.normalize_tag(&element.name);
                        let part = TablePart::of(&tag);
                        let parent = writer.parent();

                        let decision = match self.decide(&tag, element) {
                            Decision::Retain { escaped: false, .. }
                                if part.is_some_and(|part| {
                                    part != TablePart::Table && !part.fits(parent)
                                }) =>
                            {
                                log::trace!("unwrapped <{}> outside its table", element.name);
                                Decision::Unwrap
                            }
                            decision => decision,
                        };

                        match decision {
                            Decision::Retain {
                                attributes,
                                escaped,
                                suppress_empty,
                            } => {
                                let fits = !escaped && part.is_some_and(|part| part.fits(parent));

                                if writer.in_table_structure() && !fits {
                                    writer.begin_foster();
                                    stack.push(Step::EndFoster);
                                }

                                let open = self.serializer.open_tag(&tag, &attributes, escaped);
                                let buffer = writer.buffer();
                                let start = buffer.len();
                                buffer.push_str(&open);
                                let content_start = buffer.len();

                                let suppress_if_empty = suppress_empty
                                    && attributes.is_empty()
                                    && !self.rules.allows_empty(&tag);
                                let table = !escaped && part == Some(TablePart::Table);

                                if !escaped {
                                    writer.ancestry.push(part);
                                }
                                if table {
                                    writer.fostered.push(String::new());
                                }

                                stack.push(Step::Leave(Frame {
                                    tag,
                                    escaped,
                                    start,
                                    content_start,
                                    suppress_if_empty,
                                    table,
                                }));
                                stack.extend(element.children.iter().rev().map(|id| Step::Enter(*id)));
                            }
                            Decision::Unwrap => {
                                stack.extend(element.children.iter().rev().map(|id| Step::Enter(*id)));
                            }
                            Decision::Discard => {
                                log::trace!("discarded <{}> with its content", element.name);
                            }
                        }
                    }
                    None => (),
                },
                Step::Leave(frame) => {
                    if !frame.escaped {
                        writer.ancestry.pop();
                    }

                    let fostered = if frame.table {
                        writer.fostered.pop()
                    } else {
                        None
                    };

                    let buffer = writer.buffer();

                    if frame.suppress_if_empty && buffer.len() == frame.content_start {
                        log::trace!("suppressed empty <{}>", frame.tag);
                        buffer.truncate(frame.start);
                    } else if let Some(close) = self.serializer.close_tag(&frame.tag, frame.escaped) {
                        buffer.push_str(&close);
                    }

                    if let Some(fostered) = fostered.filter(|fostered| !fostered.is_empty()) {
                        let table = buffer.split_off(frame.start);
                        buffer.push_str(&fostered);
                        buffer.push_str(&table);
                    }
                }
                Step::EndFoster => writer.end_foster(),
            }
        }

        writer.finish()
    }

    fn keep_text(&self) -> bool {
        match self.mode {
            Mode::Keep => self.keeps_special(&self.text_key),
            Mode::Remove => !self.removes_special(&self.text_key),
        }
    }

    fn keep_comment(&self) -> bool {
        match self.mode {
            Mode::Keep => self.keeps_special(&self.comment_key),
            Mode::Remove => !self.removes_special(&self.comment_key),
        }
    }

    /// Keep mode renders a special node when its key or a `*` entry is
    /// listed, or when entities are encoded.
    fn keeps_special(&self, key: &str) -> bool {
        self.configuration.entities_encode
            || self.policy.lookup_special(key).is_some()
            || self.policy.contains_tag(WILDCARD)
    }

    /// Remove mode drops a special node listed with no attributes, unless
    /// entities are encoded.
    fn removes_special(&self, key: &str) -> bool {
        !self.configuration.entities_encode
            && self
                .policy
                .lookup_special(key)
                .is_some_and(|attributes| attributes.is_empty())
    }

    fn decide(&self, tag: &str, element: &Element) -> Decision {
        let encode = self.configuration.entities_encode;

        match self.mode {
            Mode::Keep => match self.policy.lookup(tag) {
                Some(allowed) => Decision::Retain {
                    attributes: self.join_attributes(element, |name| allowed.contains(name), false),
                    escaped: false,
                    suppress_empty: true,
                },
                None if encode => self.escape(element, self.configuration.keep_attributes),
                None if self.rules.is_clean_content(tag) => Decision::Discard,
                None => Decision::Unwrap,
            },
            Mode::Remove => match self.policy.lookup(tag) {
                None => Decision::Retain {
                    attributes: self.join_attributes(element, |_| true, false),
                    escaped: false,
                    suppress_empty: false,
                },
                Some(denied) if denied.is_empty() => {
                    if encode {
                        self.escape(element, true)
                    } else if self.rules.is_clean_content(tag) {
                        Decision::Discard
                    } else {
                        Decision::Unwrap
                    }
                }
                Some(denied) => Decision::Retain {
                    attributes: self.join_attributes(element, |name| !denied.contains(name), false),
                    escaped: false,
                    suppress_empty: false,
                },
            },
        }
    }

    /// Render a rejected element as escaped text.
    fn escape(&self, element: &Element, keep_attributes: bool) -> Decision {
        Decision::Retain {
            attributes: self.join_attributes(element, |_| keep_attributes, true),
            escaped: true,
            suppress_empty: false,
        }
    }

    fn join_attributes<F>(&self, element: &Element, keep: F, escaped: bool) -> String
    where
        F: Fn(&str) -> bool,
    {
        let attributes: Vec<(String, &str)> = element
            .attrs
            .iter()
            .map(|(name, value)| (self.names.normalize_attribute(name), value.as_str()))
            .filter(|(name, _)| keep(name))
            .collect();

        self.serializer.attributes(
            attributes.iter().map(|(name, value)| (name.as_str(), *value)),
            escaped,
        )
    }
}
