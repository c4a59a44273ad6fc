//! Arena of parsed nodes.
//!
//! html5ever builds an `RcDom`; it is flattened here into a `Vec` of nodes
//! addressed by `NodeId` so the filter can walk it with an explicit stack.

use html5ever::driver::ParseOpts;
use html5ever::parse_fragment;
use tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{Attribute, QualName};
use markup5ever::{local_name, namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Index of a node in its fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name as produced by the parser.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes in source order.
    pub children: Vec<NodeId>,
}

impl Element {
    /// A childless element.
    pub fn new(name: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            attrs,
            children: Vec::new(),
        }
    }

    fn from_parsed(name: &QualName, attrs: &[Attribute]) -> Self {
        let attrs = attrs
            .iter()
            .map(|attr| {
                let name = match attr.name.prefix {
                    Some(ref prefix) => format!("{}:{}", prefix, attr.name.local),
                    _ => attr.name.local.to_string(),
                };
                (name, attr.value.to_string())
            })
            .collect();

        Self::new(name.local.to_string(), attrs)
    }
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element(Element),
    /// Entity decoded text.
    Text(String),
    /// Comment content without the delimiters.
    Comment(String),
}

/// A parsed HTML fragment.
///
/// A child is always pushed after its parent, so child ids are greater than
/// their parent's id and the tree cannot contain cycles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Fragment {
    /// An empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse markup as a fragment in a `<body>` context. Scripting is off and
    /// nothing referenced by the markup is fetched.
    pub fn parse(markup: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let dom = parse_fragment(
            RcDom::default(),
            opts,
            QualName::new(None, ns!(html), local_name!("body")),
            Vec::new(),
        )
        .one(markup);

        // fragment parsing wraps the content in a single <html> element
        let document = dom.document.children.borrow();
        let html = document
            .iter()
            .find(|child| matches!(child.data, NodeData::Element { .. }));

        let roots = match html {
            Some(html) => html.children.borrow().clone(),
            _ => document.clone(),
        };

        Self::from_handles(&roots)
    }

    /// Flatten rcdom handles without recursion.
    fn from_handles(roots: &[Handle]) -> Self {
        let mut fragment = Fragment::new();
        let mut stack: Vec<(Handle, Option<NodeId>)> = roots
            .iter()
            .rev()
            .map(|handle| (handle.clone(), None))
            .collect();

        while let Some((handle, parent)) = stack.pop() {
            match handle.data {
                NodeData::Element {
                    ref name,
                    ref attrs,
                    ref template_contents,
                    ..
                } => {
                    let id = fragment.append(
                        parent,
                        Node::Element(Element::from_parsed(name, &attrs.borrow())),
                    );

                    let mut children = handle.children.borrow().clone();

                    if let Some(ref contents) = *template_contents.borrow() {
                        children.extend(contents.children.borrow().iter().cloned());
                    }

                    stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
                }
                NodeData::Text { ref contents } => {
                    fragment.append(parent, Node::Text(contents.borrow().to_string()));
                }
                NodeData::Comment { ref contents } => {
                    fragment.append(parent, Node::Comment(contents.to_string()));
                }
                NodeData::Document
                | NodeData::Doctype { .. }
                | NodeData::ProcessingInstruction { .. } => (),
            }
        }

        fragment
    }

    /// Append a node under `parent`, or at the top level when `parent` is
    /// `None` or not an element.
    pub fn append(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);

        match parent.and_then(|parent| self.nodes.get_mut(parent.0)) {
            Some(Node::Element(element)) => element.children.push(id),
            _ => self.roots.push(id),
        }

        id
    }

    /// The node behind an id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Top level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of a node. Empty for text and comments.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(Node::Element(element)) => &element.children,
            _ => &[],
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// No nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element<'a>(fragment: &'a Fragment, id: NodeId) -> &'a Element {
        match fragment.get(id) {
            Some(Node::Element(element)) => element,
            other => panic!("expected an element, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fragment() {
        let fragment = Fragment::parse(r#"<p class="a" id="b">Hi <b>there</b></p><!-- note -->tail"#);

        assert_eq!(fragment.roots().len(), 3);

        let p = element(&fragment, fragment.roots()[0]);
        assert_eq!(p.name, "p");
        assert_eq!(
            p.attrs,
            vec![
                ("class".to_string(), "a".to_string()),
                ("id".to_string(), "b".to_string())
            ]
        );
        assert_eq!(p.children.len(), 2);
        assert_eq!(
            fragment.get(p.children[0]),
            Some(&Node::Text("Hi ".into()))
        );
        assert_eq!(element(&fragment, p.children[1]).name, "b");

        assert_eq!(
            fragment.get(fragment.roots()[1]),
            Some(&Node::Comment(" note ".into()))
        );
        assert_eq!(
            fragment.get(fragment.roots()[2]),
            Some(&Node::Text("tail".into()))
        );
    }

    #[test]
    fn test_parse_decodes_entities() {
        let fragment = Fragment::parse(r#"<a title="x &amp; y">1 &lt; 2</a>"#);
        let a = element(&fragment, fragment.roots()[0]);

        assert_eq!(a.attrs[0].1, "x & y");
        assert_eq!(fragment.get(a.children[0]), Some(&Node::Text("1 < 2".into())));
    }

    #[test]
    fn test_parse_unknown_reserved_names_are_plain_elements() {
        let fragment = Fragment::parse("<safe_html_script>a<b>c</b></safe_html_script>");
        let script = element(&fragment, fragment.roots()[0]);

        assert_eq!(script.name, "safe_html_script");
        assert_eq!(script.children.len(), 2);
    }

    #[test]
    fn test_template_contents_are_children() {
        let fragment = Fragment::parse("<template><b>x</b></template>");
        let template = element(&fragment, fragment.roots()[0]);

        assert_eq!(template.children.len(), 1);
        assert_eq!(element(&fragment, template.children[0]).name, "b");
    }

    #[test]
    fn test_append() {
        let mut fragment = Fragment::new();
        let div = fragment.append(None, Node::Element(Element::new("div", vec![])));
        let text = fragment.append(Some(div), Node::Text("x".into()));
        let orphan = fragment.append(Some(text), Node::Text("y".into()));

        assert_eq!(fragment.roots(), &[div, orphan]);
        assert_eq!(fragment.children(div), &[text]);
        assert!(fragment.children(text).is_empty());
        assert!(text > div);
        assert_eq!(fragment.len(), 3);
    }
}
