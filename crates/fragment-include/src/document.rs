//! Parsed HTML document with placeholder discovery and in-place substitution.
//!
//! Parsing and serialization go through `scraper` (html5ever). Mutation works
//! directly on the underlying `ego_tree` arena, which keeps node ids stable
//! while siblings are inserted and detached.

use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, QualName};
use scraper::{ElementRef, Html, HtmlTreeSink, Node};

use crate::types::{IncludeError, IncludeResult, Placeholder};

/// A parsed HTML document that placeholders can be substituted into.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a complete HTML document.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Snapshot every element carrying `attribute`, in document order.
    ///
    /// Elements inserted after this call are not part of the returned set.
    pub fn placeholders(&self, attribute: &str) -> Vec<Placeholder> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter_map(|el| {
                el.value()
                    .attr(attribute)
                    .map(|locator| (el.id(), locator.to_string()))
            })
            .enumerate()
            .map(|(index, (node, locator))| Placeholder {
                node,
                locator,
                index,
            })
            .collect()
    }

    /// Replace the placeholder with the root-level nodes of `fragment`.
    ///
    /// The fragment is parsed with the placeholder's parent element as
    /// context, so a `<tr>` fragment under `<tbody>` stays a row. At the top
    /// of the tree `<body>` is used. All nodes are grafted in front of the
    /// placeholder and the placeholder is then detached, in one synchronous
    /// step. Returns the number of root-level nodes inserted.
    ///
    /// Only a parent is required, not reachability from the root: a
    /// placeholder inside an already-replaced placeholder is still
    /// substituted, into the detached subtree. Use [`Document::contains`] to
    /// tell the two apart.
    pub fn substitute(
        &mut self,
        placeholder: &Placeholder,
        fragment: &str,
    ) -> IncludeResult<usize> {
        let context = self
            .html
            .tree
            .get(placeholder.node)
            .and_then(|node| node.parent())
            .map(|parent| match parent.value() {
                Node::Element(el) => el.name.clone(),
                _ => body_context(),
            })
            .ok_or(IncludeError::Detached)?;

        let parsed = parse_in_context(context, fragment);
        let mut inserted = 0;
        for child in parsed.root_element().children() {
            graft_before(&mut self.html.tree, placeholder.node, child)?;
            inserted += 1;
        }

        if let Some(mut node) = self.html.tree.get_mut(placeholder.node) {
            node.detach();
        }

        tracing::trace!(
            locator = %placeholder.locator,
            nodes = inserted,
            "substituted placeholder"
        );
        Ok(inserted)
    }

    /// Value of the first `<base href>` in the document, if any.
    pub fn base_href(&self) -> Option<&str> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "base" && el.value().attr("href").is_some())
            .and_then(|el| el.value().attr("href"))
    }

    /// Serialized markup of a placeholder element, if it is still an element.
    pub fn outer_html(&self, placeholder: &Placeholder) -> Option<String> {
        self.html
            .tree
            .get(placeholder.node)
            .and_then(ElementRef::wrap)
            .map(|el| el.html())
    }

    /// Whether the placeholder node is still reachable from the document root.
    pub fn contains(&self, placeholder: &Placeholder) -> bool {
        let root = self.html.tree.root().id();
        self.html
            .tree
            .get(placeholder.node)
            .is_some_and(|node| node.ancestors().any(|a| a.id() == root))
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        self.html.html()
    }
}

fn body_context() -> QualName {
    QualName::new(None, ns!(html), local_name!("body"))
}

/// Run the HTML fragment parsing algorithm with `context` as the context element.
fn parse_in_context(context: QualName, fragment: &str) -> Html {
    html5ever::driver::parse_fragment(
        HtmlTreeSink::new(Html::new_fragment()),
        ParseOpts::default(),
        context,
        Vec::new(),
    )
    .one(fragment)
}

/// Deep-copy `source` into `tree` as the previous sibling of `anchor`.
fn graft_before(
    tree: &mut Tree<Node>,
    anchor: NodeId,
    source: NodeRef<'_, Node>,
) -> IncludeResult<()> {
    let mut anchor = tree.get_mut(anchor).ok_or(IncludeError::Detached)?;
    let copy = anchor.insert_before(source.value().clone()).id();
    append_children(tree, copy, source);
    Ok(())
}

fn append_children(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let Some(mut parent_mut) = tree.get_mut(parent) else {
            return;
        };
        let copy = parent_mut.append(child.value().clone()).id();
        append_children(tree, copy, child);
    }
}
