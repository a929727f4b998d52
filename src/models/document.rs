use crate::page::Page;
use indexmap::IndexMap;
use thiserror::Error;

/// Handle to a node inside one [`Document`] arena.
///
/// Ids are only meaningful for the document that issued them and stay valid
/// for the document's lifetime (removal detaches a node without recycling
/// its id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Element tags whose subtrees must never be rewritten.
///
/// Script and style bodies are not visible text; textarea and input hold
/// live user-editable values.
pub const SKIP_TAGS: [&str; 5] = ["script", "style", "noscript", "textarea", "input"];

/// Traversal decision for an element during an engine sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalPolicy {
    /// Do not rewrite or descend.
    SkipSubtree,
    /// Recurse into children in document order.
    Recurse,
}

/// Table-driven traversal decision for an element tag.
pub fn traversal_policy(tag: &str) -> TraversalPolicy {
    if SKIP_TAGS.iter().any(|s| s.eq_ignore_ascii_case(tag)) {
        TraversalPolicy::SkipSubtree
    } else {
        TraversalPolicy::Recurse
    }
}

/// Errors surfaced by document accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The embedded sub-document belongs to another origin; its content is
    /// not accessible from this document.
    #[error("cross-origin frame content is not accessible")]
    CrossOriginFrame,

    /// A frame accessor was called on a node that is not a frame.
    #[error("node is not a frame")]
    NotAFrame,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
}

#[derive(Debug)]
pub struct FrameData {
    /// The embedded sub-document, when one exists and has been attached.
    content: Option<Page>,
    /// Content belongs to another origin; access is denied.
    cross_origin: bool,
    /// The sub-document has finished loading.
    loaded: bool,
}

/// One node of the document tree.
#[derive(Debug)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// An embedded sub-document (iframe analogue). The engine never descends
    /// into frames; the watcher attaches to their content explicitly.
    Frame(FrameData),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document tree: an arena of element, text and frame nodes.
///
/// `Document` is plain data with no change notification of its own; the
/// observable mutation surface lives in [`Page`](crate::page::Page), which
/// wraps a document and broadcasts mutation records.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Create a document whose root is a `body` element.
    pub fn new() -> Self {
        Self::with_root("body")
    }

    /// Create a document with a custom root element tag.
    pub fn with_root(tag: &str) -> Self {
        let root = NodeData {
            kind: NodeKind::Element(ElementData {
                tag: tag.to_string(),
                attrs: IndexMap::new(),
            }),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push_node(NodeKind::Text(content.to_string()))
    }

    /// Create a detached frame node. A frame created with content is
    /// considered already loaded (cross-origin frames load too; it's the
    /// access that gets denied).
    pub fn create_frame(&mut self, content: Option<Page>, cross_origin: bool) -> NodeId {
        let loaded = content.is_some();
        self.push_node(NodeKind::Frame(FrameData {
            content,
            cross_origin,
            loaded,
        }))
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "node already attached");
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Create an element and attach it in one step.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append(parent, id);
        id
    }

    /// Create a text node and attach it in one step.
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        let id = self.create_text(content);
        self.append(parent, id);
        id
    }

    /// Create a frame node and attach it in one step.
    pub fn append_frame(
        &mut self,
        parent: NodeId,
        content: Option<Page>,
        cross_origin: bool,
    ) -> NodeId {
        let id = self.create_frame(content, cross_origin);
        self.append(parent, id);
        id
    }

    /// Detach a node from its parent. The subtree stays in the arena but is
    /// no longer reachable from the root.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Text of a text node, `None` for elements and frames.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Overwrite the content of a text node. No-op for other node kinds.
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let NodeKind::Text(existing) = &mut self.nodes[id.0].kind {
            *existing = content.to_string();
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(&el.tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => el.attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            el.attrs.shift_remove(name);
        }
    }

    /// Add a token to the space-separated `class` attribute.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let classes = self.attr(id, "class").unwrap_or_default();
        if classes.split_whitespace().any(|c| c == class) {
            return;
        }
        let joined = if classes.is_empty() {
            class.to_string()
        } else {
            format!("{classes} {class}")
        };
        self.set_attr(id, "class", &joined);
    }

    /// Remove a token from the space-separated `class` attribute.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(classes) = self.attr(id, "class") else {
            return;
        };
        let remaining: Vec<&str> = classes.split_whitespace().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr(id, "class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr(id, "class", &joined);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().any(|t| t == class))
            .unwrap_or(false)
    }

    /// Whether the node is an element carrying the given `id` attribute.
    pub fn is_element_with_id(&self, id: NodeId, dom_id: &str) -> bool {
        self.attr(id, "id") == Some(dom_id)
    }

    /// First element in document order carrying the given `id` attribute.
    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.is_element_with_id(*n, dom_id))
    }

    /// All frame nodes under (and including) `root`, in document order.
    pub fn frames(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| matches!(self.kind(*n), NodeKind::Frame(_)))
            .collect()
    }

    /// The subtree rooted at `root`, in document order, including `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Concatenated text of the subtree, in document order.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut out = String::new();
        for id in self.descendants(root) {
            if let NodeKind::Text(content) = self.kind(id) {
                out.push_str(content);
            }
        }
        out
    }

    /// Whether any ancestor element is on the skip list. Direct edits to
    /// text inside such subtrees must not be rewritten even when the edit is
    /// reported at text-node granularity.
    pub fn in_skipped_subtree(&self, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if let NodeKind::Element(el) = self.kind(id) {
                if traversal_policy(&el.tag) == TraversalPolicy::SkipSubtree {
                    return true;
                }
            }
            current = self.parent(id);
        }
        false
    }

    /// Content of a frame node.
    ///
    /// `Err(CrossOriginFrame)` when the frame belongs to another origin,
    /// `Ok(None)` when the frame has no attached sub-document.
    pub fn frame_content(&self, id: NodeId) -> Result<Option<Page>, DocumentError> {
        match &self.nodes[id.0].kind {
            NodeKind::Frame(frame) => {
                if frame.cross_origin {
                    Err(DocumentError::CrossOriginFrame)
                } else {
                    Ok(frame.content.clone())
                }
            }
            _ => Err(DocumentError::NotAFrame),
        }
    }

    /// Whether a frame's sub-document has finished loading.
    pub fn frame_loaded(&self, id: NodeId) -> bool {
        matches!(
            &self.nodes[id.0].kind,
            NodeKind::Frame(FrameData { loaded: true, .. })
        )
    }

    /// Attach content to a frame and/or flip its loaded flag.
    pub fn set_frame_content(&mut self, id: NodeId, content: Option<Page>, loaded: bool) {
        if let NodeKind::Frame(frame) = &mut self.nodes[id.0].kind {
            if content.is_some() {
                frame.content = content;
            }
            frame.loaded = loaded;
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_read() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        let t = doc.append_text(p, "hello");

        assert_eq!(doc.tag(doc.root()), Some("body"));
        assert_eq!(doc.text(t), Some("hello"));
        assert_eq!(doc.parent(t), Some(p));
        assert_eq!(doc.children(doc.root()), &[p]);
        assert_eq!(doc.text_content(doc.root()), "hello");
    }

    #[test]
    fn test_document_order_text() {
        let mut doc = Document::new();
        let a = doc.append_element(doc.root(), "div");
        doc.append_text(a, "one ");
        let b = doc.append_element(a, "span");
        doc.append_text(b, "two ");
        doc.append_text(doc.root(), "three");

        assert_eq!(doc.text_content(doc.root()), "one two three");
    }

    #[test]
    fn test_traversal_policy_table() {
        for tag in SKIP_TAGS {
            assert_eq!(traversal_policy(tag), TraversalPolicy::SkipSubtree);
        }
        assert_eq!(traversal_policy("SCRIPT"), TraversalPolicy::SkipSubtree);
        assert_eq!(traversal_policy("div"), TraversalPolicy::Recurse);
        assert_eq!(traversal_policy("p"), TraversalPolicy::Recurse);
    }

    #[test]
    fn test_detach() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, "gone");

        doc.detach(p);
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.text_content(doc.root()), "");
    }

    #[test]
    fn test_class_tokens() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");

        doc.add_class(p, "alpha");
        doc.add_class(p, "beta");
        doc.add_class(p, "alpha");
        assert_eq!(doc.attr(p, "class"), Some("alpha beta"));

        doc.remove_class(p, "alpha");
        assert_eq!(doc.attr(p, "class"), Some("beta"));
        assert!(doc.has_class(p, "beta"));

        doc.remove_class(p, "beta");
        assert_eq!(doc.attr(p, "class"), None);
    }

    #[test]
    fn test_element_by_id() {
        let mut doc = Document::new();
        let style = doc.append_element(doc.root(), "style");
        doc.set_attr(style, "id", "marker");

        assert_eq!(doc.element_by_id("marker"), Some(style));
        assert_eq!(doc.element_by_id("missing"), None);
    }

    #[test]
    fn test_cross_origin_frame_denied() {
        let mut doc = Document::new();
        let frame = doc.append_frame(doc.root(), None, true);

        assert!(matches!(
            doc.frame_content(frame),
            Err(DocumentError::CrossOriginFrame)
        ));
    }

    #[test]
    fn test_frame_accessor_on_element() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        assert!(matches!(doc.frame_content(p), Err(DocumentError::NotAFrame)));
    }
}
