// Live document handle
//
// Wraps a Document with thread-safe access via Arc<RwLock<T>> and broadcasts
// mutation records so watchers can react to changes without polling.

use crate::models::{Document, NodeId};
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Buffer size for the mutation broadcast channel. A lagged receiver drops
/// old records; the rescan pass covers anything missed that way.
const MUTATION_CHANNEL_CAPACITY: usize = 256;

/// One observable change to a page's document.
///
/// Mirrors the granularity of child-list and character-data observation:
/// attribute edits (including class toggles) intentionally emit no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRecord {
    /// A subtree rooted at `node` was attached under `parent`.
    ChildAdded { parent: NodeId, node: NodeId },

    /// The subtree rooted at `node` was detached from `parent`.
    ChildRemoved { parent: NodeId, node: NodeId },

    /// The content of text node `node` changed.
    CharacterData { node: NodeId },

    /// The sub-document of frame `node` finished loading.
    FrameLoaded { node: NodeId },
}

/// Shared handle to a live document.
///
/// All mutations go through `Page` methods, which apply the change under the
/// write lock and then broadcast a [`MutationRecord`]. Cloning shares the
/// underlying document and channel.
///
/// Every unit of engine work holds the write lock for its full duration, so
/// two sweeps never interleave and their counts never mix.
#[derive(Clone)]
pub struct Page {
    doc: Arc<RwLock<Document>>,
    mutation_tx: broadcast::Sender<MutationRecord>,
}

impl Page {
    /// Create a page over a fresh `body`-rooted document.
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    /// Wrap an already-built document.
    pub fn from_document(doc: Document) -> Self {
        let (mutation_tx, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            doc: Arc::new(RwLock::new(doc)),
            mutation_tx,
        }
    }

    /// Identity token for this page's underlying document, stable across
    /// clones. Used to attach to a sub-document at most once.
    pub fn token(&self) -> usize {
        Arc::as_ptr(&self.doc) as usize
    }

    /// Subscribe to mutation records. Only records sent after subscription
    /// are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<MutationRecord> {
        self.mutation_tx.subscribe()
    }

    /// Execute a function with read access to the document.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let doc = self.doc.read().unwrap();
        f(&doc)
    }

    /// Execute a function with write access to the document, without
    /// emitting records.
    ///
    /// Edits made here are invisible to mutation subscribers; only a
    /// periodic rescan reconciles them. Engine sweeps also run through this
    /// and report their rewrites via
    /// [`notify_text_rewritten`](Self::notify_text_rewritten).
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Document) -> R,
    {
        let mut doc = self.doc.write().unwrap();
        f(&mut doc)
    }

    pub fn root(&self) -> NodeId {
        self.read(|doc| doc.root())
    }

    fn emit(&self, record: MutationRecord) {
        // It's OK if no one is listening
        let _ = self.mutation_tx.send(record);
    }

    /// Append a new element and broadcast the addition.
    pub fn append_element(&self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.update(|doc| doc.append_element(parent, tag));
        self.emit(MutationRecord::ChildAdded { parent, node });
        node
    }

    /// Append a new text node and broadcast the addition.
    pub fn append_text(&self, parent: NodeId, content: &str) -> NodeId {
        let node = self.update(|doc| doc.append_text(parent, content));
        self.emit(MutationRecord::ChildAdded { parent, node });
        node
    }

    /// Append a new frame node and broadcast the addition.
    pub fn append_frame(&self, parent: NodeId, content: Option<Page>, cross_origin: bool) -> NodeId {
        let node = self.update(|doc| doc.append_frame(parent, content, cross_origin));
        self.emit(MutationRecord::ChildAdded { parent, node });
        node
    }

    /// Build a detached subtree and attach it in one observable step: the
    /// closure assembles nodes, the returned root is appended under `parent`
    /// and a single `ChildAdded` record is broadcast for the whole subtree.
    pub fn append_subtree<F>(&self, parent: NodeId, build: F) -> NodeId
    where
        F: FnOnce(&mut Document) -> NodeId,
    {
        let node = self.update(|doc| {
            let root = build(doc);
            doc.append(parent, root);
            root
        });
        self.emit(MutationRecord::ChildAdded { parent, node });
        node
    }

    /// Overwrite a text node's content and broadcast the edit.
    pub fn set_text(&self, node: NodeId, content: &str) {
        self.update(|doc| doc.set_text(node, content));
        self.emit(MutationRecord::CharacterData { node });
    }

    /// Detach a node and broadcast the removal.
    pub fn remove_child(&self, node: NodeId) {
        let parent = self.update(|doc| {
            let parent = doc.parent(node);
            doc.detach(node);
            parent
        });
        if let Some(parent) = parent {
            self.emit(MutationRecord::ChildRemoved { parent, node });
        }
    }

    /// Set an attribute. Attribute edits emit no mutation record.
    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.update(|doc| doc.set_attr(node, name, value));
    }

    /// Add a class token. Emits no mutation record.
    pub fn add_class(&self, node: NodeId, class: &str) {
        self.update(|doc| doc.add_class(node, class));
    }

    /// Remove a class token. Emits no mutation record.
    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.update(|doc| doc.remove_class(node, class));
    }

    /// Attach a finished sub-document to a frame and broadcast the load
    /// event. Models a frame whose content becomes available only after the
    /// frame node itself was inserted.
    pub fn attach_frame_content(&self, node: NodeId, content: Page) {
        self.update(|doc| doc.set_frame_content(node, Some(content), true));
        self.emit(MutationRecord::FrameLoaded { node });
    }

    /// Broadcast character-data records for text nodes an engine sweep has
    /// already rewritten in place.
    pub(crate) fn notify_text_rewritten(&self, nodes: &[NodeId]) {
        for node in nodes {
            self.emit(MutationRecord::CharacterData { node: *node });
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("token", &self.token())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_broadcasts_child_added() {
        let page = Page::new();
        let mut rx = page.subscribe();

        let root = page.root();
        let p = page.append_element(root, "p");

        assert_eq!(
            rx.try_recv().unwrap(),
            MutationRecord::ChildAdded {
                parent: root,
                node: p
            }
        );
    }

    #[test]
    fn test_set_text_broadcasts_character_data() {
        let page = Page::new();
        let t = page.append_text(page.root(), "before");
        let mut rx = page.subscribe();

        page.set_text(t, "after");

        assert_eq!(rx.try_recv().unwrap(), MutationRecord::CharacterData { node: t });
        assert_eq!(page.read(|doc| doc.text(t).unwrap().to_string()), "after");
    }

    #[test]
    fn test_attribute_edits_emit_no_record() {
        let page = Page::new();
        let p = page.append_element(page.root(), "p");
        let mut rx = page.subscribe();

        page.set_attr(p, "id", "x");
        page.add_class(p, "marked");
        page.remove_class(p, "marked");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_append_subtree_single_record() {
        let page = Page::new();
        let mut rx = page.subscribe();

        let root = page.root();
        let div = page.append_subtree(root, |doc| {
            let div = doc.create_element("div");
            let p = doc.create_element("p");
            doc.append(div, p);
            doc.append_text(p, "nested");
            div
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            MutationRecord::ChildAdded {
                parent: root,
                node: div
            }
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(page.read(|doc| doc.text_content(div)), "nested");
    }

    #[test]
    fn test_remove_child_broadcasts() {
        let page = Page::new();
        let root = page.root();
        let p = page.append_element(root, "p");
        let mut rx = page.subscribe();

        page.remove_child(p);

        assert_eq!(
            rx.try_recv().unwrap(),
            MutationRecord::ChildRemoved {
                parent: root,
                node: p
            }
        );
    }

    #[test]
    fn test_frame_load_broadcasts() {
        let page = Page::new();
        let frame = page.append_frame(page.root(), None, false);
        let mut rx = page.subscribe();

        page.attach_frame_content(frame, Page::new());

        assert_eq!(rx.try_recv().unwrap(), MutationRecord::FrameLoaded { node: frame });
        assert!(page.read(|doc| doc.frame_loaded(frame)));
    }

    #[test]
    fn test_clones_share_document() {
        let page = Page::new();
        let clone = page.clone();

        let t = page.append_text(page.root(), "shared");
        assert_eq!(clone.read(|doc| doc.text(t).unwrap().to_string()), "shared");
        assert_eq!(page.token(), clone.token());
    }
}
