use crate::models::NodeId;
use crate::page::Page;
use std::time::Duration;

/// `id` attribute of the injected stylesheet element. The watcher ignores
/// mutation records targeting this element to avoid feeding on its own
/// injection.
pub const STYLE_ELEMENT_ID: &str = "truename-style";

/// Class token applied to elements whose text was rewritten.
pub const HIGHLIGHT_CLASS: &str = "truename-highlight";

/// How long a highlight mark stays on an element before auto-reverting.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(2);

/// Fade-out animation backing the highlight class.
const HIGHLIGHT_STYLESHEET: &str = "\
@keyframes truename-highlight-fade {
  0% { background-color: rgba(138, 43, 226, 0.3); }
  100% { background-color: transparent; }
}
.truename-highlight {
  animation: truename-highlight-fade 2s ease-out forwards;
}";

/// Transient visual marking of rewritten elements.
///
/// Marking is purely cosmetic: a class token that auto-reverts after
/// [`HIGHLIGHT_DURATION`], backed by a stylesheet injected at most once per
/// page. Class edits emit no mutation records; the stylesheet insertion does,
/// which is why it carries [`STYLE_ELEMENT_ID`].
#[derive(Debug, Clone)]
pub struct Highlighter {
    page: Page,
}

impl Highlighter {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Mark the parent elements of rewritten text nodes.
    ///
    /// Must run inside a tokio runtime; the revert is a spawned delayed task
    /// that outlives any watcher disconnect (an in-flight cosmetic revert is
    /// allowed to complete).
    pub fn mark_rewritten(&self, nodes: &[NodeId]) {
        let mut parents: Vec<NodeId> = Vec::new();
        for node in nodes {
            if let Some(parent) = self.page.read(|doc| doc.parent(*node)) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }

        for parent in parents {
            self.mark(parent);
        }
    }

    /// Mark a single element and schedule its auto-revert.
    pub fn mark(&self, element: NodeId) {
        self.ensure_stylesheet();
        self.page.add_class(element, HIGHLIGHT_CLASS);

        let page = self.page.clone();
        tokio::spawn(async move {
            tokio::time::sleep(HIGHLIGHT_DURATION).await;
            page.remove_class(element, HIGHLIGHT_CLASS);
        });
    }

    /// Inject the highlight stylesheet if this page doesn't carry it yet.
    fn ensure_stylesheet(&self) {
        let already_present = self
            .page
            .read(|doc| doc.element_by_id(STYLE_ELEMENT_ID).is_some());
        if already_present {
            return;
        }

        let root = self.page.root();
        self.page.append_subtree(root, |doc| {
            let style = doc.create_element("style");
            doc.set_attr(style, "id", STYLE_ELEMENT_ID);
            doc.append_text(style, HIGHLIGHT_STYLESHEET);
            style
        });
        tracing::debug!("Injected highlight stylesheet");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_mark_applies_and_reverts_class() {
        let page = Page::new();
        let p = page.append_element(page.root(), "p");

        let highlighter = Highlighter::new(page.clone());
        highlighter.mark(p);

        assert!(page.read(|doc| doc.has_class(p, HIGHLIGHT_CLASS)));

        tokio::time::sleep(HIGHLIGHT_DURATION + Duration::from_millis(100)).await;
        assert!(!page.read(|doc| doc.has_class(p, HIGHLIGHT_CLASS)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stylesheet_injected_once() {
        let page = Page::new();
        let a = page.append_element(page.root(), "p");
        let b = page.append_element(page.root(), "p");

        let highlighter = Highlighter::new(page.clone());
        highlighter.mark(a);
        highlighter.mark(b);

        let style_elements = page.read(|doc| {
            doc.descendants(doc.root())
                .into_iter()
                .filter(|n| doc.is_element_with_id(*n, STYLE_ELEMENT_ID))
                .count()
        });
        assert_eq!(style_elements, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_rewritten_targets_parents() {
        let page = Page::new();
        let p = page.append_element(page.root(), "p");
        let t1 = page.append_text(p, "one");
        let t2 = page.append_text(p, "two");

        Highlighter::new(page.clone()).mark_rewritten(&[t1, t2]);

        assert!(page.read(|doc| doc.has_class(p, HIGHLIGHT_CLASS)));
        assert!(!page.read(|doc| doc.has_class(doc.root(), HIGHLIGHT_CLASS)));
    }
}
