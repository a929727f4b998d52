use crate::metrics::Metrics;
use crate::models::{DocumentError, NodeId, NodeKind, ReplacerConfig};
use crate::page::{MutationRecord, Page};
use crate::services::engine::{SweepOutcome, TextEngine};
use crate::services::highlight::{Highlighter, STYLE_ELEMENT_ID};
use crate::state::StatsManager;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How often the full document is re-swept and frames are re-discovered,
/// independent of the mutation stream. The push path gives low latency; this
/// poll path bounds the staleness of anything the stream missed.
pub const RESCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

/// Keeps a live page converged with a rule set as it changes.
///
/// Each activation owns its own subscription, rescan timer and engine; there
/// is no shared process-wide instance. Counts flow to the [`StatsManager`]
/// this replacer was built with.
pub struct Replacer {
    stats: StatsManager,
    metrics: Arc<Metrics>,
}

impl Replacer {
    pub fn new() -> Self {
        Self::with_stats(StatsManager::new())
    }

    /// Build a replacer reporting into an existing stats accumulator.
    pub fn with_stats(stats: StatsManager) -> Self {
        Self {
            stats,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Start watching a page.
    ///
    /// Runs the engine once over the whole document, subscribes to the
    /// page's mutation stream, attaches to embedded sub-documents and starts
    /// the periodic rescan. A config that cannot produce any substitution
    /// yields a disconnected no-op handle; activation never fails.
    ///
    /// Must be called inside a tokio runtime.
    pub fn activate(&self, page: &Page, config: ReplacerConfig) -> ObservationHandle {
        if !config.is_actionable() {
            tracing::debug!("Config has no deadname or preferred name; not activating");
            return ObservationHandle::noop();
        }

        let handle = Arc::new(HandleShared::default());
        let ctx = Arc::new(WatchContext {
            engine: TextEngine::new(&config),
            highlight: config.highlight_replacements,
            stats: self.stats.clone(),
            metrics: Arc::clone(&self.metrics),
            handle: Arc::clone(&handle),
            attached: Mutex::new(HashSet::new()),
        });

        // The top-level page is "attached" from the start; only frames are
        // discovered later.
        ctx.attached.lock().unwrap().insert(page.token());
        ctx.bind(page.clone());

        // Periodic full rescan as a safety net for missed mutations.
        {
            let ctx = Arc::clone(&ctx);
            let page = page.clone();
            let task = tokio::spawn(async move {
                let mut interval = tokio::time::interval(RESCAN_INTERVAL);
                // The first tick fires immediately; the initial sweep
                // already ran, so skip it.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    ctx.rescan(&page);
                }
            });
            handle.register(task);
        }

        tracing::info!(
            "Activated replacer: {} rules, highlight={}",
            ctx.engine.rules().len(),
            ctx.highlight
        );

        ObservationHandle { shared: handle }
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared innards of an activation: the compiled engine plus everything the
/// watcher tasks need.
struct WatchContext {
    engine: TextEngine,
    highlight: bool,
    stats: StatsManager,
    metrics: Arc<Metrics>,
    handle: Arc<HandleShared>,
    /// Page tokens already bound, so a sub-document is attached at most once
    /// even when rescans rediscover it.
    attached: Mutex<HashSet<usize>>,
}

impl WatchContext {
    /// Sweep a page once, start its batch loop and discover its frames.
    ///
    /// Used for the top-level page at activation and for each sub-document
    /// as it becomes reachable.
    fn bind(self: &Arc<Self>, page: Page) {
        let outcome = page.update(|doc| self.engine.sweep(doc, doc.root()));
        self.report(&page, outcome);

        // Subscribe after reporting: the records for our own initial
        // rewrites were already sent and won't be replayed to us.
        let rx = page.subscribe();
        {
            let ctx = Arc::clone(self);
            let page = page.clone();
            let task = tokio::spawn(async move { ctx.batch_loop(page, rx).await });
            self.handle.register(task);
        }

        self.scan_frames(&page);
    }

    /// Consume the mutation stream, one batch per wakeup.
    async fn batch_loop(self: Arc<Self>, page: Page, mut rx: broadcast::Receiver<MutationRecord>) {
        loop {
            let first = match rx.recv().await {
                Ok(record) => record,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Mutation stream lagged by {} records; rescan will reconcile",
                        skipped
                    );
                    self.metrics.record_mutation_lag();
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let mut records = vec![first];
            loop {
                match rx.try_recv() {
                    Ok(record) => records.push(record),
                    Err(broadcast::error::TryRecvError::Lagged(_)) => {
                        self.metrics.record_mutation_lag();
                        continue;
                    }
                    Err(_) => break,
                }
            }

            self.process_batch(&page, records);
        }
    }

    /// Apply the engine to everything one batch of records touched.
    ///
    /// The whole batch runs under a single write lock, so its counts are
    /// reported once and never interleave with another unit of work.
    fn process_batch(self: &Arc<Self>, page: &Page, records: Vec<MutationRecord>) {
        let mut outcome = SweepOutcome::default();
        let mut frames_to_check: Vec<NodeId> = Vec::new();

        page.update(|doc| {
            for record in &records {
                match *record {
                    MutationRecord::ChildAdded { parent, node } => {
                        // Skip our own stylesheet injection, and anything
                        // landing inside a protected subtree.
                        if doc.is_element_with_id(node, STYLE_ELEMENT_ID)
                            || doc.is_element_with_id(parent, STYLE_ELEMENT_ID)
                            || doc.in_skipped_subtree(node)
                        {
                            continue;
                        }
                        outcome.merge(self.engine.sweep(doc, node));
                        if matches!(doc.kind(node), NodeKind::Frame(_)) {
                            frames_to_check.push(node);
                        }
                    }
                    MutationRecord::CharacterData { node } => {
                        // A text edit is reported at text-node granularity;
                        // protected ancestors (including the injected
                        // stylesheet) still apply.
                        if doc.in_skipped_subtree(node) {
                            continue;
                        }
                        outcome.merge(self.engine.sweep(doc, node));
                    }
                    MutationRecord::FrameLoaded { node } => {
                        frames_to_check.push(node);
                    }
                    MutationRecord::ChildRemoved { .. } => {}
                }
            }
        });

        self.metrics.record_batch();
        self.report(page, outcome);

        for frame in frames_to_check {
            self.try_attach_frame(page, frame);
        }
    }

    /// Full re-sweep plus frame rediscovery, driven by the rescan timer.
    fn rescan(self: &Arc<Self>, page: &Page) {
        let outcome = page.update(|doc| self.engine.sweep(doc, doc.root()));
        self.metrics.record_rescan();
        self.report(page, outcome);
        self.scan_frames(page);
    }

    /// Broadcast rewrites, mark highlights and report counts for one unit of
    /// work. Reports to the stats sink at most once, and only when at least
    /// one count is non-zero.
    fn report(&self, page: &Page, outcome: SweepOutcome) {
        if !outcome.rewritten.is_empty() {
            self.metrics.record_text_rewrites(outcome.rewritten.len() as u64);
            page.notify_text_rewritten(&outcome.rewritten);
            if self.highlight {
                Highlighter::new(page.clone()).mark_rewritten(&outcome.rewritten);
            }
        }

        self.stats.record_batch(outcome.names, outcome.pronouns);
    }

    /// Attach to every frame currently present under the page root.
    fn scan_frames(self: &Arc<Self>, page: &Page) {
        let frames = page.read(|doc| doc.frames(doc.root()));
        for frame in frames {
            self.try_attach_frame(page, frame);
        }
    }

    /// Attach to one frame's sub-document if it is loaded, accessible and
    /// not already bound. Cross-origin denial is expected and non-fatal.
    fn try_attach_frame(self: &Arc<Self>, page: &Page, frame: NodeId) {
        let content = page.read(|doc| {
            if !doc.frame_loaded(frame) {
                return Ok(None);
            }
            doc.frame_content(frame)
        });

        match content {
            Ok(Some(inner)) => {
                let newly_attached = self.attached.lock().unwrap().insert(inner.token());
                if newly_attached && !self.handle.is_disconnected() {
                    tracing::debug!("Attaching to loaded sub-document");
                    self.metrics.record_frame_attached();
                    self.bind(inner);
                }
            }
            Ok(None) => {}
            Err(DocumentError::CrossOriginFrame) => {
                self.metrics.record_frame_denied();
                tracing::debug!("Could not access frame content (likely cross-origin)");
            }
            Err(DocumentError::NotAFrame) => {}
        }
    }
}

/// Handle to a running activation.
///
/// Disconnecting aborts the mutation subscriptions and the rescan timer; a
/// unit of work already running completes, but nothing new starts. The
/// document keeps whatever text was already rewritten.
#[derive(Debug)]
pub struct ObservationHandle {
    shared: Arc<HandleShared>,
}

impl ObservationHandle {
    /// A handle that was never connected. Disconnecting it is a no-op.
    pub fn noop() -> Self {
        let shared = HandleShared {
            disconnected: AtomicBool::new(true),
            tasks: Mutex::new(Vec::new()),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Stop all watching. Idempotent and safe on a never-connected handle.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        !self.shared.is_disconnected()
    }
}

impl Drop for ObservationHandle {
    fn drop(&mut self) {
        self.shared.disconnect();
    }
}

#[derive(Debug, Default)]
struct HandleShared {
    disconnected: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HandleShared {
    /// Track a task for abort on disconnect. A task registered after
    /// disconnect is aborted immediately.
    fn register(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap();
        if self.disconnected.load(Ordering::SeqCst) {
            task.abort();
        } else {
            tasks.push(task);
        }
    }

    fn disconnect(&self) {
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            for task in self.tasks.lock().unwrap().drain(..) {
                task.abort();
            }
            tracing::debug!("Observation disconnected");
        }
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}
