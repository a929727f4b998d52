//! Services module - the substitution engine and its watcher.
//!
//! This module contains the core logic that rewrites document text and keeps
//! it rewritten as the document changes. The services are **UI-agnostic**:
//! they know nothing about settings forms or persistence, making them
//! testable against plain in-memory documents.
//!
//! # Components
//!
//! - [`TextEngine`]: applies a compiled rule set to a document subtree in
//!   place. Recursive document-order traversal with a table-driven skip
//!   policy, per-category match counting and single write-back per node.
//!
//! - [`Replacer`]: the mutation watcher. Runs the engine over the whole
//!   document at activation, re-runs it incrementally on every mutation
//!   batch, attaches to embedded sub-documents as they load, and re-sweeps
//!   everything on a fixed [`RESCAN_INTERVAL`] as a safety net.
//!
//! - [`Highlighter`]: transient visual marking of rewritten elements with
//!   idempotent stylesheet injection.
//!
//! - [`ObservationHandle`]: returned by activation; disconnect stops all
//!   future mutation and is idempotent.
//!
//! # Convergence model
//!
//! Push and poll are deliberately combined: the mutation stream gives low
//! latency, the rescan timer gives bounded staleness if the stream drops or
//! misses records. Both paths run the same idempotent engine, so overlap is
//! harmless: converged text counts zero further replacements.

pub mod engine;
pub mod highlight;
pub mod watcher;

pub use engine::{RewriteResult, SweepOutcome, TextEngine};
pub use highlight::{HIGHLIGHT_CLASS, HIGHLIGHT_DURATION, Highlighter, STYLE_ELEMENT_ID};
pub use watcher::{ObservationHandle, RESCAN_INTERVAL, Replacer};
