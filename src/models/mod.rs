//! Data models for the TrueName engine.
//!
//! This module contains the core data structures shared across the crate:
//! - [`Document`]: the in-memory document tree the engine rewrites (elements,
//!   text nodes, embedded frames) with a table-driven traversal policy
//! - [`ReplacerConfig`]: the validated engine configuration for one
//!   activation cycle
//! - [`SettingsRecord`] / [`SettingsPatch`] / [`StatsRecord`]: the persisted
//!   settings shapes consumed by the config manager and the settings store
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: the persisted records derive `Serialize`/`Deserialize`
//! - **Inert**: `Document` carries no change notification of its own; the
//!   observable mutation surface is [`Page`](crate::page::Page)
//! - **Validated once**: raw settings are converted to [`ReplacerConfig`] at
//!   the activation boundary, never re-interpreted downstream

pub mod config;
pub mod document;

pub use config::{CUSTOM_PRONOUNS, ReplacerConfig, SettingsPatch, SettingsRecord, StatsRecord};
pub use document::{
    Document, DocumentError, NodeId, NodeKind, SKIP_TAGS, TraversalPolicy, traversal_policy,
};
