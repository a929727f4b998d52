// TrueName - live document text rewriter.
//
// This is the library crate containing the substitution engine and its
// supporting services. The binary crate (main.rs) provides a one-shot CLI
// front end for rewriting document files.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod page;
pub mod parse;
pub mod rules;
pub mod services;
pub mod state;
pub mod store;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{Document, NodeId, NodeKind, ReplacerConfig, SettingsRecord, StatsRecord};
pub use page::{MutationRecord, Page};
pub use rules::RuleSet;
pub use services::{ObservationHandle, Replacer, TextEngine};
pub use state::{ReplacementStats, StatsEvent, StatsManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
