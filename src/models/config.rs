use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Sentinel value in a settings record selecting the custom pronoun field.
pub const CUSTOM_PRONOUNS: &str = "custom";

/// Validated engine configuration for one activation cycle.
///
/// Built once at the boundary from a [`SettingsRecord`] (or assembled
/// directly) and treated as immutable afterwards. The engine never sees the
/// raw persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacerConfig {
    /// Name variants to replace, split from the comma-separated settings
    /// field: trimmed, empties dropped, duplicates permitted.
    pub deadname_variants: Vec<String>,
    pub preferred_name: String,
    /// Old pronoun descriptor: a canonical tag ("he/him", "they/them", ...)
    /// or a raw comma-separated custom list.
    pub old_pronouns: String,
    /// New pronoun descriptor, same formats as `old_pronouns`.
    pub new_pronouns: String,
    /// Reapply the source capitalization pattern to each replacement.
    pub preserve_case: bool,
    /// Anchor matches with word boundaries on both ends.
    pub whole_word: bool,
    /// Request transient visual marking of rewritten elements.
    pub highlight_replacements: bool,
}

impl ReplacerConfig {
    /// Build a config from raw field values, splitting the deadname field.
    pub fn new(
        deadname: &str,
        preferred_name: &str,
        old_pronouns: &str,
        new_pronouns: &str,
    ) -> Self {
        Self {
            deadname_variants: split_variants(deadname),
            preferred_name: preferred_name.to_string(),
            old_pronouns: old_pronouns.to_string(),
            new_pronouns: new_pronouns.to_string(),
            preserve_case: true,
            whole_word: true,
            highlight_replacements: true,
        }
    }

    /// Derive an engine config from a persisted settings record.
    ///
    /// Resolves the `"custom"` pronoun sentinel to the matching custom
    /// descriptor field (empty when the custom field is absent).
    pub fn from_settings(settings: &SettingsRecord) -> Self {
        let old_pronouns = if settings.old_pronouns == CUSTOM_PRONOUNS {
            settings.custom_old_pronouns.clone().unwrap_or_default()
        } else {
            settings.old_pronouns.clone()
        };
        let new_pronouns = if settings.new_pronouns == CUSTOM_PRONOUNS {
            settings.custom_new_pronouns.clone().unwrap_or_default()
        } else {
            settings.new_pronouns.clone()
        };

        Self {
            deadname_variants: split_variants(&settings.deadname),
            preferred_name: settings.preferred_name.clone(),
            old_pronouns,
            new_pronouns,
            preserve_case: settings.preserve_case,
            whole_word: settings.whole_word,
            highlight_replacements: settings.highlight_replacements,
        }
    }

    /// Whether this config can produce any substitution at all.
    ///
    /// A config with no name variants or an empty preferred name activates
    /// as a no-op rather than an error.
    pub fn is_actionable(&self) -> bool {
        !self.deadname_variants.is_empty() && !self.preferred_name.trim().is_empty()
    }

    /// Distinct non-empty variants in first-seen order.
    ///
    /// The raw list keeps duplicates; rule compilation works from this
    /// deduplicated view.
    pub fn distinct_variants(&self) -> Vec<&str> {
        let set: IndexSet<&str> = self.deadname_variants.iter().map(String::as_str).collect();
        set.into_iter().collect()
    }
}

/// Split a comma-separated name field into trimmed non-empty variants.
fn split_variants(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Persisted user settings record.
///
/// Matches the stored shape used by the settings UI and the settings store;
/// derived replacement counts live in a separate [`StatsRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default)]
    pub deadname: String,

    #[serde(default)]
    pub preferred_name: String,

    #[serde(default = "default_old_pronouns")]
    pub old_pronouns: String,

    #[serde(default = "default_new_pronouns")]
    pub new_pronouns: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_old_pronouns: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_new_pronouns: Option<String>,

    #[serde(default = "default_true")]
    pub preserve_case: bool,

    #[serde(default = "default_true")]
    pub highlight_replacements: bool,

    #[serde(default = "default_true")]
    pub whole_word: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            deadname: String::new(),
            preferred_name: String::new(),
            old_pronouns: default_old_pronouns(),
            new_pronouns: default_new_pronouns(),
            custom_old_pronouns: None,
            custom_new_pronouns: None,
            preserve_case: true,
            highlight_replacements: true,
            whole_word: true,
            is_active: true,
        }
    }
}

/// Partial update to a settings record; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub deadname: Option<String>,
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub old_pronouns: Option<String>,
    #[serde(default)]
    pub new_pronouns: Option<String>,
    #[serde(default)]
    pub custom_old_pronouns: Option<String>,
    #[serde(default)]
    pub custom_new_pronouns: Option<String>,
    #[serde(default)]
    pub preserve_case: Option<bool>,
    #[serde(default)]
    pub highlight_replacements: Option<bool>,
    #[serde(default)]
    pub whole_word: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SettingsPatch {
    /// Apply this patch to a record, field by field.
    pub fn apply(&self, record: &mut SettingsRecord) {
        if let Some(v) = &self.deadname {
            record.deadname = v.clone();
        }
        if let Some(v) = &self.preferred_name {
            record.preferred_name = v.clone();
        }
        if let Some(v) = &self.old_pronouns {
            record.old_pronouns = v.clone();
        }
        if let Some(v) = &self.new_pronouns {
            record.new_pronouns = v.clone();
        }
        if let Some(v) = &self.custom_old_pronouns {
            record.custom_old_pronouns = Some(v.clone());
        }
        if let Some(v) = &self.custom_new_pronouns {
            record.custom_new_pronouns = Some(v.clone());
        }
        if let Some(v) = self.preserve_case {
            record.preserve_case = v;
        }
        if let Some(v) = self.highlight_replacements {
            record.highlight_replacements = v;
        }
        if let Some(v) = self.whole_word {
            record.whole_word = v;
        }
        if let Some(v) = self.is_active {
            record.is_active = v;
        }
    }
}

/// Persisted replacement counters, stored separately from the settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    #[serde(default)]
    pub name_replacements: u64,

    #[serde(default)]
    pub pronoun_replacements: u64,
}

impl StatsRecord {
    pub fn total(&self) -> u64 {
        self.name_replacements + self.pronoun_replacements
    }
}

fn default_true() -> bool {
    true
}

fn default_old_pronouns() -> String {
    "he/him".to_string()
}

fn default_new_pronouns() -> String {
    "she/her".to_string()
}
