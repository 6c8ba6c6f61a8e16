// ⚙️ Resolver configuration - loaded from JSON, validated before any row is processed

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigurationError;
use crate::mapping::ColumnMapping;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Suffix whose domains are preferred as canonical parents (default: "com")
    pub preferred_suffix: String,

    /// Minimum Jaro-Winkler score for the fuzzy name rule, 0.0 - 1.0 (default: 0.85)
    pub name_similarity_threshold: f64,

    /// Use opportunity counts as ranking tie-breakers (default: true)
    pub opportunity_tiebreak_enabled: bool,

    /// Threads for the fuzzy name pass; 0 = one per available core (default: 1)
    pub workers: usize,

    /// Header names for the semantic fields; unset fields are auto-detected
    pub columns: ColumnMapping,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            preferred_suffix: "com".to_string(),
            name_similarity_threshold: 0.85,
            opportunity_tiebreak_enabled: true,
            workers: 1,
            columns: ColumnMapping::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file; missing keys take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Check every option, returning the normalized preferred suffix
    pub fn validate(&self) -> std::result::Result<String, ConfigurationError> {
        let threshold = self.name_similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigurationError::ThresholdOutOfRange(threshold));
        }

        normalize_suffix(&self.preferred_suffix)
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// `" .CO.UK "` → `"co.uk"`; rejects anything that is not dot-separated
/// `[a-z0-9-]` labels or not a public suffix the PSL knows.
fn normalize_suffix(raw: &str) -> std::result::Result<String, ConfigurationError> {
    let suffix = raw.trim().trim_start_matches('.').to_lowercase();

    let valid = !suffix.is_empty()
        && suffix.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        && psl::suffix(suffix.as_bytes())
            .map_or(false, |s| s.is_known() && s.as_bytes() == suffix.as_bytes());

    if valid {
        Ok(suffix)
    } else {
        Err(ConfigurationError::InvalidPreferredSuffix(raw.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
