// Account Karma - Core Library
// Classifies account records as Parent, Child or Duplicate.
// Exposes all modules for use in the CLI and tests.

pub mod entities;
pub mod error;
pub mod config;
pub mod table;
pub mod mapping;
pub mod normalizer;  // Canonical domain / name / country
pub mod grouper;     // Equivalence groups per matching criterion
pub mod ranker;      // Canonical record per group
pub mod resolver;    // Rule precedence + final labels
pub mod projector;   // Labels back onto the input table
pub mod summary;
pub mod pipeline;

// Re-export commonly used types
pub use entities::{
    AccountRecord, AccountType, Classification, DomainStatus, NormalizedDomain, NormalizedRecord,
};
pub use error::{ConfigurationError, RowError, RowErrorKind, Severity};
pub use config::ResolverConfig;
pub use table::{save_errors, write_errors, Table};
pub use mapping::{ColumnIndex, ColumnMapping};
pub use normalizer::{normalize, normalize_country, normalize_domain, normalize_name};
pub use grouper::{name_similarity, Criterion, GroupKey, Grouper, Groups};
pub use ranker::Ranker;
pub use resolver::{Resolution, ResolvedAccount, Resolver};
pub use projector::{project, strip_augmentation, ACCOUNT_TYPE_COLUMN, PROPOSED_PARENT_COLUMN};
pub use summary::{fingerprint, ResolutionSummary};
pub use pipeline::{run, Outcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
