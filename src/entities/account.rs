// 🏢 Account Entity - raw input rows, normalized views, resolution labels
//
// "The input row is a VALUE (never mutated), the label is STATE (set once per pass)"
//
// - AccountRecord: one mapped input row, exactly as the collaborator delivered it
// - NormalizedRecord: derived, immutable view used for matching
// - Classification: the label the resolver assigns to a record

use serde::{Deserialize, Serialize};

use crate::grouper::Criterion;

// ============================================================================
// ACCOUNT TYPE (resolution label)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountType {
    /// Canonical or standalone account
    Parent,

    /// Subsidiary/branch of another account (structural hierarchy)
    Child,

    /// Same real-world organization as another account (redundant row)
    Duplicate,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Parent => "Parent",
            AccountType::Child => "Child",
            AccountType::Duplicate => "Duplicate",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ACCOUNT RECORD (raw, semantic field names)
// ============================================================================

/// One input row after column mapping.
///
/// `account_id` and `name` are optional here because the source table may not
/// provide them; the normalizer rejects such rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Position of the row in the input table (zero-based, header excluded).
    /// Must be unique; records sharing one are excluded from resolution.
    pub row_index: usize,

    pub account_id: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub country: Option<String>,
    pub open_opportunities: Option<u64>,
    pub closed_opportunities: Option<u64>,

    /// Pre-existing hierarchy pointer, carried through but never trusted
    pub existing_parent_id: Option<String>,
}

impl AccountRecord {
    pub fn new(row_index: usize, account_id: &str, name: &str) -> Self {
        AccountRecord {
            row_index,
            account_id: Some(account_id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Builder pattern: add domain
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Builder pattern: add country
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    /// Builder pattern: add opportunity counts
    pub fn with_opportunities(mut self, open: u64, closed: u64) -> Self {
        self.open_opportunities = Some(open);
        self.closed_opportunities = Some(closed);
        self
    }

    /// Builder pattern: add an existing parent pointer
    pub fn with_existing_parent(mut self, parent_id: &str) -> Self {
        self.existing_parent_id = Some(parent_id.to_string());
        self
    }
}

// ============================================================================
// NORMALIZED VIEW
// ============================================================================

/// Domain split into its public-suffix-aware parts.
///
/// Example: `shop.example.co.uk` → registrable `example.co.uk`, suffix `co.uk`,
/// label `example`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedDomain {
    pub host: String,
    pub registrable: String,
    pub suffix: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainStatus {
    /// No domain given (empty or missing cell)
    Absent,

    /// Domain parsed into registrable domain + suffix
    Parsed(NormalizedDomain),

    /// A value was given but has no registrable domain (kept for reporting)
    Ambiguous(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub row_index: usize,
    pub account_id: String,
    pub normalized_name: String,
    /// Canonical country key; `None` when the row has no country
    pub country: Option<String>,
    pub domain: DomainStatus,
    pub open_opportunities: u64,
    pub closed_opportunities: u64,
    pub existing_parent_id: Option<String>,
}

impl NormalizedRecord {
    /// Parsed domain, if the record takes part in domain-based rules
    pub fn parsed_domain(&self) -> Option<&NormalizedDomain> {
        match &self.domain {
            DomainStatus::Parsed(domain) => Some(domain),
            DomainStatus::Absent | DomainStatus::Ambiguous(_) => None,
        }
    }

    pub fn has_domain(&self) -> bool {
        self.parsed_domain().is_some()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.parsed_domain().map(|d| d.suffix.as_str())
    }
}

// ============================================================================
// CLASSIFICATION (output label)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub account_type: AccountType,
    pub proposed_parent_id: Option<String>,

    /// Rule that set the label; `None` for untouched parents
    pub rule: Option<Criterion>,
}

impl Classification {
    pub fn standalone() -> Self {
        Classification {
            account_type: AccountType::Parent,
            proposed_parent_id: None,
            rule: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
