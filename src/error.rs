// ⚠️ Errors - configuration failures and row-level problems
// Configuration errors are fatal and raised before any row is touched.
// Row errors are collected and returned next to the resolved table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// CONFIGURATION ERRORS (fatal)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("name similarity threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("preferred suffix {0:?} is not a valid domain suffix")]
    InvalidPreferredSuffix(String),

    #[error("no column found for required field `{field}`")]
    MissingColumn { field: &'static str },

    #[error("column {header:?} configured for `{field}` is not in the table")]
    UnknownColumn { field: &'static str, header: String },
}

// ============================================================================
// ROW ERRORS (partial failure)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Row could not be classified and is excluded from resolution
    Critical,
    /// Row was classified, but part of its data was ignored
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RowErrorKind {
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    #[error("account id is shared with another row")]
    DuplicateAccountId,

    #[error("row index is shared with another record")]
    DuplicateRowIndex,

    #[error("domain {domain:?} has no registrable domain; treated as absent")]
    AmbiguousDomain { domain: String },

    #[error("`{field}` value {value:?} is not a non-negative integer; treated as 0")]
    InvalidOpportunityCount { field: String, value: String },
}

impl RowErrorKind {
    /// Short machine-readable name, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            RowErrorKind::MissingRequiredField { .. } => "MissingRequiredField",
            RowErrorKind::DuplicateAccountId => "DuplicateAccountId",
            RowErrorKind::DuplicateRowIndex => "DuplicateRowIndex",
            RowErrorKind::AmbiguousDomain { .. } => "AmbiguousDomain",
            RowErrorKind::InvalidOpportunityCount { .. } => "InvalidOpportunityCount",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RowErrorKind::MissingRequiredField { .. }
            | RowErrorKind::DuplicateAccountId
            | RowErrorKind::DuplicateRowIndex => Severity::Critical,
            RowErrorKind::AmbiguousDomain { .. } | RowErrorKind::InvalidOpportunityCount { .. } => {
                Severity::Warning
            }
        }
    }
}

/// A problem tied to one input row.
///
/// `row_index` is the zero-based position of the data row in the input table
/// (the header line is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("row {row_index}: {kind}")]
pub struct RowError {
    pub row_index: usize,
    pub account_id: Option<String>,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(row_index: usize, account_id: Option<String>, kind: RowErrorKind) -> Self {
        RowError {
            row_index,
            account_id,
            kind,
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// True when the row was left out of resolution
    pub fn excludes_row(&self) -> bool {
        self.severity() == Severity::Critical
    }
}

// ============================================================================
// TESTS
// ============================================================================
