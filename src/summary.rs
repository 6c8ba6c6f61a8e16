// 📊 Resolution Summary - counts per label/rule plus a reproducibility fingerprint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use crate::entities::{AccountRecord, AccountType};
use crate::error::{RowError, Severity};
use crate::resolver::Resolution;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub generated_at: DateTime<Utc>,
    pub total_rows: usize,
    pub resolved: usize,
    pub parents: usize,
    pub children: usize,
    pub duplicates: usize,

    /// Rows left out of resolution (Critical row errors)
    pub excluded: usize,

    /// Rows resolved despite a Warning (ambiguous domain, bad counts)
    pub warnings: usize,

    /// Labels set per rule name; untouched parents are not counted
    pub by_rule: BTreeMap<String, usize>,

    /// Rows whose input parent pointer differs from the proposed parent
    pub existing_parent_disagreements: usize,

    /// SHA-256 over the sorted (account_id, account_type, proposed_parent_id)
    /// tuples; equal fingerprints mean identical labels
    pub fingerprint: String,
}

impl ResolutionSummary {
    /// `errors` is every row error of the run: extraction warnings as well
    /// as the resolver's own.
    pub fn new(records: &[AccountRecord], resolution: &Resolution, errors: &[RowError]) -> Self {
        let mut by_rule = BTreeMap::new();
        for account in &resolution.accounts {
            if let Some(rule) = account.classification.rule {
                *by_rule.entry(rule.as_str().to_string()).or_insert(0) += 1;
            }
        }

        let existing: HashMap<usize, &str> = records
            .iter()
            .filter_map(|r| {
                r.existing_parent_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| (r.row_index, id))
            })
            .collect();
        let existing_parent_disagreements = resolution
            .accounts
            .iter()
            .filter(|a| match existing.get(&a.row_index) {
                Some(&current) => a.classification.proposed_parent_id.as_deref() != Some(current),
                None => false,
            })
            .count();

        let count_severity = |severity: Severity| {
            let mut rows: Vec<usize> = errors
                .iter()
                .filter(|e| e.severity() == severity)
                .map(|e| e.row_index)
                .collect();
            rows.sort_unstable();
            rows.dedup();
            rows.len()
        };

        ResolutionSummary {
            generated_at: Utc::now(),
            total_rows: records.len(),
            resolved: resolution.accounts.len(),
            parents: resolution.count(AccountType::Parent),
            children: resolution.count(AccountType::Child),
            duplicates: resolution.count(AccountType::Duplicate),
            excluded: count_severity(Severity::Critical),
            warnings: count_severity(Severity::Warning),
            by_rule,
            existing_parent_disagreements,
            fingerprint: fingerprint(resolution),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Rows: {}, Parents: {}, Children: {}, Duplicates: {}, Excluded: {}, Warnings: {}",
            self.total_rows,
            self.parents,
            self.children,
            self.duplicates,
            self.excluded,
            self.warnings
        )
    }
}

/// Order-independent digest of a resolution's labels
pub fn fingerprint(resolution: &Resolution) -> String {
    let mut hasher = Sha256::new();
    for (account_id, account_type, parent) in resolution.tuples() {
        hasher.update(format!(
            "{}\t{}\t{}\n",
            account_id,
            account_type.as_str(),
            parent.unwrap_or_default()
        ));
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::resolver::Resolver;

    fn create_test_records() -> Vec<AccountRecord> {
        let mut nameless = AccountRecord::new(3, "4", "");
        nameless.name = None;

        vec![
            AccountRecord::new(0, "1", "Acme")
                .with_domain("acme.de")
                .with_country("Germany")
                .with_existing_parent("9"),
            AccountRecord::new(1, "2", "Acme GmbH")
                .with_domain("acme.com")
                .with_country("Germany"),
            AccountRecord::new(2, "3", "Acme Shop")
                .with_domain("shop.acme.com")
                .with_country("Germany")
                .with_existing_parent("2"),
            nameless,
        ]
    }

    #[test]
    fn test_summary_counts() {
        let records = create_test_records();
        let resolution = Resolver::new(ResolverConfig::default())
            .unwrap()
            .resolve(&records);

        let summary = ResolutionSummary::new(&records, &resolution, &resolution.errors);

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.resolved, 3);
        assert_eq!(summary.parents, 1);
        assert_eq!(summary.children, 2);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.by_rule.get("ExactDomainInCountry"), Some(&1));
        assert_eq!(summary.by_rule.get("CrossSuffixDomain"), Some(&1));
        // Row 0 claims parent 9 but resolves under 2; row 2 agrees
        assert_eq!(summary.existing_parent_disagreements, 1);
        assert!(summary.summary().starts_with("Rows: 4, Parents: 1"));
    }

    #[test]
    fn test_fingerprint_ignores_row_order() {
        let records = create_test_records();
        let mut reversed = records.clone();
        reversed.reverse();
        for (i, record) in reversed.iter_mut().enumerate() {
            record.row_index = i;
        }

        let resolver = Resolver::new(ResolverConfig::default()).unwrap();
        let a = fingerprint(&resolver.resolve(&records));
        let b = fingerprint(&resolver.resolve(&reversed));

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
