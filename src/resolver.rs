// 🔗 Resolver - classifies every account as Parent, Child or Duplicate
//
// Rules run once each, in fixed priority order:
// 1. Exact domain in country  → Child of the group's canonical record
// 2. Cross-suffix domain      → Child of the preferred-suffix record
// 3. Fuzzy name, no domain    → Duplicate of the best domain-bearing match
//
// First rule to classify a record wins. A record labelled Child or Duplicate
// is never touched again in the same pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::entities::{
    AccountRecord, AccountType, Classification, DomainStatus, NormalizedRecord,
};
use crate::error::{ConfigurationError, RowError, RowErrorKind};
use crate::grouper::{Criterion, GroupKey, Grouper, Groups};
use crate::normalizer::normalize;
use crate::ranker::Ranker;

// ============================================================================
// RESOLUTION (output)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccount {
    pub row_index: usize,
    pub account_id: String,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// One entry per classified row, in row order
    pub accounts: Vec<ResolvedAccount>,

    /// Row-level problems, in row order; Critical ones were excluded
    pub errors: Vec<RowError>,
}

impl Resolution {
    pub fn label(&self, row_index: usize) -> Option<&Classification> {
        self.accounts
            .binary_search_by_key(&row_index, |a| a.row_index)
            .ok()
            .map(|pos| &self.accounts[pos].classification)
    }

    pub fn by_account_id(&self, account_id: &str) -> Option<&Classification> {
        self.accounts
            .iter()
            .find(|a| a.account_id == account_id)
            .map(|a| &a.classification)
    }

    /// `(account_id, account_type, proposed_parent_id)` sorted by account_id
    pub fn tuples(&self) -> Vec<(String, AccountType, Option<String>)> {
        let mut tuples: Vec<_> = self
            .accounts
            .iter()
            .map(|a| {
                (
                    a.account_id.clone(),
                    a.classification.account_type,
                    a.classification.proposed_parent_id.clone(),
                )
            })
            .collect();
        tuples.sort();
        tuples
    }

    pub fn count(&self, account_type: AccountType) -> usize {
        self.accounts
            .iter()
            .filter(|a| a.classification.account_type == account_type)
            .count()
    }
}

// ============================================================================
// LABEL BOARD (write-once labels)
// ============================================================================

struct LabelBoard<'a> {
    records: &'a [NormalizedRecord],
    labels: Vec<Classification>,
}

impl<'a> LabelBoard<'a> {
    fn new(records: &'a [NormalizedRecord]) -> Self {
        LabelBoard {
            records,
            labels: vec![Classification::standalone(); records.len()],
        }
    }

    fn is_classified(&self, idx: usize) -> bool {
        self.labels[idx].account_type != AccountType::Parent
    }

    /// Label `idx` as a child/duplicate of `parent` unless an earlier rule
    /// already did. Returns whether the label was set.
    fn claim(&mut self, idx: usize, account_type: AccountType, parent: usize, rule: Criterion) -> bool {
        if idx == parent || self.is_classified(idx) {
            return false;
        }

        let parent_id = self.records[parent].account_id.clone();
        tracing::debug!(
            account_id = %self.records[idx].account_id,
            parent_id = %parent_id,
            account_type = account_type.as_str(),
            rule = rule.as_str(),
            "classified"
        );

        self.labels[idx] = Classification {
            account_type,
            proposed_parent_id: Some(parent_id),
            rule: Some(rule),
        };
        true
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct Resolver {
    config: ResolverConfig,
    ranker: Ranker,
}

impl Resolver {
    /// Validate the configuration; fails before any row is processed
    pub fn new(config: ResolverConfig) -> Result<Self, ConfigurationError> {
        let preferred_suffix = config.validate()?;
        let ranker = Ranker::new(preferred_suffix, config.opportunity_tiebreak_enabled);
        Ok(Resolver { config, ranker })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Classify all records in one pass.
    ///
    /// Rows missing `account_id`/`name`, or sharing an `account_id` or a
    /// `row_index`, are reported in `errors` and left out; every other row gets a label.
    pub fn resolve(&self, records: &[AccountRecord]) -> Resolution {
        let (normalized, mut errors) = self.prepare(records);

        let grouper = Grouper::new(
            &normalized,
            self.ranker.preferred_suffix(),
            self.config.name_similarity_threshold,
            self.config.effective_workers(),
        );
        let mut board = LabelBoard::new(&normalized);

        for criterion in Criterion::PRIORITY {
            let groups = grouper.group_by(criterion);
            let claimed = match criterion {
                Criterion::ExactDomainInCountry => self.apply_exact_domain(&groups, &mut board),
                Criterion::CrossSuffixDomain => self.apply_cross_suffix(&groups, &mut board),
                Criterion::FuzzyNameWithoutDomain => self.apply_fuzzy_name(&groups, &mut board),
            };
            tracing::info!(
                rule = criterion.as_str(),
                groups = groups.len(),
                claimed,
                "rule applied"
            );
        }

        let mut accounts: Vec<ResolvedAccount> = normalized
            .iter()
            .zip(board.labels)
            .map(|(record, classification)| ResolvedAccount {
                row_index: record.row_index,
                account_id: record.account_id.clone(),
                classification,
            })
            .collect();
        accounts.sort_by_key(|a| a.row_index);
        errors.sort_by_key(|e| e.row_index);

        tracing::info!(
            resolved = accounts.len(),
            errors = errors.len(),
            "resolution complete"
        );

        Resolution { accounts, errors }
    }

    /// Normalize, drop rows that cannot be resolved, collect warnings
    fn prepare(&self, records: &[AccountRecord]) -> (Vec<NormalizedRecord>, Vec<RowError>) {
        let mut errors = Vec::new();
        let mut normalized = Vec::with_capacity(records.len());

        for record in records {
            match normalize(record) {
                Ok(n) => normalized.push(n),
                Err(err) => {
                    tracing::warn!(row_index = err.row_index, error = %err.kind, "row excluded");
                    errors.push(err);
                }
            }
        }

        let mut index_counts: HashMap<usize, usize> = HashMap::new();
        for record in records {
            *index_counts.entry(record.row_index).or_default() += 1;
        }
        let mut id_counts: HashMap<&str, usize> = HashMap::new();
        for record in &normalized {
            *id_counts.entry(record.account_id.as_str()).or_default() += 1;
        }
        let duplicated: Vec<(bool, bool)> = normalized
            .iter()
            .map(|r| {
                (
                    index_counts[&r.row_index] > 1,
                    id_counts[r.account_id.as_str()] > 1,
                )
            })
            .collect();

        let mut kept = Vec::with_capacity(normalized.len());
        for (record, (shared_index, shared_id)) in normalized.into_iter().zip(duplicated) {
            if shared_index {
                tracing::warn!(row_index = record.row_index, account_id = %record.account_id, "row index used twice; row excluded");
                errors.push(RowError::new(
                    record.row_index,
                    Some(record.account_id),
                    RowErrorKind::DuplicateRowIndex,
                ));
                continue;
            }

            if shared_id {
                tracing::warn!(row_index = record.row_index, account_id = %record.account_id, "duplicate account id; row excluded");
                errors.push(RowError::new(
                    record.row_index,
                    Some(record.account_id),
                    RowErrorKind::DuplicateAccountId,
                ));
                continue;
            }

            if let DomainStatus::Ambiguous(raw) = &record.domain {
                tracing::warn!(row_index = record.row_index, domain = %raw, "ambiguous domain; treated as absent");
                errors.push(RowError::new(
                    record.row_index,
                    Some(record.account_id.clone()),
                    RowErrorKind::AmbiguousDomain { domain: raw.clone() },
                ));
            }
            kept.push(record);
        }

        (kept, errors)
    }

    /// Rule 1: within each (registrable domain, country) group, every record
    /// except the canonical one becomes its Child.
    fn apply_exact_domain(&self, groups: &Groups, board: &mut LabelBoard) -> usize {
        let mut claimed = 0;

        let records = board.records;

        for members in groups.values().filter(|m| m.len() > 1) {
            let Some((canonical, rest)) = self.ranker.pick_canonical(members, records) else {
                continue;
            };
            for idx in rest {
                if board.claim(idx, AccountType::Child, canonical, Criterion::ExactDomainInCountry) {
                    claimed += 1;
                }
            }
        }

        claimed
    }

    /// Rule 2: a record under a non-preferred suffix becomes Child of the best
    /// preferred-suffix record with the same label, same country first.
    fn apply_cross_suffix(&self, groups: &Groups, board: &mut LabelBoard) -> usize {
        let mut claimed = 0;
        let records = board.records;

        for members in groups.values() {
            let (preferred, others): (Vec<usize>, Vec<usize>) = members
                .iter()
                .partition(|&&i| self.ranker.is_preferred(&records[i]));

            for idx in others {
                if board.is_classified(idx) {
                    continue;
                }

                let country = &records[idx].country;
                let same_country: Vec<usize> = preferred
                    .iter()
                    .copied()
                    .filter(|&p| records[p].country == *country)
                    .collect();
                let pool = if same_country.is_empty() {
                    &preferred
                } else {
                    &same_country
                };

                let Some((canonical, _)) = self.ranker.pick_canonical(pool, records) else {
                    continue;
                };
                if board.claim(idx, AccountType::Child, canonical, Criterion::CrossSuffixDomain) {
                    claimed += 1;
                }
            }
        }

        claimed
    }

    /// Rule 3: the domain-less anchor of a name group becomes a Duplicate of
    /// the best domain-bearing record it matched. Other domain-less members
    /// only matched the anchor and are resolved through their own groups.
    fn apply_fuzzy_name(&self, groups: &Groups, board: &mut LabelBoard) -> usize {
        let mut claimed = 0;
        let records = board.records;

        for (key, members) in groups {
            let GroupKey::NameAnchor(anchor_id) = key else {
                continue;
            };
            let Some(anchor) = members
                .iter()
                .copied()
                .find(|&i| records[i].account_id == *anchor_id)
            else {
                continue;
            };

            let matched: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&i| i != anchor && records[i].has_domain())
                .collect();
            let Some((canonical, _)) = self.ranker.pick_canonical(&matched, records) else {
                continue;
            };
            if board.claim(anchor, AccountType::Duplicate, canonical, Criterion::FuzzyNameWithoutDomain) {
                claimed += 1;
            }
        }

        claimed
    }
}

// ============================================================================
// TESTS
// ============================================================================
