// 🧩 Grouper - partitions records into equivalence groups per criterion
//
// The grouper never ranks. Members of every group are sorted by account_id,
// so a fixed input yields the same partition whatever the row order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::NormalizedRecord;

// ============================================================================
// CRITERION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criterion {
    /// Same registrable domain in the same country
    ExactDomainInCountry,

    /// Same domain label under a different public suffix (`acme.de` ↔ `acme.com`)
    CrossSuffixDomain,

    /// Domain-less record whose name is similar to another record's
    FuzzyNameWithoutDomain,
}

impl Criterion {
    /// Resolution order; earlier criteria win
    pub const PRIORITY: [Criterion; 3] = [
        Criterion::ExactDomainInCountry,
        Criterion::CrossSuffixDomain,
        Criterion::FuzzyNameWithoutDomain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::ExactDomainInCountry => "ExactDomainInCountry",
            Criterion::CrossSuffixDomain => "CrossSuffixDomain",
            Criterion::FuzzyNameWithoutDomain => "FuzzyNameWithoutDomain",
        }
    }
}

// ============================================================================
// GROUP KEYS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    DomainInCountry {
        registrable: String,
        country: Option<String>,
    },
    DomainLabel(String),
    /// account_id of the domain-less record the group was built around
    NameAnchor(String),
}

/// Group key → member indices into the record slice
pub type Groups = BTreeMap<GroupKey, Vec<usize>>;

/// Similarity of two normalized names on a 0-1 scale
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(a, b)
}

// ============================================================================
// GROUPER
// ============================================================================

pub struct Grouper<'a> {
    records: &'a [NormalizedRecord],
    preferred_suffix: &'a str,
    threshold: f64,
    workers: usize,
}

impl<'a> Grouper<'a> {
    pub fn new(
        records: &'a [NormalizedRecord],
        preferred_suffix: &'a str,
        threshold: f64,
        workers: usize,
    ) -> Self {
        Grouper {
            records,
            preferred_suffix,
            threshold,
            workers: workers.max(1),
        }
    }

    pub fn group_by(&self, criterion: Criterion) -> Groups {
        let mut groups = match criterion {
            Criterion::ExactDomainInCountry => self.exact_domain_groups(),
            Criterion::CrossSuffixDomain => self.cross_suffix_groups(),
            Criterion::FuzzyNameWithoutDomain => self.fuzzy_name_groups(),
        };

        for members in groups.values_mut() {
            members.sort_by(|&a, &b| self.records[a].account_id.cmp(&self.records[b].account_id));
        }

        groups
    }

    /// Every domain-bearing record, keyed by (registrable domain, country).
    /// Singletons are included; the resolver skips them.
    fn exact_domain_groups(&self) -> Groups {
        let mut groups = Groups::new();

        for (idx, record) in self.records.iter().enumerate() {
            if let Some(domain) = record.parsed_domain() {
                let key = GroupKey::DomainInCountry {
                    registrable: domain.registrable.clone(),
                    country: record.country.clone(),
                };
                groups.entry(key).or_default().push(idx);
            }
        }

        groups
    }

    /// Domain-bearing records keyed by label, kept only when the label exists
    /// under the preferred suffix and under at least one other suffix.
    fn cross_suffix_groups(&self) -> Groups {
        let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

        for (idx, record) in self.records.iter().enumerate() {
            if let Some(domain) = record.parsed_domain() {
                by_label.entry(domain.label.as_str()).or_default().push(idx);
            }
        }

        by_label
            .into_iter()
            .filter(|(_, members)| {
                let preferred = members
                    .iter()
                    .filter(|&&i| self.records[i].suffix() == Some(self.preferred_suffix))
                    .count();
                preferred > 0 && preferred < members.len()
            })
            .map(|(label, members)| (GroupKey::DomainLabel(label.to_string()), members))
            .collect()
    }

    /// One group per domain-less record that has at least one similar name.
    ///
    /// Comparisons are blocked on (country, first letter of the name), and
    /// blocks are spread over `workers` threads.
    fn fuzzy_name_groups(&self) -> Groups {
        let mut blocks: BTreeMap<(Option<&str>, char), Vec<usize>> = BTreeMap::new();

        for (idx, record) in self.records.iter().enumerate() {
            if let Some(first) = record.normalized_name.chars().next() {
                blocks
                    .entry((record.country.as_deref(), first))
                    .or_default()
                    .push(idx);
            }
        }

        let blocks: Vec<Vec<usize>> = blocks
            .into_values()
            .filter(|members| members.len() > 1)
            .filter(|members| members.iter().any(|&i| !self.records[i].has_domain()))
            .collect();

        let workers = self.workers.min(blocks.len()).max(1);
        let found: Vec<(GroupKey, Vec<usize>)> = if workers == 1 {
            blocks.iter().flat_map(|block| self.match_block(block)).collect()
        } else {
            let chunk_size = blocks.len().div_ceil(workers);
            std::thread::scope(|scope| {
                let handles: Vec<_> = blocks
                    .chunks(chunk_size)
                    .map(|chunk| {
                        scope.spawn(move || {
                            chunk
                                .iter()
                                .flat_map(|block| self.match_block(block))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    })
                    .collect()
            })
        };

        tracing::debug!(
            blocks = blocks.len(),
            workers,
            groups = found.len(),
            "fuzzy name grouping done"
        );

        found.into_iter().collect()
    }

    fn match_block(&self, block: &[usize]) -> Vec<(GroupKey, Vec<usize>)> {
        let mut found = Vec::new();

        for &anchor in block {
            let anchor_record = &self.records[anchor];
            if anchor_record.has_domain() {
                continue;
            }

            let mut members = vec![anchor];
            for &other in block {
                if other == anchor {
                    continue;
                }
                let score = name_similarity(
                    &anchor_record.normalized_name,
                    &self.records[other].normalized_name,
                );
                if score >= self.threshold {
                    members.push(other);
                }
            }

            if members.len() > 1 {
                found.push((GroupKey::NameAnchor(anchor_record.account_id.clone()), members));
            }
        }

        found
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AccountRecord;
    use crate::normalizer::normalize;

    fn create_test_records(rows: &[(&str, &str, Option<&str>, &str)]) -> Vec<NormalizedRecord> {
        rows.iter()
            .enumerate()
            .map(|(i, (id, name, domain, country))| {
                let mut record = AccountRecord::new(i, id, name).with_country(country);
                if let Some(domain) = domain {
                    record = record.with_domain(domain);
                }
                normalize(&record).unwrap()
            })
            .collect()
    }

    fn ids(records: &[NormalizedRecord], members: &[usize]) -> Vec<String> {
        members.iter().map(|&i| records[i].account_id.clone()).collect()
    }

    #[test]
    fn test_exact_domain_groups_by_country() {
        let records = create_test_records(&[
            ("3", "Acme", Some("acme.com"), "US"),
            ("1", "Acme Inc", Some("www.acme.com"), "United States"),
            ("2", "Acme DE", Some("acme.com"), "Germany"),
            ("4", "Nobody", None, "US"),
        ]);
        let grouper = Grouper::new(&records, "com", 0.85, 1);

        let groups = grouper.group_by(Criterion::ExactDomainInCountry);

        let us = GroupKey::DomainInCountry {
            registrable: "acme.com".to_string(),
            country: Some("united states".to_string()),
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&records, &groups[&us]), vec!["1", "3"]);
    }

    #[test]
    fn test_subdomains_share_registrable_group() {
        let records = create_test_records(&[
            ("1", "Example", Some("example.co.uk"), "UK"),
            ("2", "Example Shop", Some("shop.example.co.uk"), "UK"),
        ]);
        let grouper = Grouper::new(&records, "com", 0.85, 1);

        let groups = grouper.group_by(Criterion::ExactDomainInCountry);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.values().next().unwrap().len(), 2);
    }

    #[test]
    fn test_cross_suffix_requires_preferred_and_other() {
        let records = create_test_records(&[
            ("1", "Acme", Some("acme.de"), "Germany"),
            ("2", "Acme", Some("acme.com"), "Germany"),
            ("3", "Globex", Some("globex.de"), "Germany"),
            ("4", "Globex", Some("globex.fr"), "France"),
            ("5", "Initech", Some("initech.com"), "US"),
        ]);
        let grouper = Grouper::new(&records, "com", 0.85, 1);

        let groups = grouper.group_by(Criterion::CrossSuffixDomain);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            ids(&records, &groups[&GroupKey::DomainLabel("acme".to_string())]),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_fuzzy_groups_anchor_on_domainless_records() {
        let records = create_test_records(&[
            ("3", "Globex Inc", None, "US"),
            ("4", "Globex Incorporated", Some("globex.com"), "US"),
            ("5", "Globex Incorporated", Some("globex.com"), "Canada"),
            ("6", "Umbrella Corp", None, "US"),
        ]);
        let grouper = Grouper::new(&records, "com", 0.85, 1);

        let groups = grouper.group_by(Criterion::FuzzyNameWithoutDomain);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            ids(&records, &groups[&GroupKey::NameAnchor("3".to_string())]),
            vec!["3", "4"]
        );
    }

    #[test]
    fn test_fuzzy_threshold_excludes_distant_names() {
        let records = create_test_records(&[
            ("1", "Globex", None, "US"),
            ("2", "Gringotts Bank", Some("gringotts.com"), "US"),
        ]);
        let grouper = Grouper::new(&records, "com", 0.85, 1);

        assert!(grouper.group_by(Criterion::FuzzyNameWithoutDomain).is_empty());
    }

    #[test]
    fn test_fuzzy_parallel_matches_sequential() {
        let records = create_test_records(&[
            ("1", "Globex Inc", None, "US"),
            ("2", "Globex Incorporated", Some("globex.com"), "US"),
            ("3", "Acme Corp", None, "Germany"),
            ("4", "Acme Corporation", Some("acme.de"), "Germany"),
            ("5", "Initech", None, "US"),
            ("6", "Initech LLC", Some("initech.com"), "US"),
        ]);

        let sequential = Grouper::new(&records, "com", 0.85, 1)
            .group_by(Criterion::FuzzyNameWithoutDomain);
        let parallel = Grouper::new(&records, "com", 0.85, 4)
            .group_by(Criterion::FuzzyNameWithoutDomain);

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 3);
    }

    #[test]
    fn test_similarity_scale() {
        assert_eq!(name_similarity("acme", "acme"), 1.0);
        assert!(name_similarity("globex inc", "globex incorporated") >= 0.85);
        assert!(name_similarity("acme", "zzzz") < 0.5);
    }
}
