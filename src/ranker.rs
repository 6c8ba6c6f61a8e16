// 🏆 Ranker - deterministic choice of a group's canonical record
//
// Order, applied until a total order is reached:
// 1. preferred domain suffix first
// 2. more open opportunities
// 3. more closed opportunities
// 4. smaller account_id (lexicographic)

use std::cmp::Ordering;

use crate::entities::NormalizedRecord;

#[derive(Debug, Clone)]
pub struct Ranker {
    preferred_suffix: String,
    opportunity_tiebreak: bool,
}

impl Ranker {
    pub fn new(preferred_suffix: impl Into<String>, opportunity_tiebreak: bool) -> Self {
        Ranker {
            preferred_suffix: preferred_suffix.into(),
            opportunity_tiebreak,
        }
    }

    pub fn preferred_suffix(&self) -> &str {
        &self.preferred_suffix
    }

    pub fn is_preferred(&self, record: &NormalizedRecord) -> bool {
        record.suffix() == Some(self.preferred_suffix.as_str())
    }

    /// `Less` means `a` is the better canonical candidate
    pub fn compare(&self, a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
        let by_suffix = self.is_preferred(b).cmp(&self.is_preferred(a));

        let by_opportunities = if self.opportunity_tiebreak {
            b.open_opportunities
                .cmp(&a.open_opportunities)
                .then_with(|| b.closed_opportunities.cmp(&a.closed_opportunities))
        } else {
            Ordering::Equal
        };

        by_suffix
            .then(by_opportunities)
            .then_with(|| a.account_id.cmp(&b.account_id))
    }

    /// Sort group members (indices into `records`) best-first
    pub fn rank(&self, group: &[usize], records: &[NormalizedRecord]) -> Vec<usize> {
        let mut ranked = group.to_vec();
        ranked.sort_by(|&a, &b| self.compare(&records[a], &records[b]));
        ranked
    }

    /// Canonical record plus the rest in rank order; `None` for an empty group
    pub fn pick_canonical(
        &self,
        group: &[usize],
        records: &[NormalizedRecord],
    ) -> Option<(usize, Vec<usize>)> {
        let mut ranked = self.rank(group, records);
        if ranked.is_empty() {
            return None;
        }
        let canonical = ranked.remove(0);
        Some((canonical, ranked))
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Ranker::new("com", true)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DomainStatus, NormalizedDomain};

    fn create_test_record(id: &str, suffix: Option<&str>, open: u64, closed: u64) -> NormalizedRecord {
        let domain = match suffix {
            Some(suffix) => DomainStatus::Parsed(NormalizedDomain {
                host: format!("acme.{}", suffix),
                registrable: format!("acme.{}", suffix),
                suffix: suffix.to_string(),
                label: "acme".to_string(),
            }),
            None => DomainStatus::Absent,
        };

        NormalizedRecord {
            row_index: 0,
            account_id: id.to_string(),
            normalized_name: "acme".to_string(),
            country: Some("germany".to_string()),
            domain,
            open_opportunities: open,
            closed_opportunities: closed,
            existing_parent_id: None,
        }
    }

    #[test]
    fn test_preferred_suffix_beats_opportunities() {
        let ranker = Ranker::default();
        let records = vec![
            create_test_record("1", Some("de"), 50, 50),
            create_test_record("2", Some("com"), 0, 0),
        ];

        let (canonical, rest) = ranker.pick_canonical(&[0, 1], &records).unwrap();

        assert_eq!(records[canonical].account_id, "2");
        assert_eq!(rest, vec![0]);
    }

    #[test]
    fn test_open_then_closed_opportunities() {
        let ranker = Ranker::default();
        let records = vec![
            create_test_record("1", Some("com"), 1, 9),
            create_test_record("2", Some("com"), 3, 0),
            create_test_record("3", Some("com"), 3, 2),
        ];

        let ranked = ranker.rank(&[0, 1, 2], &records);
        let ids: Vec<&str> = ranked.iter().map(|&i| records[i].account_id.as_str()).collect();

        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_account_id_tiebreak() {
        let ranker = Ranker::default();
        let records = vec![
            create_test_record("b-2", Some("com"), 4, 4),
            create_test_record("a-9", Some("com"), 4, 4),
        ];

        let (canonical, _) = ranker.pick_canonical(&[0, 1], &records).unwrap();
        assert_eq!(records[canonical].account_id, "a-9");
    }

    #[test]
    fn test_account_id_is_lexicographic() {
        let ranker = Ranker::default();
        let records = vec![
            create_test_record("2", Some("com"), 0, 0),
            create_test_record("10", Some("com"), 0, 0),
        ];

        let (canonical, _) = ranker.pick_canonical(&[0, 1], &records).unwrap();
        assert_eq!(records[canonical].account_id, "10");
    }

    #[test]
    fn test_opportunity_tiebreak_disabled() {
        let ranker = Ranker::new("com", false);
        let records = vec![
            create_test_record("1", Some("com"), 0, 0),
            create_test_record("2", Some("com"), 99, 99),
        ];

        let (canonical, _) = ranker.pick_canonical(&[1, 0], &records).unwrap();
        assert_eq!(records[canonical].account_id, "1");
    }

    #[test]
    fn test_empty_group() {
        let ranker = Ranker::default();
        assert!(ranker.pick_canonical(&[], &[]).is_none());
    }
}
