// 🗺️ Column Mapping - header names → semantic fields
//
// Upload sources differ only in which literal header names they use. The
// mapping is resolved once per table; the engine only sees AccountRecords.

use serde::{Deserialize, Serialize};

use crate::entities::AccountRecord;
use crate::error::{ConfigurationError, RowError, RowErrorKind};
use crate::table::Table;

// Header aliases tried (in order) when a field is not configured explicitly.
// Compared case-insensitively with non-alphanumerics removed.
const ACCOUNT_ID_ALIASES: &[&str] = &["Account ID", "Account_ID", "AccountId", "Id", "Record ID"];
const NAME_ALIASES: &[&str] = &["Account Name", "Name", "Company Name", "Company", "Organization"];
const DOMAIN_ALIASES: &[&str] = &["Domain", "Website", "Web Domain", "Company Domain", "URL"];
const COUNTRY_ALIASES: &[&str] = &["Billing Country", "Country", "Shipping Country", "HQ Country"];
const OPEN_ALIASES: &[&str] = &["Open Opportunities", "# Open Opportunities", "Open Opps"];
const CLOSED_ALIASES: &[&str] = &[
    "Closed Opportunities",
    "# Closed Opportunities",
    "Closed Won Opportunities",
    "Closed Opps",
];
const PARENT_ALIASES: &[&str] = &["Parent Account ID", "Parent Account", "Parent ID", "ParentId"];

/// Explicit header names per semantic field; `None` means auto-detect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub account_id: Option<String>,
    pub name: Option<String>,
    pub domain: Option<String>,
    pub country: Option<String>,
    pub open_opportunities: Option<String>,
    pub closed_opportunities: Option<String>,
    pub existing_parent_id: Option<String>,
}

/// Column positions resolved against one table's headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnIndex {
    pub account_id: usize,
    pub name: usize,
    pub domain: Option<usize>,
    pub country: Option<usize>,
    pub open_opportunities: Option<usize>,
    pub closed_opportunities: Option<usize>,
    pub existing_parent_id: Option<usize>,
}

impl ColumnMapping {
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnIndex, ConfigurationError> {
        let required = |field: &'static str, explicit: &Option<String>, aliases: &[&str]| {
            locate(headers, field, explicit, aliases)?
                .ok_or(ConfigurationError::MissingColumn { field })
        };

        Ok(ColumnIndex {
            account_id: required("account_id", &self.account_id, ACCOUNT_ID_ALIASES)?,
            name: required("name", &self.name, NAME_ALIASES)?,
            domain: locate(headers, "domain", &self.domain, DOMAIN_ALIASES)?,
            country: locate(headers, "country", &self.country, COUNTRY_ALIASES)?,
            open_opportunities: locate(
                headers,
                "open_opportunities",
                &self.open_opportunities,
                OPEN_ALIASES,
            )?,
            closed_opportunities: locate(
                headers,
                "closed_opportunities",
                &self.closed_opportunities,
                CLOSED_ALIASES,
            )?,
            existing_parent_id: locate(
                headers,
                "existing_parent_id",
                &self.existing_parent_id,
                PARENT_ALIASES,
            )?,
        })
    }
}

fn locate(
    headers: &[String],
    field: &'static str,
    explicit: &Option<String>,
    aliases: &[&str],
) -> Result<Option<usize>, ConfigurationError> {
    if let Some(header) = explicit {
        return headers
            .iter()
            .position(|h| h == header)
            .map(Some)
            .ok_or_else(|| ConfigurationError::UnknownColumn {
                field,
                header: header.clone(),
            });
    }

    let keys: Vec<String> = headers.iter().map(|h| header_key(h)).collect();
    Ok(aliases.iter().find_map(|alias| {
        let alias_key = header_key(alias);
        keys.iter().position(|k| *k == alias_key)
    }))
}

fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// RECORD EXTRACTION
// ============================================================================

impl ColumnIndex {
    /// Turn every table row into an AccountRecord.
    ///
    /// Returns warnings for opportunity cells that are not counts; those
    /// values are treated as missing.
    pub fn extract(&self, table: &Table) -> (Vec<AccountRecord>, Vec<RowError>) {
        let mut records = Vec::with_capacity(table.rows.len());
        let mut warnings = Vec::new();

        for (row_index, row) in table.rows.iter().enumerate() {
            let text = |column: Option<usize>| {
                column
                    .and_then(|c| row.get(c))
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            let account_id = text(Some(self.account_id));
            let mut count = |field: &str, column: Option<usize>| {
                let raw = text(column)?;
                match parse_count(&raw) {
                    Some(n) => Some(n),
                    None => {
                        tracing::warn!(row_index, field, value = %raw, "invalid opportunity count");
                        warnings.push(RowError::new(
                            row_index,
                            account_id.clone(),
                            RowErrorKind::InvalidOpportunityCount {
                                field: field.to_string(),
                                value: raw,
                            },
                        ));
                        None
                    }
                }
            };
            let open_opportunities = count("open_opportunities", self.open_opportunities);
            let closed_opportunities = count("closed_opportunities", self.closed_opportunities);

            records.push(AccountRecord {
                row_index,
                account_id: account_id.clone(),
                name: text(Some(self.name)),
                domain: text(self.domain),
                country: text(self.country),
                open_opportunities,
                closed_opportunities,
                existing_parent_id: text(self.existing_parent_id),
            });
        }

        (records, warnings)
    }
}

/// Accepts `"5"` and integral decimals such as `"5.0"` (spreadsheet exports)
fn parse_count(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn create_test_table(rows: &[&[&str]]) -> Table {
        Table::new(
            headers(&[
                "Account ID",
                "Account Name",
                "Domain",
                "Billing Country",
                "Open Opportunities",
                "Closed Opportunities",
            ]),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_auto_detect_aliases() {
        let index = ColumnMapping::default()
            .resolve(&headers(&["ID", "company_name", "WEBSITE", "Country", "Parent ID"]))
            .unwrap();

        assert_eq!(index.account_id, 0);
        assert_eq!(index.name, 1);
        assert_eq!(index.domain, Some(2));
        assert_eq!(index.country, Some(3));
        assert_eq!(index.open_opportunities, None);
        assert_eq!(index.existing_parent_id, Some(4));
    }

    #[test]
    fn test_explicit_mapping_wins() {
        let mapping = ColumnMapping {
            domain: Some("Primary Site".to_string()),
            ..Default::default()
        };

        let index = mapping
            .resolve(&headers(&["Account ID", "Account Name", "Domain", "Primary Site"]))
            .unwrap();

        assert_eq!(index.domain, Some(3));
    }

    #[test]
    fn test_missing_and_unknown_columns() {
        let err = ColumnMapping::default()
            .resolve(&headers(&["Account ID", "Domain"]))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingColumn { field: "name" });

        let mapping = ColumnMapping {
            country: Some("Region".to_string()),
            ..Default::default()
        };
        let err = mapping
            .resolve(&headers(&["Account ID", "Account Name"]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownColumn {
                field: "country",
                header: "Region".to_string()
            }
        );
    }

    #[test]
    fn test_extract_records() {
        let table = create_test_table(&[
            &["1", " Acme ", "acme.de", "Germany", "2", "1.0"],
            &["2", "", "", "", "", ""],
        ]);
        let index = ColumnMapping::default().resolve(&table.headers).unwrap();

        let (records, warnings) = index.extract(&table);

        assert!(warnings.is_empty());
        assert_eq!(records[0].name.as_deref(), Some("Acme"));
        assert_eq!(records[0].open_opportunities, Some(2));
        assert_eq!(records[0].closed_opportunities, Some(1));
        assert_eq!(records[1].row_index, 1);
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].domain, None);
    }

    #[test]
    fn test_invalid_counts_warn() {
        let table = create_test_table(&[&["1", "Acme", "", "", "-3", "lots"]]);
        let index = ColumnMapping::default().resolve(&table.headers).unwrap();

        let (records, warnings) = index.extract(&table);

        assert_eq!(records[0].open_opportunities, None);
        assert_eq!(records[0].closed_opportunities, None);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].account_id.as_deref(), Some("1"));
        assert!(matches!(
            warnings[1].kind,
            RowErrorKind::InvalidOpportunityCount { ref field, .. } if field == "closed_opportunities"
        ));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("7"), Some(7));
        assert_eq!(parse_count("7.0"), Some(7));
        assert_eq!(parse_count("7.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("NaN"), None);
    }
}
