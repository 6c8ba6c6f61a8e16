// 🧹 Normalizer - canonical forms for domain, name and country
// Pure functions: normalizing an already-normalized value returns it unchanged.

use crate::entities::{AccountRecord, DomainStatus, NormalizedDomain, NormalizedRecord};
use crate::error::{RowError, RowErrorKind};

/// Spellings folded onto one country key before comparison
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("us", "united states"),
    ("usa", "united states"),
    ("united states of america", "united states"),
    ("uk", "united kingdom"),
    ("gb", "united kingdom"),
    ("great britain", "united kingdom"),
    ("de", "germany"),
    ("deu", "germany"),
    ("deutschland", "germany"),
    ("fr", "france"),
    ("at", "austria"),
    ("österreich", "austria"),
    ("ch", "switzerland"),
    ("schweiz", "switzerland"),
    ("nl", "netherlands"),
    ("the netherlands", "netherlands"),
    ("holland", "netherlands"),
    ("es", "spain"),
    ("españa", "spain"),
    ("it", "italy"),
    ("ca", "canada"),
    ("au", "australia"),
];

// ============================================================================
// RECORD
// ============================================================================

/// Build the normalized view of one record.
///
/// Fails when `account_id` or `name` is missing, since neither identity nor
/// fuzzy matching is possible without them.
pub fn normalize(record: &AccountRecord) -> Result<NormalizedRecord, RowError> {
    let account_id = record
        .account_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing(record, "account_id"))?
        .to_string();

    let normalized_name = record
        .name
        .as_deref()
        .and_then(normalize_name)
        .ok_or_else(|| missing(record, "name"))?;

    let domain = match record.domain.as_deref() {
        Some(raw) => normalize_domain(raw),
        None => DomainStatus::Absent,
    };

    Ok(NormalizedRecord {
        row_index: record.row_index,
        account_id,
        normalized_name,
        country: record.country.as_deref().and_then(normalize_country),
        domain,
        open_opportunities: record.open_opportunities.unwrap_or(0),
        closed_opportunities: record.closed_opportunities.unwrap_or(0),
        existing_parent_id: record
            .existing_parent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    })
}

fn missing(record: &AccountRecord, field: &str) -> RowError {
    RowError::new(
        record.row_index,
        record.account_id.clone(),
        RowErrorKind::MissingRequiredField {
            field: field.to_string(),
        },
    )
}

// ============================================================================
// NAME
// ============================================================================

/// Lower-case, collapse whitespace, strip surrounding punctuation.
/// Returns `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let collapsed = raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| !c.is_alphanumeric());

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// COUNTRY
// ============================================================================

pub fn normalize_country(raw: &str) -> Option<String> {
    let cleaned = strip_quotes(raw)
        .to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        return None;
    }

    let key = COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == cleaned)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(cleaned);

    Some(key)
}

// ============================================================================
// DOMAIN
// ============================================================================

/// Normalize a raw domain cell.
///
/// Accepts bare domains as well as URLs (`https://www.acme.com/about`).
/// The split into registrable domain and suffix uses the Public Suffix List,
/// so `shop.example.co.uk` resolves to `example.co.uk` / `co.uk`.
pub fn normalize_domain(raw: &str) -> DomainStatus {
    let cleaned = strip_quotes(raw).to_lowercase();
    if cleaned.is_empty() {
        return DomainStatus::Absent;
    }

    match split_domain(&cleaned) {
        Some(domain) => DomainStatus::Parsed(domain),
        None => DomainStatus::Ambiguous(raw.trim().to_string()),
    }
}

fn split_domain(value: &str) -> Option<NormalizedDomain> {
    let host = extract_host(value)?;

    let valid_chars = host
        .split('.')
        .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    if !valid_chars {
        return None;
    }

    // Private PSL entries count as suffixes: acme.github.io splits as
    // label `acme` under `github.io`, not as the registrable `github.io`.
    let known_suffix = psl::suffix(host.as_bytes()).map_or(false, |s| s.is_known());
    if !known_suffix {
        return None;
    }

    let registrable = psl::domain_str(host)?;
    let suffix = psl::suffix_str(host)?;
    let label = registrable.strip_suffix(suffix)?.strip_suffix('.')?;

    Some(NormalizedDomain {
        host: host.to_string(),
        registrable: registrable.to_string(),
        suffix: suffix.to_string(),
        label: label.to_string(),
    })
}

/// Reduce a URL-ish value to its host: drop scheme, userinfo, path, port,
/// trailing dot and a leading `www.`.
fn extract_host(value: &str) -> Option<&str> {
    let without_scheme = match value.find("://") {
        Some(pos) => &value[pos + 3..],
        None => value,
    };

    let authority = without_scheme
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

// ============================================================================
// TESTS
// ============================================================================
