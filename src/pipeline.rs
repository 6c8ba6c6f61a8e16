// 🚰 Pipeline - table in, augmented table + row errors + summary out
//
// config → columns → records → resolve → project → summarize

use crate::config::ResolverConfig;
use crate::error::{ConfigurationError, RowError};
use crate::projector::project;
use crate::resolver::{Resolution, Resolver};
use crate::summary::ResolutionSummary;
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct Outcome {
    /// Original columns plus `Account Type` and `Proposed Parent Account ID`
    pub table: Table,

    /// Row errors from column extraction and resolution, in row order
    pub errors: Vec<RowError>,

    pub resolution: Resolution,
    pub summary: ResolutionSummary,
}

/// Run the full engine on a mapped table.
///
/// Configuration problems (bad threshold, bad suffix, missing columns) abort
/// before any row is processed. Row problems never abort the run.
pub fn run(table: &Table, config: &ResolverConfig) -> Result<Outcome, ConfigurationError> {
    let resolver = Resolver::new(config.clone())?;
    let columns = config.columns.resolve(&table.headers)?;
    tracing::debug!(?columns, "columns resolved");

    let (records, mut errors) = columns.extract(table);
    tracing::info!(rows = records.len(), "records extracted");

    let resolution = resolver.resolve(&records);
    errors.extend(resolution.errors.iter().cloned());
    errors.sort_by_key(|e| e.row_index);

    let summary = ResolutionSummary::new(&records, &resolution, &errors);
    tracing::info!(fingerprint = %summary.fingerprint, "{}", summary.summary());

    Ok(Outcome {
        table: project(table, &resolution),
        errors,
        resolution,
        summary,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_rejects_bad_config_before_rows() {
        let table = Table::new(vec!["Account ID".to_string()], vec![vec!["1".to_string()]]);

        let err = run(&table, &ResolverConfig::default()).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingColumn { field: "name" });

        let config = ResolverConfig {
            preferred_suffix: "c m".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            run(&table, &config),
            Err(ConfigurationError::InvalidPreferredSuffix(_))
        ));
    }
}
