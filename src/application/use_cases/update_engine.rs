// ============================================================
// UPDATE RESOLUTION ENGINE
// ============================================================
// Applies filtered spreadsheet rows as updates against the
// year-partitioned databases. The caller is a human reviewing an
// upload of potentially hundreds of cells, so the engine returns
// one outcome per (row, mapped column) and converts every failure
// into data instead of aborting the batch: a row whose year has no
// database fails alone, a column whose indicator is unknown fails
// alone, and an update that matches nothing is a logical failure
// with rows_updated = 0, not an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{error, info};

use crate::domain::outcome::UpdateOutcome;
use crate::domain::record::RowRecord;
use crate::domain::year::{to_display_value, to_registry_key};
use crate::infrastructure::db::YearRegistry;

/// Attribute coding signalling that the partitioned databases store
/// academic years in the compact "start-YY" form.
const COMPACT_YEAR_CODING: &str = "YY-ZZ";

/// The single statement shape this engine executes. Matching is by
/// indicator name and exact composite coding; a hit also marks the
/// instance valid and stamps the caller-supplied modification date.
const UPDATE_SQL: &str = "UPDATE indicator_instance \
     SET field = $1, valid = true, modified_date = $2 \
     WHERE indicator_name = $3 AND coding = $4";

/// Optional attribute dimension of an update request: the attribute's
/// stored coding (resolved once from the catalog) and the source
/// column holding its per-row value.
#[derive(Debug, Clone)]
pub struct AttributeSelector {
    pub coding: String,
    pub value_column: String,
}

/// Everything the caller supplies for one update request.
#[derive(Debug, Clone)]
pub struct UpdateSpec {
    pub process_id: i32,
    /// Source column -> indicator name.
    pub column_mapping: HashMap<String, String>,
    pub modified_date: NaiveDate,
    /// Column holding each row's academic year.
    pub year_column: String,
    pub attribute: Option<AttributeSelector>,
}

pub struct UpdateEngine<'a> {
    registry: &'a YearRegistry,
}

impl<'a> UpdateEngine<'a> {
    pub fn new(registry: &'a YearRegistry) -> Self {
        Self { registry }
    }

    /// Process every row strictly in order, one blocking round-trip
    /// per mapped column. Never returns early: the outcome list has
    /// one entry per (row, mapped column) pair.
    pub async fn apply(&self, spec: &UpdateSpec, rows: &[RowRecord]) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::new();

        for row in rows {
            let raw_year = row.get(&spec.year_column).cloned().unwrap_or_default();
            let year = to_registry_key(&raw_year);

            let Some(pool) = self.registry.resolve(&year) else {
                let reason = format!("No database connection for year {}", year);
                self.fail_whole_row(&mut outcomes, spec, row, &year, &reason);
                continue;
            };

            let Some(process_coding) = process_coding(pool, spec.process_id).await else {
                let reason = format!("Process not found for id: {}", spec.process_id);
                self.fail_whole_row(&mut outcomes, spec, row, &year, &reason);
                continue;
            };

            for (column, indicator_name) in &spec.column_mapping {
                outcomes.push(
                    self.apply_cell(pool, spec, row, &year, &process_coding, column, indicator_name)
                        .await,
                );
            }
        }

        info!(
            "Update batch finished: {} outcome(s), {} failed",
            outcomes.len(),
            outcomes.iter().filter(|o| !o.success).count()
        );
        outcomes
    }

    /// One failed outcome per mapped column; the row is abandoned.
    fn fail_whole_row(
        &self,
        outcomes: &mut Vec<UpdateOutcome>,
        spec: &UpdateSpec,
        row: &RowRecord,
        year: &str,
        reason: &str,
    ) {
        for (column, indicator_name) in &spec.column_mapping {
            outcomes.push(UpdateOutcome::failed(
                year,
                column,
                indicator_name,
                row.get(column).cloned(),
                reason,
            ));
        }
    }

    /// One mapped column of one row; faults stay inside this cell.
    async fn apply_cell(
        &self,
        pool: &PgPool,
        spec: &UpdateSpec,
        row: &RowRecord,
        year: &str,
        process_coding: &str,
        column: &str,
        indicator_name: &str,
    ) -> UpdateOutcome {
        let value = row.get(column).cloned();

        let Some(indicator_coding) = indicator_coding(pool, indicator_name).await else {
            return UpdateOutcome::failed(
                year,
                column,
                indicator_name,
                value,
                format!("Indicator not found: {}", indicator_name),
            );
        };

        let attribute_value = match &spec.attribute {
            None => None,
            Some(attr) => match row.get(&attr.value_column).map(|v| v.trim()) {
                Some(raw) if !raw.is_empty() => {
                    Some(attribute_display_value(raw, &attr.coding))
                }
                _ => {
                    return UpdateOutcome::failed(
                        year,
                        column,
                        indicator_name,
                        value,
                        format!("Attribute value empty in column: {}", attr.value_column),
                    );
                }
            },
        };

        // Recomputed fresh for every attempt, never cached across rows.
        let composite = composite_code(process_coding, &indicator_coding, attribute_value.as_deref());

        let result = sqlx::query(UPDATE_SQL)
            .bind(value.clone())
            .bind(spec.modified_date)
            .bind(indicator_name)
            .bind(&composite)
            .execute(pool)
            .await;

        execution_outcome(
            result.map(|done| done.rows_affected()),
            year,
            column,
            indicator_name,
            value,
            &composite,
        )
    }
}

/// Fold the statement result into an outcome. Zero affected rows is
/// a logical failure, not an error: the composite coding matched no
/// indicator instance. An execution fault becomes a failed record
/// carrying the driver's message; neither aborts the batch.
fn execution_outcome(
    result: std::result::Result<u64, sqlx::Error>,
    year: &str,
    column: &str,
    indicator_name: &str,
    value: Option<String>,
    composite: &str,
) -> UpdateOutcome {
    match result {
        Ok(rows) if rows > 0 => UpdateOutcome::applied(year, column, indicator_name, value, rows),
        Ok(_) => UpdateOutcome::failed(
            year,
            column,
            indicator_name,
            value,
            format!(
                "No rows updated: no indicator instance matched coding {}",
                composite
            ),
        ),
        Err(e) => {
            error!("Update failed for coding {}: {}", composite, e);
            UpdateOutcome::failed(year, column, indicator_name, value, e.to_string())
        }
    }
}

/// `process-indicator`, extended to `process-indicator[value]` when
/// an attribute value applies.
fn composite_code(process: &str, indicator: &str, attribute_value: Option<&str>) -> String {
    match attribute_value {
        Some(value) => format!("{}-{}[{}]", process, indicator, value),
        None => format!("{}-{}", process, indicator),
    }
}

/// Attribute values pass through verbatim unless the attribute's own
/// coding is the compact-year sentinel; only then is the raw value
/// rewritten to the "start-YY" display form. Other codings are never
/// converted even when the value looks like a year range.
fn attribute_display_value(raw: &str, attribute_coding: &str) -> String {
    if attribute_coding == COMPACT_YEAR_CODING {
        to_display_value(raw)
    } else {
        raw.to_string()
    }
}

/// Coding of the target process in the year database. Misses and
/// query faults both read as "not found"; the row reports it and the
/// batch moves on.
async fn process_coding(pool: &PgPool, process_id: i32) -> Option<String> {
    let result = sqlx::query_scalar::<_, String>("SELECT coding FROM process WHERE id = $1")
        .bind(process_id)
        .fetch_optional(pool)
        .await;

    match result {
        Ok(Some(coding)) if !coding.trim().is_empty() => Some(coding),
        Ok(_) => None,
        Err(e) => {
            error!("Failed to fetch process coding for id {}: {}", process_id, e);
            None
        }
    }
}

/// Coding of an indicator, looked up by name in the year database.
async fn indicator_coding(pool: &PgPool, indicator_name: &str) -> Option<String> {
    let result = sqlx::query_scalar::<_, String>(
        "SELECT coding FROM indicator WHERE indicator_name = $1",
    )
    .bind(indicator_name)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(Some(coding)) if !coding.trim().is_empty() => Some(coding),
        Ok(_) => None,
        Err(e) => {
            error!(
                "Failed to fetch indicator coding for '{}': {}",
                indicator_name, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RowRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn spec(mapping: &[(&str, &str)]) -> UpdateSpec {
        UpdateSpec {
            process_id: 3,
            column_mapping: mapping
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            modified_date: NaiveDate::from_ymd_opt(2022, 9, 12).unwrap(),
            year_column: "Año académico".to_string(),
            attribute: None,
        }
    }

    #[test]
    fn test_composite_code_shapes() {
        assert_eq!(composite_code("P3", "I7", None), "P3-I7");
        assert_eq!(composite_code("P3", "I7", Some("2021-22")), "P3-I7[2021-22]");
    }

    #[test]
    fn test_attribute_value_converted_only_for_the_sentinel_coding() {
        assert_eq!(attribute_display_value("2021-2022", "YY-ZZ"), "2021-22");
        // Non-sentinel codings pass year-shaped values through untouched.
        assert_eq!(attribute_display_value("2021-2022", "GRUPO"), "2021-2022");
        assert_eq!(attribute_display_value("mañana", "YY-ZZ"), "mañana");
    }

    #[test]
    fn test_affected_rows_report_success_with_the_count() {
        let outcome = execution_outcome(
            Ok(2),
            "2021_2022",
            "Nota",
            "nota media",
            Some("8.5".into()),
            "P3-I7",
        );
        assert!(outcome.success);
        assert_eq!(outcome.rows_updated, 2);
        assert!(outcome.error_message.is_none());
    }

    #[test]
    fn test_zero_affected_rows_is_a_logical_failure() {
        let outcome = execution_outcome(
            Ok(0),
            "2021_2022",
            "Nota",
            "nota media",
            Some("8.5".into()),
            "P3-I7",
        );
        assert!(!outcome.success);
        assert_eq!(outcome.rows_updated, 0);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("No rows updated: no indicator instance matched coding P3-I7")
        );
        assert_eq!(outcome.value.as_deref(), Some("8.5"));
    }

    #[test]
    fn test_execution_fault_becomes_a_failed_record() {
        let outcome = execution_outcome(
            Err(sqlx::Error::PoolTimedOut),
            "2021_2022",
            "Nota",
            "nota media",
            None,
            "P3-I7",
        );
        assert!(!outcome.success);
        assert_eq!(outcome.rows_updated, 0);
        assert_eq!(
            outcome.error_message,
            Some(sqlx::Error::PoolTimedOut.to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_database_fails_the_rows_without_aborting() {
        let options = sqlx::postgres::PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("indicators")
            .username("app");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy_with(options);
        let registry = YearRegistry::from_pools(HashMap::from([("2021_2022".to_string(), pool)]));
        let engine = UpdateEngine::new(&registry);
        let spec = spec(&[("Nota", "nota media")]);

        let rows = vec![
            row(&[("Año académico", "2021-22"), ("Nota", "8.5")]),
            row(&[("Año académico", "2021-22"), ("Nota", "7.9")]),
        ];
        let outcomes = engine.apply(&spec, &rows).await;

        // The process lookup is the first statement to hit the pool;
        // its fault reads as not found and the batch moves on.
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.success && o.rows_updated == 0));
        assert!(outcomes.iter().all(|o| o
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Process not found")));
    }

    #[tokio::test]
    async fn test_unconfigured_year_fails_per_column_and_continues() {
        let registry = YearRegistry::from_pools(HashMap::new());
        let engine = UpdateEngine::new(&registry);
        let spec = spec(&[("Nota", "nota media"), ("Aprobados", "tasa aprobados")]);

        let rows = vec![
            row(&[("Año académico", "2021-22"), ("Nota", "8.5"), ("Aprobados", "120")]),
            row(&[("Año académico", "2022-23"), ("Nota", "7.9"), ("Aprobados", "98")]),
            row(&[("Año académico", "2023-24"), ("Nota", "8.1"), ("Aprobados", "104")]),
        ];

        let outcomes = engine.apply(&spec, &rows).await;

        // One outcome per (row, mapped column); nothing aborts the batch.
        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(|o| !o.success && o.rows_updated == 0));
        assert!(outcomes
            .iter()
            .all(|o| o.error_message.as_deref().unwrap().starts_with("No database connection")));

        let first_row_years: Vec<_> = outcomes[..2]
            .iter()
            .map(|o| o.year.as_deref().unwrap())
            .collect();
        assert_eq!(first_row_years, vec!["2021_2022", "2021_2022"]);
        assert_eq!(outcomes[5].year.as_deref(), Some("2023_2024"));
    }

    #[tokio::test]
    async fn test_row_without_year_column_still_produces_outcomes() {
        let registry = YearRegistry::from_pools(HashMap::new());
        let engine = UpdateEngine::new(&registry);
        let spec = spec(&[("Nota", "nota media")]);

        let outcomes = engine.apply(&spec, &[row(&[("Nota", "8.5")])]).await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].value.as_deref(), Some("8.5"));
    }
}
