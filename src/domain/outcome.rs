// ============================================================
// UPDATE OUTCOMES
// ============================================================
// One record per attempted (data row x mapped column) update.
// Failures are data, not errors; the full list is the engine's
// only output and serializes as-is to the caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// Registry key of the database the update targeted, when known.
    pub year: Option<String>,

    /// Source column of the spreadsheet.
    pub column: Option<String>,

    /// Indicator the column was mapped to.
    pub indicator: Option<String>,

    /// Raw cell value carried into the update.
    pub value: Option<String>,

    pub success: bool,

    /// Rows matched by the update statement; zero on any failure.
    pub rows_updated: u64,

    pub error_message: Option<String>,
}

impl UpdateOutcome {
    pub fn applied(year: &str, column: &str, indicator: &str, value: Option<String>, rows: u64) -> Self {
        Self {
            year: Some(year.to_string()),
            column: Some(column.to_string()),
            indicator: Some(indicator.to_string()),
            value,
            success: true,
            rows_updated: rows,
            error_message: None,
        }
    }

    pub fn failed(
        year: &str,
        column: &str,
        indicator: &str,
        value: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            year: Some(year.to_string()),
            column: Some(column.to_string()),
            indicator: Some(indicator.to_string()),
            value,
            success: false,
            rows_updated: 0,
            error_message: Some(reason.into()),
        }
    }

    /// Single synthetic record for a failure that aborts the whole
    /// request before any row is processed.
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self {
            year: None,
            column: None,
            indicator: None,
            value: None,
            success: false,
            rows_updated: 0,
            error_message: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_original_field_names() {
        let outcome = UpdateOutcome::failed("2021_2022", "Nota", "nota media", None, "boom");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["year"], "2021_2022");
        assert_eq!(json["rowsUpdated"], 0);
        assert_eq!(json["errorMessage"], "boom");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_precondition_record_carries_only_the_message() {
        let outcome = UpdateOutcome::precondition("no data for file id");
        assert!(outcome.year.is_none() && outcome.column.is_none());
        assert!(!outcome.success);
    }
}
