// ============================================================
// COLUMN FILTER
// ============================================================
// Shrinks each record to the columns the update cares about: the
// mapped source columns plus the academic-year column, which must
// survive even when it is not itself mapped to an indicator.

use std::collections::HashMap;

use crate::domain::record::RowRecord;

pub fn filter_columns(
    rows: &[RowRecord],
    column_mapping: &HashMap<String, String>,
    year_column: &str,
) -> Vec<RowRecord> {
    rows.iter()
        .map(|row| {
            row.iter()
                .filter(|(name, _)| column_mapping.contains_key(*name) || *name == year_column)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        })
        .collect()
}
