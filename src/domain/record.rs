// ============================================================
// ROW RECORDS
// ============================================================
// A parsed data row: column header -> cell text. Keys are unique
// per record; ordering carries no meaning downstream.

use std::collections::HashMap;

pub type RowRecord = HashMap<String, String>;
