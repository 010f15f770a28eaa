//! In-memory store of parsed uploads, keyed by a generated file id.
//! A delimited upload stores one flat table; a workbook stores its
//! sheets in workbook order so the first sheet can act as default.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::record::RowRecord;

#[derive(Debug, Clone)]
pub enum StoredFile {
    /// Single-table source (delimited text).
    Table(Vec<RowRecord>),
    /// Multi-sheet source: (sheet name, rows), in workbook order.
    Workbook(Vec<(String, Vec<RowRecord>)>),
}

impl StoredFile {
    pub fn sheet_names(&self) -> Option<Vec<String>> {
        match self {
            StoredFile::Table(_) => None,
            StoredFile::Workbook(sheets) => {
                Some(sheets.iter().map(|(name, _)| name.clone()).collect())
            }
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&[RowRecord]> {
        match self {
            StoredFile::Table(_) => None,
            StoredFile::Workbook(sheets) => sheets
                .iter()
                .find(|(sheet, _)| sheet == name)
                .map(|(_, rows)| rows.as_slice()),
        }
    }

    /// Rows shown when no sheet is named: the table itself, or the
    /// workbook's first sheet.
    pub fn default_rows(&self) -> Option<&[RowRecord]> {
        match self {
            StoredFile::Table(rows) => Some(rows.as_slice()),
            StoredFile::Workbook(sheets) => sheets.first().map(|(_, rows)| rows.as_slice()),
        }
    }
}

#[derive(Default)]
pub struct FileStore {
    files: RwLock<HashMap<String, StoredFile>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a parsed file and return its generated id.
    pub async fn insert(&self, file: StoredFile) -> String {
        let id = Uuid::new_v4().to_string();
        self.files.write().await.insert(id.clone(), file);
        id
    }

    pub async fn get(&self, file_id: &str) -> Option<StoredFile> {
        self.files.read().await.get(file_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str) -> RowRecord {
        RowRecord::from([("col".to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trip() {
        let store = FileStore::new();
        let id = store.insert(StoredFile::Table(vec![row("x")])).await;

        match store.get(&id).await {
            Some(StoredFile::Table(rows)) => assert_eq!(rows[0]["col"], "x"),
            other => panic!("unexpected stored file: {:?}", other),
        }
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_workbook_defaults_to_first_sheet() {
        let store = FileStore::new();
        let file = StoredFile::Workbook(vec![
            ("Hoja1".to_string(), vec![row("a")]),
            ("Hoja2".to_string(), vec![row("b")]),
        ]);
        let id = store.insert(file).await;

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.default_rows().unwrap()[0]["col"], "a");
        assert_eq!(stored.sheet("Hoja2").unwrap()[0]["col"], "b");
        assert_eq!(
            stored.sheet_names().unwrap(),
            vec!["Hoja1".to_string(), "Hoja2".to_string()]
        );
    }
}
