//! CSV-backed spreadsheet engine.
//!
//! Presents each `.csv` file as a single-sheet workbook whose sheet name is
//! the file stem, so rules can target CSV data without a host spreadsheet
//! application. CSV has no protection concept, so `unprotect` is a no-op.

use camino::{Utf8Path, Utf8PathBuf};

use super::{EngineError, Sheet, SpreadsheetEngine, Workbook};

/// Engine that reads and writes `.csv` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvEngine;

impl CsvEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetEngine for CsvEngine {
    fn handles(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }

    fn open_workbook(&self, path: &Utf8Path) -> Result<Box<dyn Workbook>, EngineError> {
        let open_err = |reason: String| EngineError::Open {
            path: path.to_owned(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| open_err(e.to_string()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| open_err(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let name = path.file_stem().unwrap_or("Sheet1").to_string();

        Ok(Box::new(CsvWorkbook {
            path: path.to_owned(),
            sheet: CsvSheet { name, rows },
        }))
    }
}

struct CsvWorkbook {
    path: Utf8PathBuf,
    sheet: CsvSheet,
}

impl Workbook for CsvWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.name.clone()]
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn Sheet> {
        if self.sheet.name == name {
            Some(&mut self.sheet as &mut dyn Sheet)
        } else {
            None
        }
    }

    fn save(&mut self) -> Result<(), EngineError> {
        let save_err = |reason: String| EngineError::Save { reason };

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| save_err(e.to_string()))?;

        for row in &self.sheet.rows {
            if row.is_empty() {
                // The csv writer rejects zero-field records; rows grown past
                // the original data are written as a single blank field.
                writer
                    .write_record([""])
                    .map_err(|e| save_err(e.to_string()))?;
            } else {
                writer
                    .write_record(row)
                    .map_err(|e| save_err(e.to_string()))?;
            }
        }

        writer.flush().map_err(|e| save_err(e.to_string()))?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        Ok(())
    }
}

struct CsvSheet {
    name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet for CsvSheet {
    fn read_cell(&self, row: u32, col: u32) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn write_cell(&mut self, row: u32, col: u32, value: &str) -> Result<(), EngineError> {
        if row == 0 || col == 0 {
            return Err(EngineError::OutOfRange { row, col });
        }

        let row = row as usize - 1;
        let col = col as usize - 1;

        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    fn unprotect(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_handles_csv_extension_only() {
        let engine = CsvEngine::new();
        assert!(engine.handles(Utf8Path::new("data.csv")));
        assert!(engine.handles(Utf8Path::new("DATA.CSV")));
        assert!(!engine.handles(Utf8Path::new("data.xlsx")));
        assert!(!engine.handles(Utf8Path::new("data")));
    }

    #[test]
    fn test_sheet_name_is_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "inventory.csv", "a,b\n");

        let engine = CsvEngine::new();
        let workbook = engine.open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["inventory".to_string()]);
    }

    #[test]
    fn test_read_cells_one_indexed() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a,b\nc,d\n");

        let engine = CsvEngine::new();
        let mut workbook = engine.open_workbook(&path).unwrap();
        let sheet = workbook.sheet_mut("data").unwrap();

        assert_eq!(sheet.read_cell(1, 1), "a");
        assert_eq!(sheet.read_cell(2, 2), "d");
        assert_eq!(sheet.read_cell(3, 1), "");
        assert_eq!(sheet.read_cell(1, 5), "");
    }

    #[test]
    fn test_write_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a,b\nc,d\n");

        let engine = CsvEngine::new();
        let mut workbook = engine.open_workbook(&path).unwrap();
        workbook
            .sheet_mut("data")
            .unwrap()
            .write_cell(2, 2, "patched")
            .unwrap();
        workbook.save().unwrap();
        workbook.close().unwrap();

        let mut reopened = engine.open_workbook(&path).unwrap();
        let sheet = reopened.sheet_mut("data").unwrap();
        assert_eq!(sheet.read_cell(1, 1), "a");
        assert_eq!(sheet.read_cell(2, 2), "patched");
    }

    #[test]
    fn test_write_grows_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a\n");

        let engine = CsvEngine::new();
        let mut workbook = engine.open_workbook(&path).unwrap();
        workbook
            .sheet_mut("data")
            .unwrap()
            .write_cell(4, 3, "far")
            .unwrap();
        workbook.save().unwrap();

        let mut reopened = engine.open_workbook(&path).unwrap();
        let sheet = reopened.sheet_mut("data").unwrap();
        assert_eq!(sheet.read_cell(4, 3), "far");
        assert_eq!(sheet.read_cell(1, 1), "a");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let engine = CsvEngine::new();
        let result = engine.open_workbook(Utf8Path::new("/nonexistent/nope.csv"));
        assert!(matches!(result, Err(EngineError::Open { .. })));
    }

    #[test]
    fn test_missing_sheet_name_returns_none() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a\n");

        let engine = CsvEngine::new();
        let mut workbook = engine.open_workbook(&path).unwrap();
        assert!(workbook.sheet_mut("Other").is_none());
    }
}
