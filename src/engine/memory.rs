//! In-memory spreadsheet engine.
//!
//! Implements the full engine contract against plain maps so the evaluator
//! and processor can be exercised without a host spreadsheet application.
//! The engine doubles as a test fixture: workbooks can be seeded, sheets can
//! be protected (optionally with a failing unprotect), opens can be made to
//! fail, and saved state plus save counts can be inspected afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use super::{EngineError, Sheet, SpreadsheetEngine, Workbook};

#[derive(Debug, Clone, Default)]
struct SheetData {
    cells: HashMap<(u32, u32), String>,
    protected: bool,
    unprotect_fails: bool,
}

#[derive(Debug, Clone, Default)]
struct StoredWorkbook {
    sheets: IndexMap<String, SheetData>,
    save_count: u32,
    fail_open: Option<String>,
}

type Store = Arc<Mutex<IndexMap<Utf8PathBuf, StoredWorkbook>>>;

/// Engine backed by an in-memory workbook store.
///
/// Saves write the open workbook's sheets back into the store, so a second
/// run over the same engine observes the first run's updates.
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    store: Store,
    cells_read: Arc<AtomicUsize>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a workbook. Each sheet is given as `(name, rows)` where
    /// `rows[i][j]` lands at row `i + 1`, column `j + 1`.
    pub fn add_workbook(&self, path: &str, sheets: Vec<(&str, Vec<Vec<&str>>)>) {
        let mut store = self.store.lock().unwrap();
        let workbook = store.entry(Utf8PathBuf::from(path)).or_default();
        for (name, rows) in sheets {
            let mut data = SheetData::default();
            for (i, row) in rows.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    data.cells
                        .insert((i as u32 + 1, j as u32 + 1), (*value).to_string());
                }
            }
            workbook.sheets.insert(name.to_string(), data);
        }
    }

    /// Mark a sheet protected. With `unprotect_fails` the unprotect retry
    /// also fails, which forces the evaluator's write-error path.
    pub fn protect_sheet(&self, path: &str, sheet: &str, unprotect_fails: bool) {
        let mut store = self.store.lock().unwrap();
        if let Some(data) = store
            .get_mut(Utf8Path::new(path))
            .and_then(|wb| wb.sheets.get_mut(sheet))
        {
            data.protected = true;
            data.unprotect_fails = unprotect_fails;
        }
    }

    /// Make the next opens of this workbook fail with the given reason.
    pub fn fail_open(&self, path: &str, reason: &str) {
        let mut store = self.store.lock().unwrap();
        store
            .entry(Utf8PathBuf::from(path))
            .or_default()
            .fail_open = Some(reason.to_string());
    }

    /// Read a cell from the stored (saved) state of a workbook.
    pub fn cell(&self, path: &str, sheet: &str, row: u32, col: u32) -> Option<String> {
        let store = self.store.lock().unwrap();
        store
            .get(Utf8Path::new(path))
            .and_then(|wb| wb.sheets.get(sheet))
            .and_then(|data| data.cells.get(&(row, col)).cloned())
    }

    /// How many times this workbook has been saved.
    pub fn save_count(&self, path: &str) -> u32 {
        let store = self.store.lock().unwrap();
        store
            .get(Utf8Path::new(path))
            .map(|wb| wb.save_count)
            .unwrap_or(0)
    }

    /// Total cell reads across all opened workbooks.
    pub fn cells_read(&self) -> usize {
        self.cells_read.load(Ordering::Relaxed)
    }
}

impl SpreadsheetEngine for MemoryEngine {
    fn handles(&self, path: &Utf8Path) -> bool {
        self.store.lock().unwrap().contains_key(path)
    }

    fn open_workbook(&self, path: &Utf8Path) -> Result<Box<dyn Workbook>, EngineError> {
        let store = self.store.lock().unwrap();
        let stored = store.get(path).ok_or_else(|| EngineError::Open {
            path: path.to_owned(),
            reason: "workbook not found".to_string(),
        })?;

        if let Some(reason) = &stored.fail_open {
            return Err(EngineError::Open {
                path: path.to_owned(),
                reason: reason.clone(),
            });
        }

        let sheets = stored
            .sheets
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    MemorySheet {
                        data: data.clone(),
                        cells_read: Arc::clone(&self.cells_read),
                    },
                )
            })
            .collect();

        Ok(Box::new(MemoryWorkbook {
            path: path.to_owned(),
            sheets,
            store: Arc::clone(&self.store),
        }))
    }
}

struct MemoryWorkbook {
    path: Utf8PathBuf,
    sheets: IndexMap<String, MemorySheet>,
    store: Store,
}

impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut dyn Sheet> {
        self.sheets
            .get_mut(name)
            .map(|sheet| sheet as &mut dyn Sheet)
    }

    fn save(&mut self) -> Result<(), EngineError> {
        let mut store = self.store.lock().unwrap();
        let stored = store.entry(self.path.clone()).or_default();
        stored.sheets = self
            .sheets
            .iter()
            .map(|(name, sheet)| (name.clone(), sheet.data.clone()))
            .collect();
        stored.save_count += 1;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        Ok(())
    }
}

struct MemorySheet {
    data: SheetData,
    cells_read: Arc<AtomicUsize>,
}

impl Sheet for MemorySheet {
    fn read_cell(&self, row: u32, col: u32) -> String {
        self.cells_read.fetch_add(1, Ordering::Relaxed);
        self.data
            .cells
            .get(&(row, col))
            .cloned()
            .unwrap_or_default()
    }

    fn write_cell(&mut self, row: u32, col: u32, value: &str) -> Result<(), EngineError> {
        if row == 0 || col == 0 {
            return Err(EngineError::OutOfRange { row, col });
        }
        if self.data.protected {
            return Err(EngineError::ProtectedCell { row, col });
        }
        self.data.cells.insert((row, col), value.to_string());
        Ok(())
    }

    fn unprotect(&mut self) -> Result<(), EngineError> {
        if self.data.unprotect_fails {
            return Err(EngineError::UnprotectFailed {
                reason: "sheet is password protected".to_string(),
            });
        }
        self.data.protected = false;
        Ok(())
    }
}
