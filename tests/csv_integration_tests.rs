//! End-to-end tests with the CSV engine: config file in, patched CSV files
//! and a run summary out.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use sheetpatch::engine::CsvEngine;
use sheetpatch::services::{BatchError, FileProcessor};
use sheetpatch::{ConfigManager, GeneralSettings};
use tempfile::TempDir;

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
}

fn write_config(dir: &Utf8Path, folder: &Utf8Path, settings_json: &str) -> Utf8PathBuf {
    let path = dir.join("config.json");
    let contents = format!(
        r#"{{
            "general_settings": {settings_json},
            "folder_paths": {{
                "windows": "{folder}",
                "mac": "{folder}",
                "linux": "{folder}"
            }},
            "search_and_update_rules": [
                {{
                    "name": "Reprice widgets",
                    "sheet_name": "prices",
                    "search_column": "A",
                    "search_value": "Product123",
                    "update_column": "B",
                    "target_value": "99.99"
                }}
            ]
        }}"#
    );
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_driven_run_patches_csv_on_disk() {
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    let csv_path = folder.join("prices.csv");
    fs::write(&csv_path, "Product123,10.00\nother,5.00\n  product123  ,99.99\n").unwrap();

    let config_path = write_config(&folder, &folder, r#"{"process_delay_seconds": 0.0}"#);
    let config = ConfigManager::new(&config_path)
        .load_for_platform("linux")
        .unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    let summary = processor.run_batch(&config.folder, &config.rules).unwrap();

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.files_succeeded, 1);
    // Row 1 matches and gets patched; row 3 matches but already holds the
    // target, so only one update lands
    assert_eq!(summary.total_updates, 1);
    assert_eq!(summary.per_rule[0].matches_found, 2);

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(contents, "Product123,99.99\nother,5.00\n  product123  ,99.99\n");
}

#[test]
fn test_no_changes_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    let csv_path = folder.join("prices.csv");
    let original = "other,5.00\n";
    fs::write(&csv_path, original).unwrap();
    let before = fs::metadata(&csv_path).unwrap().modified().unwrap();

    let config_path = write_config(&folder, &folder, r#"{"process_delay_seconds": 0.0}"#);
    let config = ConfigManager::new(&config_path)
        .load_for_platform("linux")
        .unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    let summary = processor.run_batch(&config.folder, &config.rules).unwrap();

    assert_eq!(summary.total_updates, 0);
    assert_eq!(summary.files_succeeded, 1);
    // Save was skipped, so the file was never rewritten
    assert_eq!(fs::read_to_string(&csv_path).unwrap(), original);
    assert_eq!(fs::metadata(&csv_path).unwrap().modified().unwrap(), before);
}

#[test]
fn test_backup_created_before_patching() {
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    let csv_path = folder.join("prices.csv");
    fs::write(&csv_path, "Product123,10.00\n").unwrap();

    let config_path = write_config(
        &folder,
        &folder,
        r#"{"enable_backups": true, "process_delay_seconds": 0.0}"#,
    );
    let config = ConfigManager::new(&config_path)
        .load_for_platform("linux")
        .unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    processor.run_batch(&config.folder, &config.rules).unwrap();

    let backup_dir = folder.join("backups");
    let backups: Vec<_> = backup_dir
        .read_dir_utf8()
        .unwrap()
        .map(|e| e.unwrap().path().to_owned())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].file_name().unwrap().ends_with("_prices.csv"));
    // The backup holds the pre-patch contents
    assert_eq!(
        fs::read_to_string(&backups[0]).unwrap(),
        "Product123,10.00\n"
    );
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "Product123,99.99\n"
    );
}

#[test]
fn test_temp_and_foreign_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    fs::write(folder.join("prices.csv"), "Product123,10.00\n").unwrap();
    fs::write(folder.join("~$prices.csv"), "Product123,10.00\n").unwrap();
    fs::write(folder.join("notes.txt"), "not a workbook\n").unwrap();

    let config_path = write_config(&folder, &folder, r#"{"process_delay_seconds": 0.0}"#);
    let config = ConfigManager::new(&config_path)
        .load_for_platform("linux")
        .unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    let summary = processor.run_batch(&config.folder, &config.rules).unwrap();

    assert_eq!(summary.files_processed, 1);
    // The lock-style temp file is untouched
    assert_eq!(
        fs::read_to_string(folder.join("~$prices.csv")).unwrap(),
        "Product123,10.00\n"
    );
}

#[test]
fn test_folder_without_workbooks_is_a_startup_error() {
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    fs::write(folder.join("notes.txt"), "nothing to patch\n").unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(
        &engine,
        GeneralSettings {
            process_delay_seconds: 0.0,
            ..GeneralSettings::default()
        },
    );
    let result = processor.run_batch(&folder, &[]);
    assert!(matches!(result, Err(BatchError::NoFilesFound(_))));
}

#[test]
fn test_rules_only_apply_to_their_named_sheet() {
    // The CSV engine names each file's single sheet after the file stem, so
    // a rule for "prices" leaves other CSV files alone.
    let dir = TempDir::new().unwrap();
    let folder = utf8(&dir);
    fs::write(folder.join("prices.csv"), "Product123,10.00\n").unwrap();
    fs::write(folder.join("inventory.csv"), "Product123,10.00\n").unwrap();

    let config_path = write_config(&folder, &folder, r#"{"process_delay_seconds": 0.0}"#);
    let config = ConfigManager::new(&config_path)
        .load_for_platform("linux")
        .unwrap();

    let engine = CsvEngine::new();
    let processor = FileProcessor::new(&engine, config.settings.clone());
    let summary = processor.run_batch(&config.folder, &config.rules).unwrap();

    // Both files are processed and succeed; only prices.csv changes
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_succeeded, 2);
    assert_eq!(summary.total_updates, 1);
    assert_eq!(
        fs::read_to_string(folder.join("prices.csv")).unwrap(),
        "Product123,99.99\n"
    );
    assert_eq!(
        fs::read_to_string(folder.join("inventory.csv")).unwrap(),
        "Product123,10.00\n"
    );
}
