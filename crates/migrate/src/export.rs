#![forbid(unsafe_code)]

use crate::error::MigrateError;
use kt_storage::KeyStore;
use serde::Serialize;
use std::path::Path;

/// Project the store's three tables to JSON documents for the dashboard:
/// `keys.json`, `criteria.json`, `undologs.json` inside `data_dir`
/// (created if absent). Arrays of objects ordered by ascending id; existing
/// files are overwritten unconditionally. An empty store yields three empty
/// arrays.
pub fn export(db_path: &Path, data_dir: &Path) -> Result<(), MigrateError> {
    std::fs::create_dir_all(data_dir)?;
    let store = KeyStore::open(db_path)?;
    write_json(&data_dir.join("keys.json"), &store.list_keys()?)?;
    write_json(&data_dir.join("criteria.json"), &store.list_criteria()?)?;
    write_json(&data_dir.join("undologs.json"), &store.list_undo_logs()?)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), MigrateError> {
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json)?;
    Ok(())
}
