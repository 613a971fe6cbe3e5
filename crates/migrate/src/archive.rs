#![forbid(unsafe_code)]

use crate::error::MigrateError;
use std::io::Read;
use std::path::Path;

/// One importable archive entry: the key name derived from the entry's
/// basename (extension removed) plus its decoded text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub key_name: String,
    pub text: String,
}

/// Read every file entry of the zip archive, in archive order.
///
/// Directories are skipped. Entries whose bytes are not valid UTF-8 are
/// treated as binary assets and skipped without a trace; entries that fail
/// while being read get a one-line stderr warning and are skipped too.
/// Duplicate basenames are not deduplicated; each entry yields its own key.
pub fn read_key_entries(zip_path: &Path) -> Result<Vec<ArchiveEntry>, MigrateError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("Warning: failed to read archive entry #{index}: {err}");
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        if let Err(err) = entry.read_to_end(&mut bytes) {
            eprintln!("Warning: failed to read {name}: {err}");
            continue;
        }
        let Ok(text) = String::from_utf8(bytes) else {
            continue;
        };
        entries.push(ArchiveEntry {
            key_name: key_name_from_entry(&name),
            text,
        });
    }
    Ok(entries)
}

fn key_name_from_entry(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
        .to_string()
}
