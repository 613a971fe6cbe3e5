#![forbid(unsafe_code)]

mod archive;
mod error;
mod export;

use error::MigrateError;
use kt_core::criteria::extract_criteria;
use kt_core::model::CriterionStatus;
use kt_storage::{KeyStore, clock};
use std::path::{Path, PathBuf};

const KEYS_DEFAULT: &str = "prompt.keys.zip";
const DB_DEFAULT: &str = "keytrack.db";

fn usage() -> &'static str {
    "kt_migrate — bulk-import prompt keys and export dashboard JSON\n\n\
USAGE:\n\
  kt_migrate [--keys PATH] [--db PATH]\n\n\
NOTES:\n\
  - --keys defaults to prompt.keys.zip in the current directory.\n\
  - --db defaults to keytrack.db in the current directory.\n\
  - the import is a full replace: all existing rows are dropped before the\n\
    archive is loaded. Undo logs start empty.\n\
  - keys.json, criteria.json and undologs.json are written into a data/\n\
    directory next to the database file, overwriting previous exports.\n"
}

#[derive(Debug)]
struct MigrateConfig {
    keys_zip: PathBuf,
    db_path: PathBuf,
}

fn parse_args() -> Result<MigrateConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }

    let mut keys_zip = PathBuf::from(KEYS_DEFAULT);
    let mut db_path = PathBuf::from(DB_DEFAULT);

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--keys" => {
                i += 1;
                let v = args.get(i).ok_or("--keys requires PATH")?;
                keys_zip = PathBuf::from(v);
            }
            "--db" => {
                i += 1;
                let v = args.get(i).ok_or("--db requires PATH")?;
                db_path = PathBuf::from(v);
            }
            other => return Err(format!("Unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    Ok(MigrateConfig { keys_zip, db_path })
}

/// Destructively reload the store from the archive: drop all tables,
/// recreate the schema, insert one key per archive entry plus its parsed
/// criteria (status Proposed), all in one transaction. No undo log rows are
/// written. Returns the number of imported keys.
fn populate(db_path: &Path, keys_zip: &Path) -> Result<usize, MigrateError> {
    if !keys_zip.exists() {
        return Err(MigrateError::ArchiveMissing(keys_zip.to_path_buf()));
    }

    KeyStore::reset(db_path)?;
    let mut store = KeyStore::open(db_path)?;

    let entries = archive::read_key_entries(keys_zip)?;
    let now = clock::now_iso();
    store.scope(|txn| {
        for entry in &entries {
            let key_id = txn.insert_key(&entry.key_name, &now)?;
            for criterion in extract_criteria(&entry.text) {
                txn.insert_criterion(key_id, &criterion, CriterionStatus::Proposed, &now)?;
            }
        }
        Ok(())
    })?;
    Ok(entries.len())
}

fn run(cfg: &MigrateConfig) -> Result<(), MigrateError> {
    println!(
        "Migrating from {} into {}...",
        cfg.keys_zip.display(),
        cfg.db_path.display()
    );
    let imported = populate(&cfg.db_path, &cfg.keys_zip)?;

    let data_dir = cfg
        .db_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("data");
    export::export(&cfg.db_path, &data_dir)?;

    println!(
        "Migration complete: {imported} keys imported. JSON exports written to {}.",
        data_dir.display()
    );
    Ok(())
}

fn main() {
    let cfg = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        std::process::exit(2);
    });
    if let Err(err) = run(&cfg) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
