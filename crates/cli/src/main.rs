#![forbid(unsafe_code)]

mod checkpoint;
mod commands;

use checkpoint::GitCheckpointer;
use commands::CommandOutcome;
use kt_core::model::StepMode;
use kt_storage::KeyStore;
use std::path::PathBuf;

const DB_DEFAULT: &str = "keytrack.db";

fn usage() -> &'static str {
    "keytrack — work-item tracker with best-effort git checkpoints\n\n\
USAGE:\n\
  keytrack workitem --name NAME [--note NOTE] [--db PATH]\n\
  keytrack continue --key NAME --mode {analyze|apply|test|rollback} [--note NOTE] [--db PATH]\n\
  keytrack keylock  --key NAME [--db PATH]\n\n\
NOTES:\n\
  - --db defaults to keytrack.db in the current directory; the schema is\n\
    created automatically when missing.\n\
  - checkpoints are best-effort: when git is unavailable the step is still\n\
    recorded, with the sentinel hash 0000000.\n\
  - mode=rollback only logs an undo entry; it does not rewrite history.\n"
}

#[derive(Debug)]
enum CliCommand {
    Workitem {
        name: String,
        note: String,
        db: PathBuf,
    },
    Continue {
        key: String,
        mode: StepMode,
        note: String,
        db: PathBuf,
    },
    Keylock { key: String, db: PathBuf },
}

fn parse_args() -> Result<CliCommand, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }
    let Some(command) = args.first() else {
        return Err(format!("missing command\n\n{}", usage()));
    };

    let mut name: Option<String> = None;
    let mut key: Option<String> = None;
    let mut mode: Option<StepMode> = None;
    let mut note = String::new();
    let mut db = PathBuf::from(DB_DEFAULT);

    let mut i = 1usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--name" => {
                i += 1;
                let v = args.get(i).ok_or("--name requires NAME")?;
                name = Some(v.to_string());
            }
            "--key" => {
                i += 1;
                let v = args.get(i).ok_or("--key requires NAME")?;
                key = Some(v.to_string());
            }
            "--mode" => {
                i += 1;
                let v = args.get(i).ok_or("--mode requires MODE")?;
                mode = Some(
                    StepMode::parse(v)
                        .ok_or("invalid --mode (expected analyze|apply|test|rollback)")?,
                );
            }
            "--note" => {
                i += 1;
                let v = args.get(i).ok_or("--note requires NOTE")?;
                note = v.to_string();
            }
            "--db" => {
                i += 1;
                let v = args.get(i).ok_or("--db requires PATH")?;
                db = PathBuf::from(v);
            }
            other => return Err(format!("Unknown arg: {other}\n\n{}", usage())),
        }
        i += 1;
    }

    match command.as_str() {
        "workitem" => {
            let name = name.ok_or("workitem requires --name")?;
            Ok(CliCommand::Workitem { name, note, db })
        }
        "continue" => {
            let key = key.ok_or("continue requires --key")?;
            let mode = mode.ok_or("continue requires --mode")?;
            Ok(CliCommand::Continue {
                key,
                mode,
                note,
                db,
            })
        }
        "keylock" => {
            let key = key.ok_or("keylock requires --key")?;
            Ok(CliCommand::Keylock { key, db })
        }
        other => Err(format!("Unknown command: {other}\n\n{}", usage())),
    }
}

fn report(outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Created {
            name, commit_hash, ..
        } => {
            println!("Created key '{name}' with checkpoint {commit_hash}.");
        }
        CommandOutcome::Advanced {
            key,
            mode,
            commit_hash,
        } => {
            println!(
                "Recorded {} step on key '{key}' with checkpoint {commit_hash}.",
                mode.as_str()
            );
        }
        CommandOutcome::Locked { key, commit_hash } => {
            println!("Key '{key}' locked. All criteria marked Final with checkpoint {commit_hash}.");
        }
        CommandOutcome::KeyNotFound { name } => {
            eprintln!("Error: key '{name}' not found in database.");
        }
    }
}

fn run(command: CliCommand) -> Result<(), Box<dyn std::error::Error>> {
    let mut vcs = GitCheckpointer;
    let outcome = match command {
        CliCommand::Workitem { name, note, db } => {
            let mut store = KeyStore::open(&db)?;
            commands::create_key(&mut store, &mut vcs, &name, &note)?
        }
        CliCommand::Continue {
            key,
            mode,
            note,
            db,
        } => {
            let mut store = KeyStore::open(&db)?;
            commands::advance_key(&mut store, &mut vcs, &key, mode, &note)?
        }
        CliCommand::Keylock { key, db } => {
            let mut store = KeyStore::open(&db)?;
            commands::lock_key(&mut store, &mut vcs, &key)?
        }
    };
    report(outcome);
    Ok(())
}

fn main() {
    let command = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        std::process::exit(2);
    });
    if let Err(err) = run(command) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
