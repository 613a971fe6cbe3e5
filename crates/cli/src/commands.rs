#![forbid(unsafe_code)]

use crate::checkpoint::{CHECKPOINT_SENTINEL, CheckpointOutcome, Checkpointer};
use kt_core::model::{CriterionStatus, StepMode, UndoAction};
use kt_storage::{KeyStore, StoreError, clock};

/// Literal hash recorded for rollback steps; no commit is created and no
/// history is rewritten (rollback is logged, not executed).
const ROLLBACK_HASH: &str = "rollback";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Created {
        name: String,
        key_id: i64,
        commit_hash: String,
    },
    Advanced {
        key: String,
        mode: StepMode,
        commit_hash: String,
    },
    Locked {
        key: String,
        commit_hash: String,
    },
    /// Reported to the operator; never a process failure.
    KeyNotFound { name: String },
}

fn checkpoint_or_sentinel(vcs: &mut dyn Checkpointer, message: &str) -> String {
    match vcs.checkpoint(message) {
        CheckpointOutcome::Committed(hash) => hash,
        CheckpointOutcome::Skipped(reason) => {
            eprintln!(
                "Warning: unable to create checkpoint ({reason}); recording {CHECKPOINT_SENTINEL}."
            );
            CHECKPOINT_SENTINEL.to_string()
        }
    }
}

/// Start a new key: checkpoint, insert the key, record the note (if any) as
/// one Proposed criterion, append an undo log entry. All three writes commit
/// in one transaction. Not idempotent: repeating a name creates a duplicate
/// key.
pub fn create_key(
    store: &mut KeyStore,
    vcs: &mut dyn Checkpointer,
    name: &str,
    note: &str,
) -> Result<CommandOutcome, StoreError> {
    let now = clock::now_iso();
    let commit_hash = checkpoint_or_sentinel(vcs, &format!("Start workitem {name}: {note}"));
    let key_id = store.scope(|txn| {
        let key_id = txn.insert_key(name, &now)?;
        if !note.is_empty() {
            txn.insert_criterion(key_id, note, CriterionStatus::Proposed, &now)?;
        }
        txn.insert_undo_log(key_id, &UndoAction::Checkpoint.label(), &commit_hash, &now)?;
        Ok(key_id)
    })?;
    Ok(CommandOutcome::Created {
        name: name.to_string(),
        key_id,
        commit_hash,
    })
}

/// Record one `continue` step on an existing key. Rollback never reaches the
/// collaborator; every other mode checkpoints first. The timestamp bump and
/// the undo entry commit together.
pub fn advance_key(
    store: &mut KeyStore,
    vcs: &mut dyn Checkpointer,
    key: &str,
    mode: StepMode,
    note: &str,
) -> Result<CommandOutcome, StoreError> {
    let now = clock::now_iso();
    let Some(key_id) = store.find_key_by_name(key)? else {
        return Ok(CommandOutcome::KeyNotFound {
            name: key.to_string(),
        });
    };

    let (action, commit_hash) = match mode {
        StepMode::Rollback => (UndoAction::Rollback.label(), ROLLBACK_HASH.to_string()),
        _ => {
            let message = format!("Continue {} on {key}: {note}", mode.as_str());
            (
                UndoAction::Continue(mode).label(),
                checkpoint_or_sentinel(vcs, &message),
            )
        }
    };

    store.scope(|txn| {
        txn.update_key_timestamp(key_id, &now)?;
        txn.insert_undo_log(key_id, &action, &commit_hash, &now)?;
        Ok(())
    })?;
    Ok(CommandOutcome::Advanced {
        key: key.to_string(),
        mode,
        commit_hash,
    })
}

/// Finalize a key: mark every criterion Final (already-Final ones included,
/// zero criteria is fine), bump the key timestamp, checkpoint, append the
/// keylock undo entry. The store writes commit as one transaction. Safe to
/// repeat.
pub fn lock_key(
    store: &mut KeyStore,
    vcs: &mut dyn Checkpointer,
    key: &str,
) -> Result<CommandOutcome, StoreError> {
    let now = clock::now_iso();
    let Some(key_id) = store.find_key_by_name(key)? else {
        return Ok(CommandOutcome::KeyNotFound {
            name: key.to_string(),
        });
    };

    let commit_hash = store.scope(|txn| {
        txn.set_criteria_status_for_key(key_id, CriterionStatus::Final, &now)?;
        txn.update_key_timestamp(key_id, &now)?;
        let commit_hash = checkpoint_or_sentinel(vcs, &format!("Keylock {key}"));
        txn.insert_undo_log(key_id, &UndoAction::Keylock.label(), &commit_hash, &now)?;
        Ok(commit_hash)
    })?;
    Ok(CommandOutcome::Locked {
        key: key.to_string(),
        commit_hash,
    })
}
