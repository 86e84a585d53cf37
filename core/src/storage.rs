//! Durable snapshots of the ledger state
//!
//! A snapshot is the bincode encoding of [`LedgerState`] behind a small versioned
//! header. Collaborators are not part of it; [`crate::Ledger::from_state`] puts them
//! back when the ledger is restored.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use serde::{Serialize, Deserialize};
use log::{debug, info};

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerState;

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a LedgerState,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    state: LedgerState,
}

/// Encode a state snapshot
pub fn encode_snapshot(state: &LedgerState) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef { version: SNAPSHOT_VERSION, state };
    Ok(bincode::serialize(&snapshot)?)
}

/// Decode a state snapshot, rejecting unknown versions
pub fn decode_snapshot(bytes: &[u8]) -> Result<LedgerState> {
    let snapshot: Snapshot = bincode::deserialize(bytes)?;
    check_version(snapshot.version)?;
    Ok(snapshot.state)
}

/// Write a snapshot of `state` to `path`
pub fn save_snapshot(state: &LedgerState, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    let snapshot = SnapshotRef { version: SNAPSHOT_VERSION, state };
    bincode::serialize_into(&mut writer, &snapshot)?;
    writer.flush()?;

    info!(
        "Saved ledger snapshot to {} ({} rides, {} events)",
        path.display(),
        state.registry.ride_counter(),
        state.events.len()
    );
    Ok(())
}

/// Read a snapshot from `path`
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<LedgerState> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    check_version(snapshot.version)?;

    debug!("Loaded ledger snapshot from {}", path.display());
    Ok(snapshot.state)
}

fn check_version(version: u32) -> Result<()> {
    if version != SNAPSHOT_VERSION {
        return Err(LedgerError::Config(format!(
            "unsupported snapshot version {}, expected {}",
            version, SNAPSHOT_VERSION
        )));
    }
    Ok(())
}
