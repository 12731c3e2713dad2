//! Checkpointing: a serializable snapshot of all dynamic simulation state
//! and JSON file helpers around it.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{DistrictId, DistrictState, FactionId, Stance, TensionRecord};
use crate::overlay::OverlayLayer;

/// Everything needed to resume a simulation: district dynamic state, the
/// full layer set with its id counter, tension records, stances, and the
/// clock. Static district data and configuration are supplied by the host
/// at construction and are not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: u64,
    pub day: u32,
    pub districts: Vec<(DistrictId, DistrictState)>,
    pub layers: Vec<OverlayLayer>,
    pub next_layer_id: u64,
    pub tension_records: Vec<TensionRecord>,
    pub stances: Vec<(FactionId, FactionId, Stance)>,
}

/// Write a snapshot as pretty-printed JSON.
pub fn write_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> io::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot).map_err(io::Error::from)
}

/// Read a snapshot back from a JSON file.
pub fn read_snapshot(path: impl AsRef<Path>) -> io::Result<Snapshot> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(io::Error::from)
}
