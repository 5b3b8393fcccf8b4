//! tap-save: Save/restore of derived play statistics
//!
//! The tracker keeps its records in memory only. This crate lets a host
//! write the PB table and game history to a JSON file and read them back.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tap_core::{GameHistory, PbTable, Tracker};

/// Current save file format version
pub const SAVE_VERSION: u32 = 1;

/// Save/restore errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save file not found")]
    NotFound,

    #[error("Corrupted save file: {0}")]
    Corrupted(String),

    #[error("Incompatible save version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Invalid save file header")]
    InvalidHeader,
}

/// Save file header for versioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Magic identifier
    pub magic: String,
    /// Save format version
    pub version: u32,
    /// Games ever pushed to the history at save time
    pub games_recorded: usize,
    /// Timestamp of save
    pub timestamp: u64,
}

impl SaveHeader {
    const MAGIC: &'static str = "TAPS";

    pub fn new(history: &GameHistory) -> Self {
        Self {
            magic: Self::MAGIC.to_string(),
            version: SAVE_VERSION,
            games_recorded: history.total_pushes(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != Self::MAGIC {
            return Err(SaveError::InvalidHeader);
        }
        if self.version != SAVE_VERSION {
            return Err(SaveError::IncompatibleVersion {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }
}

/// Complete save file structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub header: SaveHeader,
    pub pb: PbTable,
    pub history: GameHistory,
}

impl SaveFile {
    pub fn from_tracker(tracker: &Tracker) -> Self {
        Self {
            header: SaveHeader::new(tracker.game_history()),
            pb: tracker.pb_table().clone(),
            history: tracker.game_history().clone(),
        }
    }
}

/// Save a tracker's statistics to a file
pub fn save_stats(tracker: &Tracker, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &SaveFile::from_tracker(tracker))?;
    info!("saved statistics to {}", path.display());
    Ok(())
}

/// Save a tracker's statistics to a compact file (no pretty printing)
pub fn save_stats_compact(tracker: &Tracker, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, &SaveFile::from_tracker(tracker))?;
    info!("saved statistics to {}", path.display());
    Ok(())
}

/// Load statistics from a file
pub fn load_stats(path: impl AsRef<Path>) -> Result<SaveFile, SaveError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SaveError::NotFound,
        _ => SaveError::Io(e),
    })?;
    let reader = BufReader::new(file);
    // Well-formed JSON whose statistics do not hold together is corruption,
    // not a format error.
    let save_file: SaveFile = serde_json::from_reader(reader).map_err(|e| {
        if e.is_data() {
            SaveError::Corrupted(e.to_string())
        } else {
            SaveError::Serialization(e)
        }
    })?;

    save_file.header.validate()?;
    debug!(
        "loaded {} game(s) and {} PB record(s) from {}",
        save_file.history.count(),
        save_file.pb.len(),
        path.display()
    );
    Ok(save_file)
}

/// Load only the header from a save file
pub fn load_header(path: impl AsRef<Path>) -> Result<SaveHeader, SaveError> {
    Ok(load_stats(path)?.header)
}

/// Check if a save file exists
pub fn save_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Delete a save file
pub fn delete_save(path: impl AsRef<Path>) -> Result<(), SaveError> {
    std::fs::remove_file(path)?;
    Ok(())
}

/// Default location of the statistics file
pub fn default_save_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tap-tracker");
    std::fs::create_dir_all(&path).ok();
    path.push("stats.json");
    path
}
