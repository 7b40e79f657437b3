use super::error::StoreError;
use super::migration::migrate_record;
use super::SAVE_VERSION;
use crate::bank::Player;
use crate::scoring::AnswerResult;
use crate::state::Phase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

const CHECKSUM_LEN: usize = 32;

/// Leading bytes of every packed record.
pub const PACKED_MAGIC: &[u8; 4] = b"QZP\x01";

/// Full state of an in-progress session, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub player: Option<Player>,
    /// 0-based pointer into the player's question set.
    pub current_index: usize,
    /// Ledger entries in question-set order.
    pub results: Vec<AnswerResult>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self { phase: Phase::Select, player: None, current_index: 0, results: Vec::new() }
    }
}

impl SessionSnapshot {
    /// Structural checks that need no question data.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut ids = HashSet::new();
        for result in &self.results {
            if !ids.insert(result.question_id.as_str()) {
                return Err(StoreError::Corrupted(format!(
                    "question {} appears twice in results",
                    result.question_id
                )));
            }
        }
        if self.phase != Phase::Select && self.player.is_none() {
            return Err(StoreError::Corrupted(format!("phase {:?} without a player", self.phase)));
        }
        Ok(())
    }
}

/// Versioned envelope written to the store.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    /// Record format version for migration
    pub version: u32,

    /// Save timestamp (unix milliseconds)
    #[serde(default)]
    pub saved_at: u64,

    pub phase: Phase,

    #[serde(default)]
    pub player: Option<Player>,

    #[serde(default)]
    pub results: Vec<AnswerResult>,

    #[serde(default)]
    pub current_index: usize,
}

impl SavedSession {
    pub fn wrap(snapshot: &SessionSnapshot) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: current_timestamp(),
            phase: snapshot.phase,
            player: snapshot.player.clone(),
            results: snapshot.results.clone(),
            current_index: snapshot.current_index,
        }
    }

    pub fn into_snapshot(self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            player: self.player,
            current_index: self.current_index,
            results: self.results,
        }
    }
}

/// Encoding used when writing a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCodec {
    /// Plain JSON record, readable by the browser front-end.
    #[default]
    Json,
    /// MessagePack + LZ4 with a trailing SHA-256 checksum.
    Packed,
}

impl SnapshotCodec {
    pub fn encode(self, snapshot: &SessionSnapshot) -> Result<Vec<u8>, StoreError> {
        snapshot.validate()?;
        let record = SavedSession::wrap(snapshot);
        match self {
            SnapshotCodec::Json => Ok(serde_json::to_vec_pretty(&record)?),
            SnapshotCodec::Packed => serialize_and_compress(&record),
        }
    }

    /// Codec of stored bytes: packed records carry [`PACKED_MAGIC`],
    /// anything else is read as JSON.
    pub fn detect(bytes: &[u8]) -> SnapshotCodec {
        if bytes.starts_with(PACKED_MAGIC) {
            SnapshotCodec::Packed
        } else {
            SnapshotCodec::Json
        }
    }
}

/// Decode stored bytes written by either codec, migrating old records.
pub fn decode_snapshot(bytes: &[u8]) -> Result<SessionSnapshot, StoreError> {
    let record = match SnapshotCodec::detect(bytes) {
        SnapshotCodec::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)?;
            let value = migrate_record(value)?;
            serde_json::from_value::<SavedSession>(value)?
        }
        SnapshotCodec::Packed => decompress_and_deserialize(bytes)?,
    };

    let snapshot = record.into_snapshot();
    snapshot.validate()?;
    Ok(snapshot)
}

/// Serialize and compress a session record
pub fn serialize_and_compress(record: &SavedSession) -> Result<Vec<u8>, StoreError> {
    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(record)?;

    // 2. Compress with LZ4 (size prepended for easy decompression)
    let compressed = compress_prepend_size(&msgpack);

    // 3. Add SHA256 checksum at the end
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = Vec::with_capacity(PACKED_MAGIC.len() + compressed.len() + CHECKSUM_LEN);
    result.extend_from_slice(PACKED_MAGIC);
    result.extend_from_slice(&compressed);
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Verify, decompress and deserialize a packed session record
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<SavedSession, StoreError> {
    let bytes = bytes
        .strip_prefix(PACKED_MAGIC.as_slice())
        .ok_or_else(|| StoreError::Corrupted("packed record has no header".to_string()))?;

    // Check minimum size (size prefix + checksum)
    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(StoreError::Corrupted(format!("packed record too short: {} bytes", bytes.len())));
    }

    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(StoreError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| StoreError::Decompression)?;
    let record: SavedSession = from_slice(&msgpack)?;

    // Packed records were introduced with version 1; nothing to migrate.
    if record.version != SAVE_VERSION {
        return Err(StoreError::VersionMismatch { found: record.version, expected: SAVE_VERSION });
    }

    Ok(record)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
