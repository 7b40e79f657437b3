// Session persistence for the quiz game
// Versioned JSON record (or MessagePack + LZ4 with checksum), whole-object overwrite

pub mod error;
pub mod format;
pub mod migration;
pub mod store;

pub use error::StoreError;
pub use format::{decode_snapshot, SavedSession, SessionSnapshot, SnapshotCodec};
pub use migration::migrate_record;
pub use store::{FileStore, MemoryStore, SessionStore};

pub const SAVE_VERSION: u32 = 1;
