//! Unified data model for scanned music files
//!
//! The track metadata record is the hand-off point between the tag-reader
//! collaborator and the database builder; it is independent of both the
//! audio formats being read and the database being written.

mod track;

pub use track::{TrackMetadata, UNTAGGED_COMMENT, UNTAGGED_COMPOSER};
