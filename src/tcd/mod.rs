//! Tagcache (.tcd) database codec
//!
//! Implements the on-disk format used by the player firmware to index a
//! music library: one fixed-size master index (database_idx.tcd) plus ten
//! variable-length tag data files (database_N.tcd), all little-endian and
//! cross-referenced by byte offsets.

mod entry;
mod error;
mod index_entry;
mod index_file;
mod io;
mod tag_file;
mod tags;
mod writer;

pub use entry::TagFileEntry;
pub use error::{DbError, DbResult};
pub use index_entry::{
    IndexFileEntry, Slot, TagValue, FLAG_DELETED, FLAG_DIRCACHE, FLAG_DIRTYNUM, FLAG_RESURRECTED,
    FLAG_TRKNUMGEN,
};
pub use index_file::IndexFile;
pub use io::{crc32_lowercase, fat_pack, fat_unpack};
pub use tag_file::{TagFile, TagFileSet};
pub use tags::{Tag, INDEX_FILENAME, SEEK_SENTINEL, TAG_COUNT, TAG_MAGIC};
pub use writer::{finalize_index, write_database, SortMap};
