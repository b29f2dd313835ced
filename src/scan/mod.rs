//! Music directory scanning and tag extraction
//!
//! Walking the tree is cheap; decoding tags is not, so discovered paths are
//! parsed on a worker pool and streamed back over a channel. Tag reading
//! itself sits behind a trait so tests (and future formats) can swap the
//! implementation.

mod reader;
mod scanner;

pub use reader::{LoftyReader, TagReader};
pub use scanner::{scan_music_directory, ScanOptions, DEFAULT_EXTENSIONS};
