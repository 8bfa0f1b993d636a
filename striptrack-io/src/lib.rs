//! striptrack-io: File I/O for striptrack.
//!
//! This crate reads and writes the host-native binary layouts of hit
//! records and reconstructed tracks, using memory-mapped files via
//! memmap2 for input, and loads JSON setup files.
//!

pub mod codec;
mod config;
mod error;
mod reader;
mod writer;

pub use config::SetupConfig;
pub use error::{Error, Result};
pub use reader::{
    read_event_tracks, read_hit_records, EventTrackFile, HitRecordFile, HitRecords,
    MappedFileReader,
};
pub use writer::{HitRecordWriter, TrackFileWriter};
