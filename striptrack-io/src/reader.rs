//! Memory-mapped file readers.
//!

use crate::codec::{self, ByteCursor, MIN_HIT_RECORD_SIZE};
use crate::{Error, Result};
use log::info;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use striptrack_core::{EventTracks, GeometryTable, HitRecord};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|err| Error::MmapError(format!("{}: {err}", path.display())))?;
        Ok(Self { mmap, path })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A framed hit-record file.
pub struct HitRecordFile {
    reader: MappedFileReader,
}

impl HitRecordFile {
    /// Maps a hit-record file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            reader: MappedFileReader::open(path)?,
        })
    }

    /// Record count declared in the file header.
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the header is missing.
    pub fn declared_count(&self) -> Result<u64> {
        ByteCursor::new(self.reader.as_bytes()).read_u64()
    }

    /// Streams records, checking each against `geometry`.
    ///
    /// The iterator stops after the first error. Trailing bytes are only
    /// detected by [`read_records`](Self::read_records).
    ///
    /// # Errors
    /// Returns [`Error::Truncated`] if the header is missing.
    pub fn records<'a>(&'a self, geometry: &'a GeometryTable) -> Result<HitRecords<'a>> {
        let mut cursor = ByteCursor::new(self.reader.as_bytes());
        let declared = cursor.read_u64()?;
        Ok(HitRecords {
            cursor,
            geometry,
            next: 0,
            declared,
            failed: false,
        })
    }

    /// Reads and validates every record.
    ///
    /// # Errors
    /// Fails on the first malformed or truncated record, or on bytes left
    /// after the last record. No partial result is returned.
    pub fn read_records(&self, geometry: &GeometryTable) -> Result<Vec<HitRecord>> {
        let records = codec::decode_hit_records(self.reader.as_bytes(), geometry)?;
        info!(
            "read {} hit records from {}",
            records.len(),
            self.reader.path().display()
        );
        Ok(records)
    }

    /// File size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reader.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }
}

/// Iterator over the records of a [`HitRecordFile`].
pub struct HitRecords<'a> {
    cursor: ByteCursor<'a>,
    geometry: &'a GeometryTable,
    next: u64,
    declared: u64,
    failed: bool,
}

impl Iterator for HitRecords<'_> {
    type Item = Result<HitRecord>;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.declared {
            return None;
        }
        let record = self.next as usize;
        self.next += 1;
        let result = codec::read_hit_record(&mut self.cursor, record, self.geometry);
        self.failed = result.is_err();
        Some(result)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = (self.declared - self.next) as usize;
        let fit = self.cursor.remaining() / MIN_HIT_RECORD_SIZE;
        (0, Some(left.min(fit + 1)))
    }
}

/// A framed event-tracks file.
pub struct EventTrackFile {
    reader: MappedFileReader,
}

impl EventTrackFile {
    /// Maps an event-tracks file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            reader: MappedFileReader::open(path)?,
        })
    }

    /// Reads every event.
    ///
    /// # Errors
    /// Fails on truncation, a bad flag byte or trailing bytes.
    pub fn read_tracks(&self) -> Result<Vec<EventTracks>> {
        let events = codec::decode_event_track_records(self.reader.as_bytes())?;
        info!(
            "read {} events from {}",
            events.len(),
            self.reader.path().display()
        );
        Ok(events)
    }
}

/// Reads and validates a hit-record file.
///
/// # Errors
/// See [`HitRecordFile::read_records`].
pub fn read_hit_records<P: AsRef<Path>>(
    path: P,
    geometry: &GeometryTable,
) -> Result<Vec<HitRecord>> {
    HitRecordFile::open(path)?.read_records(geometry)
}

/// Reads an event-tracks file.
///
/// # Errors
/// See [`EventTrackFile::read_tracks`].
pub fn read_event_tracks<P: AsRef<Path>>(path: P) -> Result<Vec<EventTracks>> {
    EventTrackFile::open(path)?.read_tracks()
}
