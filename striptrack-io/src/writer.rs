//! File writers for hit records and reconstructed tracks.

use crate::codec;
use crate::Result;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use striptrack_core::{EventTracks, HitRecord};

/// Streaming writer for framed hit-record files.
///
/// The record count is written as a placeholder and patched by
/// [`finish`](Self::finish); a file not finished declares zero records.
pub struct HitRecordWriter {
    writer: BufWriter<File>,
    count: u64,
}

impl HitRecordWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&0u64.to_ne_bytes())?;
        Ok(Self { writer, count: 0 })
    }

    /// Appends one record.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_record(&mut self, record: &HitRecord) -> Result<()> {
        codec::write_hit_record(&mut self.writer, record)?;
        self.count += 1;
        Ok(())
    }

    /// Appends several records.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_records(&mut self, records: &[HitRecord]) -> Result<()> {
        records.iter().try_for_each(|record| self.write_record(record))
    }

    /// Records written so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Writes the record count into the header and flushes.
    ///
    /// # Errors
    /// Propagates seek and write failures.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&self.count.to_ne_bytes())?;
        self.writer.flush()?;
        info!("wrote {} hit records", self.count);
        Ok(self.count)
    }
}

/// Writer for reconstructed event tracks.
pub struct TrackFileWriter {
    writer: BufWriter<File>,
}

impl TrackFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes events as CSV, one line per event.
    ///
    /// Empty calorimeter slices are written as an empty field.
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_tracks_csv(&mut self, events: &[EventTracks]) -> Result<()> {
        writeln!(
            self.writer,
            "event,main_ok,full_ok,calorimeter_slice,\
             main_x_a,main_x_b,main_y_a,main_y_b,\
             full_x_a,full_x_b,full_y_a,full_y_b"
        )?;

        for (index, event) in events.iter().enumerate() {
            let slice = event
                .calorimeter_slice
                .map(|slice| slice.to_string())
                .unwrap_or_default();
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                index,
                u8::from(event.main_ok),
                u8::from(event.full_ok),
                slice,
                event.main.x.a,
                event.main.x.b,
                event.main.y.a,
                event.main.y.b,
                event.full.x.a,
                event.full.x.b,
                event.full.y.a,
                event.full.y.b
            )?;
        }

        self.writer.flush()?;
        info!("wrote {} events as CSV", events.len());
        Ok(())
    }

    /// Writes events in the framed binary layout.
    ///
    /// Format: `u64` count, then 174 bytes per event (see [`codec`]).
    ///
    /// # Errors
    /// Propagates write failures.
    pub fn write_tracks_binary(&mut self, events: &[EventTracks]) -> Result<()> {
        codec::write_event_track_records(&mut self.writer, events)?;
        self.writer.flush()?;
        info!("wrote {} events", events.len());
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Propagates flush failures.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
