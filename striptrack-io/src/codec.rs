//! Host-native binary layouts.
//!
//! All integers and floats are written in native byte order; files are not
//! portable between hosts of different endianness.
//!
//! Hit record:
//! `[plane_count:u64]` then per plane `[plane_index:u32][strip_count:u64]
//! [strip:u32 x strip_count]`, then `[calorimeter_count:u64]
//! [slice:u8 x calorimeter_count]`. `plane_index` is the 0-based table
//! position of the plane.
//!
//! Line model (41 bytes): `a, b, cov00, cov01, cov11` as f64, then a flag
//! byte: bit 0 set when the covariance is usable, bit 1 set when the model
//! holds a fit. Other bits must be clear.
//!
//! Event tracks (174 bytes): `[main_ok:u8][full_ok:u8]
//! [calorimeter_slice:i64, -1 = none]` then main x, main y, full x, full y
//! line models.
//!
//! Sequences of either record are framed as `[count:u64][record x count]`.

use crate::{Error, Result};
use std::io::Write;
use striptrack_core::{EventTracks, GeometryTable, HitRecord, LineModel, PlaneId, TrackPair};

/// Encoded size of a [`LineModel`].
pub const LINE_MODEL_SIZE: usize = 5 * 8 + 1;
/// Encoded size of an [`EventTracks`].
pub const EVENT_TRACKS_SIZE: usize = 2 + 8 + 4 * LINE_MODEL_SIZE;
/// Line-model flag bit: covariance usable.
pub const LINE_FLAG_COVARIANCE: u8 = 0b01;
/// Line-model flag bit: parameters come from a fit.
pub const LINE_FLAG_FITTED: u8 = 0b10;
/// Smallest possible hit record: two empty counts.
pub const MIN_HIT_RECORD_SIZE: usize = 16;

/// Forward-only reader over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Starts reading at the beginning of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// True once every byte has been consumed.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if available < needed {
            return Err(Error::Truncated {
                offset: self.offset,
                needed,
                available,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads a native-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_ne_bytes)
    }

    /// Reads a native-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_ne_bytes)
    }

    /// Reads a native-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.array().map(i64::from_ne_bytes)
    }

    /// Reads a native-endian `f64`.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.array().map(f64::from_ne_bytes)
    }

    /// Reads a `u64` element count and checks that `count * element_size`
    /// bytes remain.
    fn read_count(&mut self, element_size: usize, record: usize) -> Result<usize> {
        let offset = self.offset;
        let raw = self.read_u64()?;
        let count = usize::try_from(raw)
            .map_err(|_| Error::malformed(record, format!("count {raw} does not fit in memory")))?;
        let needed = count.checked_mul(element_size).ok_or_else(|| {
            Error::malformed(record, format!("count {count} overflows the input size"))
        })?;
        if needed > self.remaining() {
            return Err(Error::Truncated {
                offset: offset + 8,
                needed,
                available: self.remaining(),
            });
        }
        Ok(count)
    }
}

fn write_bool<W: Write>(writer: &mut W, value: bool) -> std::io::Result<()> {
    writer.write_all(&[u8::from(value)])
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> std::io::Result<()> {
    writer.write_all(&(len as u64).to_ne_bytes())
}

fn read_bool(cursor: &mut ByteCursor<'_>, record: usize, what: &str) -> Result<bool> {
    match cursor.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::malformed(
            record,
            format!("{what} byte must be 0 or 1, got {other}"),
        )),
    }
}

/// Writes one hit record.
///
/// # Errors
/// Propagates write failures.
#[allow(clippy::cast_possible_truncation)]
pub fn write_hit_record<W: Write>(writer: &mut W, record: &HitRecord) -> std::io::Result<()> {
    write_len(writer, record.plane_count())?;
    for (plane, strips) in record.planes() {
        writer.write_all(&(plane.index() as u32).to_ne_bytes())?;
        write_len(writer, strips.len())?;
        for strip in strips {
            writer.write_all(&strip.to_ne_bytes())?;
        }
    }
    let calorimeter = record.calorimeter_hits();
    write_len(writer, calorimeter.len())?;
    for &slice in calorimeter {
        write_bool(writer, slice)?;
    }
    Ok(())
}

/// Encodes one hit record into a new buffer.
///
/// # Errors
/// Propagates failures of [`write_hit_record`].
pub fn encode_hit_record(record: &HitRecord) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(MIN_HIT_RECORD_SIZE);
    write_hit_record(&mut out, record)?;
    Ok(out)
}

/// Reads one hit record and checks it against `geometry`.
///
/// `record` is the record's position, used in error messages.
///
/// # Errors
/// [`Error::Truncated`] if the input ends early, [`Error::MalformedRecord`]
/// for an unknown or repeated plane, unordered or out-of-range strips, or a
/// calorimeter byte other than 0 or 1.
pub fn read_hit_record(
    cursor: &mut ByteCursor<'_>,
    record: usize,
    geometry: &GeometryTable,
) -> Result<HitRecord> {
    let mut hits = HitRecord::new();

    let plane_count = cursor.read_count(12, record)?;
    for _ in 0..plane_count {
        let index = cursor.read_u32()?;
        let plane = PlaneId::from_index(index as usize)
            .ok_or_else(|| Error::malformed(record, format!("unknown plane index {index}")))?;
        if hits.plane_strips(plane).is_some() {
            return Err(Error::malformed(record, format!("plane {plane} repeated")));
        }

        let strip_count = cursor.read_count(4, record)?;
        let mut strips = Vec::with_capacity(strip_count);
        for _ in 0..strip_count {
            strips.push(cursor.read_u32()?);
        }

        let limit = geometry.get(plane).strip_count;
        if let Some(&strip) = strips.iter().find(|&&strip| strip >= limit) {
            return Err(Error::malformed(
                record,
                format!("strip {strip} out of range for plane {plane} ({limit} strips)"),
            ));
        }
        hits.set_plane_strips(plane, strips)
            .map_err(|err| Error::malformed(record, err.to_string()))?;
    }

    let slices = cursor.read_count(1, record)?;
    let mut calorimeter = Vec::with_capacity(slices);
    for _ in 0..slices {
        calorimeter.push(read_bool(cursor, record, "calorimeter")?);
    }
    hits.set_calorimeter_hits(calorimeter);

    Ok(hits)
}

/// Writes a framed sequence of hit records.
///
/// # Errors
/// Propagates write failures.
pub fn write_hit_records<W: Write>(writer: &mut W, records: &[HitRecord]) -> std::io::Result<()> {
    write_len(writer, records.len())?;
    records
        .iter()
        .try_for_each(|record| write_hit_record(writer, record))
}

/// Decodes a complete framed sequence of hit records.
///
/// # Errors
/// Any record error from [`read_hit_record`], or [`Error::TrailingBytes`]
/// if input remains after the last record.
pub fn decode_hit_records(bytes: &[u8], geometry: &GeometryTable) -> Result<Vec<HitRecord>> {
    let mut cursor = ByteCursor::new(bytes);
    let count = cursor.read_count(MIN_HIT_RECORD_SIZE, 0)?;
    let records = (0..count)
        .map(|record| read_hit_record(&mut cursor, record, geometry))
        .collect::<Result<Vec<_>>>()?;
    finish(&cursor)?;
    Ok(records)
}

/// Writes one line model.
///
/// # Errors
/// Propagates write failures.
pub fn write_line_model<W: Write>(writer: &mut W, line: &LineModel) -> std::io::Result<()> {
    for value in [line.a, line.b, line.cov00, line.cov01, line.cov11] {
        writer.write_all(&value.to_ne_bytes())?;
    }
    let mut flags = 0;
    if line.has_covariance {
        flags |= LINE_FLAG_COVARIANCE;
    }
    if line.fitted {
        flags |= LINE_FLAG_FITTED;
    }
    writer.write_all(&[flags])
}

/// Reads one line model.
///
/// # Errors
/// [`Error::Truncated`] on short input, [`Error::MalformedRecord`] for a
/// flag byte with unknown bits set.
pub fn read_line_model(cursor: &mut ByteCursor<'_>, record: usize) -> Result<LineModel> {
    let a = cursor.read_f64()?;
    let b = cursor.read_f64()?;
    let cov00 = cursor.read_f64()?;
    let cov01 = cursor.read_f64()?;
    let cov11 = cursor.read_f64()?;
    let flags = cursor.read_u8()?;
    if flags & !(LINE_FLAG_COVARIANCE | LINE_FLAG_FITTED) != 0 {
        return Err(Error::malformed(
            record,
            format!("unknown line model flags {flags:#04x}"),
        ));
    }
    Ok(LineModel {
        a,
        b,
        cov00,
        cov01,
        cov11,
        has_covariance: flags & LINE_FLAG_COVARIANCE != 0,
        fitted: flags & LINE_FLAG_FITTED != 0,
    })
}

/// Writes one event's tracks.
///
/// # Errors
/// Propagates write failures.
#[allow(clippy::cast_possible_wrap)]
pub fn write_event_tracks<W: Write>(writer: &mut W, event: &EventTracks) -> std::io::Result<()> {
    write_bool(writer, event.main_ok)?;
    write_bool(writer, event.full_ok)?;
    let slice = event.calorimeter_slice.map_or(-1, |slice| slice as i64);
    writer.write_all(&slice.to_ne_bytes())?;
    for pair in [&event.main, &event.full] {
        write_line_model(writer, &pair.x)?;
        write_line_model(writer, &pair.y)?;
    }
    Ok(())
}

/// Reads one event's tracks.
///
/// # Errors
/// [`Error::Truncated`] on short input, [`Error::MalformedRecord`] for a bad
/// flag byte or a negative slice other than -1.
pub fn read_event_tracks(cursor: &mut ByteCursor<'_>, record: usize) -> Result<EventTracks> {
    let main_ok = read_bool(cursor, record, "main flag")?;
    let full_ok = read_bool(cursor, record, "full flag")?;
    let calorimeter_slice = match cursor.read_i64()? {
        -1 => None,
        slice => Some(usize::try_from(slice).map_err(|_| {
            Error::malformed(record, format!("invalid calorimeter slice {slice}"))
        })?),
    };
    let mut pair = || -> Result<TrackPair> {
        let x = read_line_model(cursor, record)?;
        let y = read_line_model(cursor, record)?;
        Ok(TrackPair::new(x, y))
    };
    let main = pair()?;
    let full = pair()?;
    Ok(EventTracks {
        main_ok,
        full_ok,
        main,
        full,
        calorimeter_slice,
    })
}

/// Writes a framed sequence of event tracks.
///
/// # Errors
/// Propagates write failures.
pub fn write_event_track_records<W: Write>(
    writer: &mut W,
    events: &[EventTracks],
) -> std::io::Result<()> {
    write_len(writer, events.len())?;
    events
        .iter()
        .try_for_each(|event| write_event_tracks(writer, event))
}

/// Decodes a complete framed sequence of event tracks.
///
/// # Errors
/// Any error from [`read_event_tracks`], or [`Error::TrailingBytes`].
pub fn decode_event_track_records(bytes: &[u8]) -> Result<Vec<EventTracks>> {
    let mut cursor = ByteCursor::new(bytes);
    let count = cursor.read_count(EVENT_TRACKS_SIZE, 0)?;
    let events = (0..count)
        .map(|record| read_event_tracks(&mut cursor, record))
        .collect::<Result<Vec<_>>>()?;
    finish(&cursor)?;
    Ok(events)
}

fn finish(cursor: &ByteCursor<'_>) -> Result<()> {
    match cursor.remaining() {
        0 => Ok(()),
        extra => Err(Error::TrailingBytes(extra)),
    }
}
