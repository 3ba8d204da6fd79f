//! Field tables and a big-endian writer/reader pair driven by them.
//!
//! Every integer in an `.ascache` file is described here once; the codec never shifts or
//! masks bytes by hand.

use crate::foundation::error::{GlyphcastError, GlyphcastResult};

/// Encoded width of an unsigned big-endian integer field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldWidth {
    /// One byte.
    U8,
    /// Two bytes.
    U16,
    /// Four bytes.
    U32,
}

impl FieldWidth {
    /// Encoded size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::U8 => 1,
            FieldWidth::U16 => 2,
            FieldWidth::U32 => 4,
        }
    }

    /// Largest representable value.
    pub const fn max_value(self) -> u64 {
        match self {
            FieldWidth::U8 => u8::MAX as u64,
            FieldWidth::U16 => u16::MAX as u64,
            FieldWidth::U32 => u32::MAX as u64,
        }
    }
}

/// Named integer field in a fixed record layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Name used in error messages.
    pub name: &'static str,
    /// Encoded width.
    pub width: FieldWidth,
}

const fn field(name: &'static str, width: FieldWidth) -> Field {
    Field { name, width }
}

/// File header layout, in order.
pub const HEADER_FIELDS: [Field; 7] = [
    field("magic", FieldWidth::U32),
    field("version", FieldWidth::U8),
    field("num_columns", FieldWidth::U16),
    field("brightness_centi", FieldWidth::U16),
    field("charset_index", FieldWidth::U8),
    field("frame_interval_ms", FieldWidth::U16),
    field("frame_count", FieldWidth::U32),
];

/// Positions of the header fields inside [`HEADER_FIELDS`].
pub mod header {
    /// `"ASC\0"` magic.
    pub const MAGIC: usize = 0;
    /// Format version byte.
    pub const VERSION: usize = 1;
    /// Glyph columns.
    pub const NUM_COLUMNS: usize = 2;
    /// `round(brightness * 100)`.
    pub const BRIGHTNESS_CENTI: usize = 3;
    /// Charset ordinal.
    pub const CHARSET_INDEX: usize = 4;
    /// Nominal frame spacing.
    pub const FRAME_INTERVAL_MS: usize = 5;
    /// Number of frame records that follow.
    pub const FRAME_COUNT: usize = 6;
}

/// Per-frame record header layout; followed by `data_len` raw bytes.
pub const FRAME_FIELDS: [Field; 3] = [
    field("frame_width", FieldWidth::U16),
    field("frame_height", FieldWidth::U16),
    field("frame_data_len", FieldWidth::U32),
];

/// Encoded size of a record layout.
pub const fn record_len(fields: &[Field]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width.bytes();
        i += 1;
    }
    total
}

/// Encoded size of the file header (16 bytes).
pub const HEADER_LEN: usize = record_len(&HEADER_FIELDS);
/// Encoded size of a frame record header (8 bytes).
pub const FRAME_HEADER_LEN: usize = record_len(&FRAME_FIELDS);

/// Appends big-endian fields to a growable buffer.
#[derive(Debug, Default)]
pub struct BeWriter {
    buf: Vec<u8>,
}

impl BeWriter {
    /// Writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append one field; values wider than the field fail with `InvalidInput`.
    pub fn put(&mut self, field: &Field, value: u64) -> GlyphcastResult<()> {
        if value > field.width.max_value() {
            return Err(GlyphcastError::invalid_input(format!(
                "{} = {value} does not fit in {} bytes",
                field.name,
                field.width.bytes()
            )));
        }
        match field.width {
            FieldWidth::U8 => self.buf.push(value as u8),
            FieldWidth::U16 => self.buf.extend_from_slice(&(value as u16).to_be_bytes()),
            FieldWidth::U32 => self.buf.extend_from_slice(&(value as u32).to_be_bytes()),
        }
        Ok(())
    }

    /// Append a whole record; `values` pairs up with `fields` by position.
    pub fn put_record(&mut self, fields: &[Field], values: &[u64]) -> GlyphcastResult<()> {
        if fields.len() != values.len() {
            return Err(GlyphcastError::invalid_input(format!(
                "record has {} fields but {} values",
                fields.len(),
                values.len()
            )));
        }
        for (f, &v) in fields.iter().zip(values) {
            self.put(f, v)?;
        }
        Ok(())
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Finish and return the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked big-endian reader over a byte slice.
///
/// The offset only moves forward. Any read past the end fails with `CorruptCache`.
#[derive(Debug)]
pub struct BeReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BeReader<'a> {
    /// Reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Take the next `len` raw bytes.
    pub fn take(&mut self, len: usize, what: &str) -> GlyphcastResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                GlyphcastError::corrupt(format!(
                    "truncated {what}: need {len} bytes at offset {}, {} left",
                    self.offset,
                    self.remaining()
                ))
            })?;
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    /// Read one field.
    pub fn get(&mut self, field: &Field) -> GlyphcastResult<u64> {
        let raw = self.take(field.width.bytes(), field.name)?;
        let value = match field.width {
            FieldWidth::U8 => u64::from(raw[0]),
            FieldWidth::U16 => u64::from(u16::from_be_bytes(array_from(raw, field)?)),
            FieldWidth::U32 => u64::from(u32::from_be_bytes(array_from(raw, field)?)),
        };
        Ok(value)
    }

    /// Read a whole record, in field order.
    pub fn read_record<const N: usize>(
        &mut self,
        fields: &[Field; N],
    ) -> GlyphcastResult<[u64; N]> {
        let mut out = [0u64; N];
        for (slot, f) in out.iter_mut().zip(fields) {
            *slot = self.get(f)?;
        }
        Ok(out)
    }
}

fn array_from<const N: usize>(raw: &[u8], field: &Field) -> GlyphcastResult<[u8; N]> {
    raw.try_into()
        .map_err(|_| GlyphcastError::corrupt(format!("{} has wrong byte length", field.name)))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/schema.rs"]
mod tests;
