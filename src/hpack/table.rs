//! HPACK header tables (RFC 7541 Section 2.3).
//!
//! Indices 1..=61 address the static table, 62 and up the dynamic table,
//! newest entry first. The dynamic table is a circular byte buffer of
//! `name\0value\0` records, so its footprint never exceeds its `max_size`.

use crate::config::HPACK_MAX_DYNAMIC_TABLE_SIZE;
use crate::error::HpackError;
use crate::headers::HEADER_ENTRY_OVERHEAD;

/// Number of static table entries.
pub const STATIC_TABLE_LEN: usize = 61;

/// First index of the dynamic table.
pub const FIRST_DYNAMIC_INDEX: u32 = STATIC_TABLE_LEN as u32 + 1;

/// RFC 7541 Appendix A, indices 1..=61.
pub static STATIC_TABLE: [(&str, &str); STATIC_TABLE_LEN] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// A table entry as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

/// Bounds of one record inside the ring: `[start, name_end)` is the name,
/// `name_end` holds its NUL, `(name_end, value_end)` the value.
#[derive(Debug, Clone, Copy)]
struct Record {
    start: usize,
    name_end: usize,
    value_end: usize,
}

/// HPACK dynamic table backed by a circular byte buffer.
///
/// `first` is the oldest record, `next` the write cursor. Stored bytes per
/// record (`len + 2`) are always below the accounted size (`len + 32`), so
/// the writer can never run into `first`.
#[derive(Debug, Clone)]
pub struct DynamicTable {
    buffer: Vec<u8>,
    max_size: usize,
    settings_max_size: usize,
    first: usize,
    next: usize,
    n_entries: usize,
    actual_size: usize,
}

impl Default for DynamicTable {
    fn default() -> Self {
        Self::new(HPACK_MAX_DYNAMIC_TABLE_SIZE)
    }
}

impl DynamicTable {
    /// Table with `max_size` bytes, which is also the negotiated ceiling.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.min(HPACK_MAX_DYNAMIC_TABLE_SIZE);
        Self {
            buffer: vec![0; max_size],
            max_size,
            settings_max_size: max_size,
            first: 0,
            next: 0,
            n_entries: 0,
            actual_size: 0,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Accounted size of the resident entries.
    pub fn size(&self) -> usize {
        self.actual_size
    }

    pub fn len(&self) -> usize {
        self.n_entries
    }

    pub fn is_empty(&self) -> bool {
        self.n_entries == 0
    }

    pub fn settings_max_size(&self) -> usize {
        self.settings_max_size
    }

    /// Sets the ceiling a size update may reach (SETTINGS_HEADER_TABLE_SIZE),
    /// capped at [`HPACK_MAX_DYNAMIC_TABLE_SIZE`]. Shrinks the table if it
    /// currently exceeds the new ceiling.
    pub fn set_settings_max_size(&mut self, size: usize) {
        self.settings_max_size = size.min(HPACK_MAX_DYNAMIC_TABLE_SIZE);
        if self.max_size > self.settings_max_size {
            self.relayout(self.settings_max_size);
        }
    }

    /// Inserts an entry as the newest, evicting the oldest until it fits.
    ///
    /// An entry larger than the whole table is refused and leaves the table
    /// untouched.
    pub fn add_entry(&mut self, name: &[u8], value: &[u8]) -> Result<(), HpackError> {
        if name.contains(&0) || value.contains(&0) {
            return Err(HpackError::NulByte);
        }
        let size = name.len() + value.len() + HEADER_ENTRY_OVERHEAD;
        if size > self.max_size {
            return Err(HpackError::EntryTooLarge(size));
        }
        while self.actual_size + size > self.max_size {
            self.pop();
        }
        self.write(name);
        self.write(&[0]);
        self.write(value);
        self.write(&[0]);
        self.n_entries += 1;
        self.actual_size += size;
        Ok(())
    }

    /// Evicts every entry.
    pub fn clear(&mut self) {
        self.first = 0;
        self.next = 0;
        self.n_entries = 0;
        self.actual_size = 0;
    }

    /// Removes the oldest entry. Returns false on an empty table.
    pub fn pop(&mut self) -> bool {
        if self.n_entries == 0 {
            return false;
        }
        let mut nuls = 0;
        let mut stored = 0;
        while nuls < 2 {
            if self.buffer[self.first] == 0 {
                nuls += 1;
            }
            self.first = self.advance(self.first);
            stored += 1;
        }
        // Stored bytes carry two NULs where the accounting carries 32.
        self.actual_size -= stored - 2 + HEADER_ENTRY_OVERHEAD;
        self.n_entries -= 1;
        if self.n_entries == 0 {
            self.first = 0;
            self.next = 0;
        }
        true
    }

    /// Applies a Dynamic Table Size Update.
    pub fn resize(&mut self, new_max_size: usize) -> Result<(), HpackError> {
        if new_max_size > self.settings_max_size {
            return Err(HpackError::TableSizeExceeded {
                requested: new_max_size,
                limit: self.settings_max_size,
            });
        }
        self.relayout(new_max_size);
        Ok(())
    }

    /// Evicts down to `new_max_size`, then linearises the ring so the
    /// oldest record sits at offset 0 before the buffer changes length.
    fn relayout(&mut self, new_max_size: usize) {
        while self.actual_size > new_max_size {
            self.pop();
        }
        if self.n_entries > 0 {
            let used = self.used_bytes();
            // In place: the oldest record lands at offset 0.
            self.buffer.rotate_left(self.first);
            self.first = 0;
            self.next = used;
        }
        self.buffer.resize(new_max_size, 0);
        self.max_size = new_max_size;
        if self.next == self.max_size {
            self.next = 0;
        }
    }

    /// Entry at HPACK `index` (1-based, static then dynamic).
    pub fn find_entry_by_index(&self, index: u32) -> Result<TableEntry, HpackError> {
        if index == 0 {
            return Err(HpackError::InvalidIndex(index));
        }
        if index < FIRST_DYNAMIC_INDEX {
            let (name, value) = STATIC_TABLE[index as usize - 1];
            return Ok(TableEntry {
                name: name.as_bytes().to_vec(),
                value: value.as_bytes().to_vec(),
            });
        }
        let position = (index - FIRST_DYNAMIC_INDEX) as usize;
        let record = self
            .record(position)
            .ok_or(HpackError::InvalidIndex(index))?;
        Ok(TableEntry {
            name: self.read(record.start, record.name_end),
            value: self.read(self.advance(record.name_end), record.value_end),
        })
    }

    /// Index of an entry matching both name and value. Static entries win.
    pub fn find_index_by_name_value(&self, name: &[u8], value: &[u8]) -> Option<u32> {
        if let Some(i) = STATIC_TABLE
            .iter()
            .position(|(n, v)| n.as_bytes() == name && v.as_bytes() == value)
        {
            return Some(i as u32 + 1);
        }
        self.records()
            .position(|r| {
                self.bytes_eq(r.start, r.name_end, name)
                    && self.bytes_eq(self.advance(r.name_end), r.value_end, value)
            })
            .map(|p| p as u32 + FIRST_DYNAMIC_INDEX)
    }

    /// Index of the first entry with this name. Static entries win.
    pub fn find_index_by_name(&self, name: &[u8]) -> Option<u32> {
        if let Some(i) = STATIC_TABLE.iter().position(|(n, _)| n.as_bytes() == name) {
            return Some(i as u32 + 1);
        }
        self.records()
            .position(|r| self.bytes_eq(r.start, r.name_end, name))
            .map(|p| p as u32 + FIRST_DYNAMIC_INDEX)
    }

    /// Records newest first. Bounded by `n_entries`, so an empty table
    /// yields nothing without touching the buffer.
    fn records(&self) -> impl Iterator<Item = Record> + '_ {
        let mut end = self.next;
        (0..self.n_entries).map(move |_| {
            let record = self.record_ending_at(end);
            end = record.start;
            record
        })
    }

    /// The `position`-th newest record.
    fn record(&self, position: usize) -> Option<Record> {
        if position >= self.n_entries {
            return None;
        }
        self.records().nth(position)
    }

    /// Walks backwards from `end` (one past a value NUL) across the value
    /// and the name of one record.
    fn record_ending_at(&self, end: usize) -> Record {
        let value_end = self.retreat(end);
        let mut name_end = value_end;
        loop {
            name_end = self.retreat(name_end);
            if self.buffer[name_end] == 0 {
                break;
            }
        }
        let mut start = name_end;
        while start != self.first && self.buffer[self.retreat(start)] != 0 {
            start = self.retreat(start);
        }
        Record {
            start,
            name_end,
            value_end,
        }
    }

    fn used_bytes(&self) -> usize {
        if self.n_entries == 0 {
            0
        } else if self.next > self.first {
            self.next - self.first
        } else {
            self.max_size - self.first + self.next
        }
    }

    fn advance(&self, pos: usize) -> usize {
        if pos + 1 == self.max_size {
            0
        } else {
            pos + 1
        }
    }

    fn retreat(&self, pos: usize) -> usize {
        if pos == 0 {
            self.max_size - 1
        } else {
            pos - 1
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.buffer[self.next] = b;
            self.next = self.advance(self.next);
        }
    }

    fn read(&self, from: usize, to: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut pos = from;
        while pos != to {
            out.push(self.buffer[pos]);
            pos = self.advance(pos);
        }
        out
    }

    fn bytes_eq(&self, from: usize, to: usize, other: &[u8]) -> bool {
        let mut pos = from;
        for &b in other {
            if pos == to || self.buffer[pos] != b {
                return false;
            }
            pos = self.advance(pos);
        }
        pos == to
    }
}
