//! HPACK header block decoding.

use tracing::trace;

use super::huffman;
use super::integer::{decode_integer, read_string, RawString};
use super::table::{DynamicTable, TableEntry};
use super::Representation;
use crate::error::HpackError;
use crate::headers::HeaderList;

/// Decodes header blocks sent by the peer's encoder.
///
/// The dynamic table lives for the whole connection: every block must be fed
/// through the same decoder, in the order the frames arrived.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    table: DynamicTable,
}

impl Decoder {
    /// Decoder whose table may grow up to `max_table_size` bytes, the value
    /// we advertise as SETTINGS_HEADER_TABLE_SIZE.
    pub fn new(max_table_size: usize) -> Self {
        Self {
            table: DynamicTable::new(max_table_size),
        }
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Applies a new local SETTINGS_HEADER_TABLE_SIZE ceiling.
    pub fn set_max_table_size(&mut self, size: usize) {
        self.table.set_settings_max_size(size);
    }

    /// Decodes a complete header block into `headers`.
    ///
    /// Returns the number of bytes consumed, which is always `block.len()` on
    /// success. The first failing field aborts the whole block.
    pub fn decode(&mut self, block: &[u8], headers: &mut HeaderList) -> Result<usize, HpackError> {
        let mut pos = 0;
        let mut seen_field = false;

        while pos < block.len() {
            let rest = &block[pos..];
            let representation = Representation::from_preamble(rest[0]);
            let used = match representation {
                Representation::Indexed => {
                    seen_field = true;
                    let (index, used) = decode_integer(rest, representation.prefix_bits())?;
                    let entry = self.table.find_entry_by_index(index)?;
                    emit(headers, &entry)?;
                    used
                }
                Representation::SizeUpdate => {
                    // Size updates may only open a block.
                    if seen_field {
                        return Err(HpackError::LateSizeUpdate);
                    }
                    let (size, used) = decode_integer(rest, representation.prefix_bits())?;
                    self.table.resize(size as usize)?;
                    trace!(size, "hpack dynamic table size update");
                    used
                }
                Representation::LiteralWithIncrementalIndexing
                | Representation::LiteralNeverIndexed
                | Representation::LiteralWithoutIndexing => {
                    seen_field = true;
                    let (entry, used) = self.decode_literal(rest, representation)?;
                    emit(headers, &entry)?;
                    if representation == Representation::LiteralWithIncrementalIndexing {
                        self.insert(&entry)?;
                    }
                    used
                }
            };
            pos += used;
        }

        Ok(pos)
    }

    /// Name (indexed or literal) followed by a literal value.
    fn decode_literal(
        &self,
        buf: &[u8],
        representation: Representation,
    ) -> Result<(TableEntry, usize), HpackError> {
        let (index, mut used) = decode_integer(buf, representation.prefix_bits())?;
        let name = if index == 0 {
            let (raw, n) = read_string(&buf[used..])?;
            used += n;
            literal(raw)?
        } else {
            self.table.find_entry_by_index(index)?.name
        };
        let (raw, n) = read_string(&buf[used..])?;
        used += n;
        let value = literal(raw)?;
        Ok((TableEntry { name, value }, used))
    }

    fn insert(&mut self, entry: &TableEntry) -> Result<(), HpackError> {
        match self.table.add_entry(&entry.name, &entry.value) {
            Ok(()) => Ok(()),
            // An entry larger than the table empties it (RFC 7541 Section 4.4).
            Err(HpackError::EntryTooLarge(size)) => {
                trace!(size, "hpack entry larger than table, table emptied");
                self.table.clear();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn literal(raw: RawString<'_>) -> Result<Vec<u8>, HpackError> {
    if raw.huffman {
        huffman::check_eos_symbol(raw.bytes)?;
    }
    raw.decode()
}

fn emit(headers: &mut HeaderList, entry: &TableEntry) -> Result<(), HpackError> {
    let name = String::from_utf8_lossy(&entry.name);
    let value = String::from_utf8_lossy(&entry.value);
    headers.add(&name, &value)?;
    Ok(())
}
