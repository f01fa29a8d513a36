//! HPACK header block encoding.

use tracing::trace;

use super::integer::{encode_integer, encode_string};
use super::table::DynamicTable;
use super::Representation;
use crate::headers::HeaderList;

/// Encodes header blocks for the peer's decoder.
///
/// Exact table matches become indexed fields. Everything else is a literal,
/// indexed into the dynamic table when it fits, sent never-indexed
/// otherwise.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    table: DynamicTable,
    /// Size to announce at the start of the next block.
    pending_size_update: Option<usize>,
    /// Smallest size set since the last block, announced first when it is
    /// below the final one (RFC 7541 Section 4.2).
    min_pending_size: Option<usize>,
}

impl Encoder {
    pub fn new(max_table_size: usize) -> Self {
        Self {
            table: DynamicTable::new(max_table_size),
            pending_size_update: None,
            min_pending_size: None,
        }
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Follows a peer SETTINGS_HEADER_TABLE_SIZE. The table is resized at
    /// once and the next block opens with a Dynamic Table Size Update.
    pub fn set_max_table_size(&mut self, size: usize) {
        let previous = self.table.max_size();
        self.table.set_settings_max_size(size);
        let size = self.table.settings_max_size();
        if size == previous {
            return;
        }
        if self.table.resize(size).is_ok() {
            self.pending_size_update = Some(size);
            self.min_pending_size = Some(self.min_pending_size.map_or(size, |m| m.min(size)));
        }
    }

    /// Appends the encoded block for `headers` to `out` and returns the
    /// number of bytes written.
    pub fn encode(&mut self, headers: &HeaderList, out: &mut Vec<u8>) -> usize {
        let start = out.len();
        if let Some(size) = self.pending_size_update.take() {
            let update = Representation::SizeUpdate;
            if let Some(min) = self.min_pending_size.take().filter(|&min| min < size) {
                encode_integer(out, min as u32, update.prefix_bits(), update.preamble());
            }
            encode_integer(out, size as u32, update.prefix_bits(), update.preamble());
        }
        for header in headers {
            // HTTP/2 field names are lowercase on the wire.
            let name = header.name.to_ascii_lowercase();
            self.encode_field(name.as_bytes(), header.value.as_bytes(), out);
        }
        out.len() - start
    }

    fn encode_field(&mut self, name: &[u8], value: &[u8], out: &mut Vec<u8>) {
        if let Some(index) = self.table.find_index_by_name_value(name, value) {
            let indexed = Representation::Indexed;
            encode_integer(out, index, indexed.prefix_bits(), indexed.preamble());
            return;
        }

        // Resolved before indexing: the insert may evict the named entry.
        let name_index = self.table.find_index_by_name(name).unwrap_or(0);
        let representation = self.index(name, value);
        encode_integer(
            out,
            name_index,
            representation.prefix_bits(),
            representation.preamble(),
        );
        if name_index == 0 {
            encode_string(out, name);
        }
        encode_string(out, value);
    }

    #[cfg(feature = "dynamic-table")]
    fn index(&mut self, name: &[u8], value: &[u8]) -> Representation {
        match self.table.add_entry(name, value) {
            Ok(()) => Representation::LiteralWithIncrementalIndexing,
            Err(e) => {
                trace!(error = %e, "hpack entry not indexed");
                Representation::LiteralNeverIndexed
            }
        }
    }

    #[cfg(not(feature = "dynamic-table"))]
    fn index(&mut self, _name: &[u8], _value: &[u8]) -> Representation {
        trace!("hpack dynamic table disabled");
        Representation::LiteralNeverIndexed
    }
}
