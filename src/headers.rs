//! Bounded header list with case-insensitive lookup.
//!
//! A [`HeaderList`] never grows past the capacity it was created with, and
//! rejects names or values longer than its limits before touching its
//! contents. Repeated names are merged with `,` (RFC 7230 Section 3.2.2).

use crate::config::{HEADER_LIST_CAPACITY, MAX_HEADER_NAME_LEN, MAX_HEADER_VALUE_LEN};
use crate::error::HeaderError;

/// HPACK per-entry overhead (RFC 7541 Section 4.1).
pub const HEADER_ENTRY_OVERHEAD: usize = 32;

/// A single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Accounted size: `len(name) + len(value) + 32`.
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len() + HEADER_ENTRY_OVERHEAD
    }
}

/// Ordered, fixed-capacity collection of headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<Header>,
    capacity: usize,
    max_name_len: usize,
    max_value_len: usize,
}

impl Default for HeaderList {
    fn default() -> Self {
        Self::new(HEADER_LIST_CAPACITY)
    }
}

impl HeaderList {
    /// List holding up to `capacity` names, with the configured length limits.
    pub fn new(capacity: usize) -> Self {
        Self::with_limits(capacity, MAX_HEADER_NAME_LEN, MAX_HEADER_VALUE_LEN)
    }

    pub fn with_limits(capacity: usize, max_name_len: usize, max_value_len: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            max_name_len,
            max_value_len,
        }
    }

    /// Appends a header, or merges into an existing one as `old,new`.
    pub fn add(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.check_lengths(name, value)?;
        match self.position(name) {
            Some(i) => {
                let entry = &mut self.entries[i];
                if entry.value.len() + 1 + value.len() > self.max_value_len {
                    return Err(HeaderError::InvalidArgument);
                }
                entry.value.push(',');
                entry.value.push_str(value);
                Ok(())
            }
            None => self.push(name, value),
        }
    }

    /// Appends a header, or replaces the value of an existing one.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.check_lengths(name, value)?;
        match self.position(name) {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.value.clear();
                entry.value.push_str(value);
                Ok(())
            }
            None => self.push(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].value.as_str())
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Header> {
        self.entries.get(index)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Rejects empty values and values holding `,`, which only appear when
    /// a field was repeated and merged.
    pub fn validate(&self) -> Result<(), HeaderError> {
        match self
            .entries
            .iter()
            .find(|h| h.value.is_empty() || h.value.contains(','))
        {
            Some(h) => Err(HeaderError::InvalidValue(h.name.clone())),
            None => Ok(()),
        }
    }

    /// Sum of `len(name) + len(value) + 32`, as compared against
    /// SETTINGS_MAX_HEADER_LIST_SIZE.
    pub fn total_wire_size(&self) -> usize {
        self.entries.iter().map(Header::size).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|h| h.name.eq_ignore_ascii_case(name))
    }

    fn check_lengths(&self, name: &str, value: &str) -> Result<(), HeaderError> {
        if name.len() > self.max_name_len || value.len() > self.max_value_len {
            return Err(HeaderError::InvalidArgument);
        }
        Ok(())
    }

    fn push(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        if self.entries.len() >= self.capacity {
            return Err(HeaderError::OutOfMemory);
        }
        self.entries.push(Header::new(name, value));
        Ok(())
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
