//! Log reading and appending.
//!
//! ## Recovery policy
//!
//! The iterator distinguishes between **tolerated** and **fatal**
//! conditions when reading a log back:
//!
//! ### Tolerated conditions (treat as clean end-of-log)
//!
//! - **Truncated header**: fewer than 5 bytes left in the file
//! - **Truncated payload**: framed length exceeds the bytes available
//!
//! Both represent a crash mid-write before the flush completed. The
//! incomplete tail is discarded and replay proceeds with the complete
//! entries before it. The operation that wrote the tail was never
//! acknowledged, so dropping it cannot lose acknowledged data.
//!
//! ### Fatal conditions (abort replay with [`QueueError::LogCorruption`])
//!
//! - **Unknown tag byte**: not a Record or Tombstone discriminant
//! - **Tombstone framing a payload**: tombstones are zero-length by
//!   definition
//!
//! These indicate real corruption rather than a torn write, and the queue
//! must not open on top of them.

use crate::entry::{Entry, EntryKind, HEADER_SIZE};
use crate::error::{QueueError, QueueResult};
use duraq_storage::StorageBackend;

/// A streaming iterator over log entries.
///
/// Yields `(offset, entry)` pairs in file order. Entries are read
/// one-by-one from the backend, so memory use is bounded by the largest
/// single entry rather than the log size.
pub struct EntryIter<'a> {
    backend: &'a dyn StorageBackend,
    total_size: u64,
    offset: u64,
    finished: bool,
}

impl<'a> EntryIter<'a> {
    /// Creates an iterator reading from the start of the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn new(backend: &'a dyn StorageBackend) -> QueueResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            offset: 0,
            finished: false,
        })
    }

    /// Returns the offset just past the last complete entry read so far.
    ///
    /// After the iterator is exhausted this marks the end of the usable
    /// log; any bytes beyond it are a torn tail that callers should
    /// truncate away before appending new entries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next entry from the log.
    ///
    /// Returns `Ok(Some((offset, entry)))` for a complete entry,
    /// `Ok(None)` at end-of-log or on a truncated tail, and
    /// `Err(..)` on corruption or I/O failure.
    fn read_next(&mut self) -> QueueResult<Option<(u64, Entry)>> {
        if self.finished {
            return Ok(None);
        }

        let start = self.offset;
        let remaining = self.total_size - start;

        if remaining == 0 {
            self.finished = true;
            return Ok(None);
        }

        if remaining < HEADER_SIZE as u64 {
            // Torn write cut off mid-header: tolerated tail.
            self.finished = true;
            return Ok(None);
        }

        let header = self.backend.read_at(start, HEADER_SIZE)?;
        let tag = header[0];
        let kind = EntryKind::from_byte(tag).ok_or_else(|| {
            QueueError::log_corruption(format!("unknown entry tag {tag} at offset {start}"))
        })?;

        let payload_len =
            u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as u64;

        if kind == EntryKind::Tombstone && payload_len != 0 {
            return Err(QueueError::log_corruption(format!(
                "tombstone with payload length {payload_len} at offset {start}"
            )));
        }

        if remaining - (HEADER_SIZE as u64) < payload_len {
            // Torn write cut off mid-payload: tolerated tail.
            self.finished = true;
            return Ok(None);
        }

        let entry = match kind {
            EntryKind::Tombstone => Entry::Tombstone,
            EntryKind::Record => {
                let payload = self
                    .backend
                    .read_at(start + HEADER_SIZE as u64, payload_len as usize)?;
                Entry::Record(payload)
            }
        };

        self.offset = start + HEADER_SIZE as u64 + payload_len;
        Ok(Some((start, entry)))
    }
}

impl Iterator for EntryIter<'_> {
    type Item = QueueResult<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Appends one entry and makes it durable before returning.
///
/// Returns the offset where the entry was written. The flush-then-sync
/// pair guarantees the entry is on stable storage when this returns;
/// callers must not mutate in-memory state before that.
///
/// # Errors
///
/// Returns an error if encoding, appending, or syncing fails.
pub fn append_entry(backend: &mut dyn StorageBackend, entry: &Entry) -> QueueResult<u64> {
    let bytes = entry.encode()?;
    let offset = backend.append(&bytes)?;
    backend.flush()?;
    backend.sync()?;
    Ok(offset)
}
