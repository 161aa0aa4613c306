//! Log entry types and framing.

use crate::error::{QueueError, QueueResult};

/// Size of the entry header: tag (1) + payload length (4).
pub const HEADER_SIZE: usize = 5;

/// Discriminant tag for a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryKind {
    /// A live queue element with a serialized payload.
    Record = 1,
    /// Marks the oldest surviving record before this point as deleted.
    /// Carries no payload.
    Tombstone = 2,
}

impl EntryKind {
    /// Converts a byte to an entry kind.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Record),
            2 => Some(Self::Tombstone),
            _ => None,
        }
    }

    /// Converts the entry kind to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A single entry in the queue log.
///
/// ## Wire format
///
/// ```text
/// | tag (1) | payload_len (4, LE) | payload (N) |
/// ```
///
/// Tombstones always frame a zero-length payload. There is no magic,
/// version byte, or checksum; entries are self-delimiting through the
/// length field alone, so a log can be read back in arbitrary-sized
/// chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// One serialized queue element.
    Record(Vec<u8>),
    /// A logical deletion of the current front element.
    Tombstone,
}

impl Entry {
    /// Maximum payload size framable by the 4-byte length field.
    pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize;

    /// Returns the entry's discriminant tag.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Record(_) => EntryKind::Record,
            Self::Tombstone => EntryKind::Tombstone,
        }
    }

    /// Returns the payload bytes (empty for tombstones).
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Record(payload) => payload,
            Self::Tombstone => &[],
        }
    }

    /// Serializes the entry with its framing header.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PayloadTooLarge`] if the payload exceeds
    /// [`Self::MAX_PAYLOAD_SIZE`].
    pub fn encode(&self) -> QueueResult<Vec<u8>> {
        let payload = self.payload();
        let len = u32::try_from(payload.len()).map_err(|_| QueueError::PayloadTooLarge {
            len: payload.len(),
        })?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.push(self.kind().as_byte());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(payload);
        Ok(buf)
    }

    /// Returns the encoded size of the entry including its header.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [EntryKind::Record, EntryKind::Tombstone] {
            assert_eq!(EntryKind::from_byte(kind.as_byte()), Some(kind));
        }
        assert_eq!(EntryKind::from_byte(0), None);
        assert_eq!(EntryKind::from_byte(3), None);
    }

    #[test]
    fn record_framing() {
        let entry = Entry::Record(vec![0xCA, 0xFE, 0xBA, 0xBE]);
        let bytes = entry.encode().unwrap();

        assert_eq!(bytes.len(), entry.encoded_len());
        assert_eq!(bytes[0], EntryKind::Record.as_byte());
        assert_eq!(u32::from_le_bytes(bytes[1..5].try_into().unwrap()), 4);
        assert_eq!(&bytes[5..], &[0xCA, 0xFE, 0xBA, 0xBE]);
    }

    #[test]
    fn tombstone_framing() {
        let bytes = Entry::Tombstone.encode().unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[0], EntryKind::Tombstone.as_byte());
        assert_eq!(u32::from_le_bytes(bytes[1..5].try_into().unwrap()), 0);
    }

    #[test]
    fn empty_record_payload() {
        let entry = Entry::Record(Vec::new());
        let bytes = entry.encode().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[0], EntryKind::Record.as_byte());
    }
}
