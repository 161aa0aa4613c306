//! Element codec trait and the default CBOR implementation.

use crate::error::{QueueError, QueueResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Trait for serializing queue elements to and from bytes.
///
/// The queue stores whatever bytes the codec produces and hands them back
/// to `decode` on replay, so the only requirement is that elements
/// round-trip exactly: `decode(encode(e)) == e`.
///
/// The blanket choice for serde types is [`CborCodec`]; implement this
/// trait directly for types with a hand-rolled wire format.
pub trait Codec {
    /// The element type this codec handles.
    type Item;

    /// Encodes an element to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be serialized.
    fn encode(&self, item: &Self::Item) -> QueueResult<Vec<u8>>;

    /// Decodes an element from bytes previously produced by `encode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be deserialized.
    fn decode(&self, bytes: &[u8]) -> QueueResult<Self::Item>;
}

/// CBOR codec for any serde-serializable element type.
///
/// # Example
///
/// ```rust
/// use duraq_core::{CborCodec, Codec};
///
/// let codec = CborCodec::<String>::new();
/// let bytes = codec.encode(&"hello".to_string()).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), "hello");
/// ```
pub struct CborCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> CborCodec<T> {
    /// Creates a new CBOR codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for CborCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CborCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CborCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CborCodec").finish()
    }
}

impl<T> Codec for CborCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Item = T;

    fn encode(&self, item: &T) -> QueueResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(item, &mut buf)
            .map_err(|e| QueueError::codec(e.to_string()))?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> QueueResult<T> {
        ciborium::de::from_reader(bytes).map_err(|e| QueueError::codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Job {
        id: u64,
        name: String,
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = CborCodec::<Job>::new();
        let job = Job {
            id: 7,
            name: "reindex".to_string(),
        };

        let bytes = codec.encode(&job).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(job, decoded);
    }

    #[test]
    fn deterministic_encoding() {
        let codec = CborCodec::<Vec<u32>>::new();
        let value = vec![1, 2, 3];

        assert_eq!(codec.encode(&value).unwrap(), codec.encode(&value).unwrap());
    }

    #[test]
    fn decode_garbage_fails() {
        let codec = CborCodec::<Job>::new();
        let result = codec.decode(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(result, Err(QueueError::Codec { .. })));
    }
}
