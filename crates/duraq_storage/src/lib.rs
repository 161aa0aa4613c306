//! # duraq storage
//!
//! Storage backend trait and implementations for the duraq queue log.
//!
//! Backends are **opaque byte stores**: they read, append, flush, and
//! truncate bytes. The queue core owns all interpretation of the log
//! format; backends never see entry framing or payloads.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and crash-recovery simulation
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use duraq_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
