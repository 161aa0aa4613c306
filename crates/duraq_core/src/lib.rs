//! # duraq core
//!
//! A durable FIFO queue: an ordered collection whose contents survive
//! process and machine crashes.
//!
//! The queue keeps its state in a single append-only log file. Adding an
//! element appends a record entry; removing one appends a tombstone entry
//! instead of rewriting the file. Every durable write is synced before the
//! operation is acknowledged. After a configurable number of removes the
//! log is compacted down to the live elements, reclaiming the space held
//! by tombstones and deleted records.
//!
//! On open, an existing log is replayed entry-by-entry to reconstruct the
//! in-memory queue; a torn trailing entry left by a crash mid-write is
//! discarded, while anything else malformed aborts the open as corruption.
//!
//! ```no_run
//! use duraq_core::PersistentQueue;
//!
//! let queue: PersistentQueue<String> = PersistentQueue::open("jobs.queue")?;
//! queue.add("first".to_string())?;
//! queue.add("second".to_string())?;
//! assert_eq!(queue.remove()?, Some("first".to_string()));
//! # Ok::<(), duraq_core::QueueError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod entry;
mod error;
mod log;
mod queue;

pub use codec::{CborCodec, Codec};
pub use entry::{Entry, EntryKind, HEADER_SIZE};
pub use error::{QueueError, QueueResult};
pub use log::{append_entry, EntryIter};
pub use queue::{PersistentQueue, DEFAULT_COMPACTION_THRESHOLD};
