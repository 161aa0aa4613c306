//! The durable FIFO queue engine.

use crate::codec::{CborCodec, Codec};
use crate::entry::Entry;
use crate::error::{QueueError, QueueResult};
use crate::log::{append_entry, EntryIter};
use duraq_storage::{FileBackend, StorageBackend};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of removes between log compactions.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 50;

/// Suffix appended to the log path for the compaction temp file.
const COMPACT_SUFFIX: &str = ".compact";

/// In-memory state guarded by the instance lock.
struct QueueState<E> {
    /// Ordered live elements, always equal to the log replayed in order.
    mirror: VecDeque<E>,
    /// Removes executed since the last compaction.
    removes_since_compaction: usize,
}

/// A durable FIFO queue backed by an append-only log file.
///
/// Every mutation is written to the log and synced to stable storage
/// before the in-memory state changes, so queue contents survive process
/// and machine crashes. Reopening the same path replays the log and
/// reconstructs the queue exactly as of the last acknowledged operation.
///
/// Removal is recorded by appending a tombstone entry rather than
/// rewriting the file; after [`compaction_threshold`](Self::compaction_threshold)
/// removes, the log is compacted down to the live elements.
///
/// # Durability caveat
///
/// Compaction replaces the log by deleting the original file and renaming
/// the freshly written temp file into its place. A crash between the
/// delete and the rename loses the entire log. This is the one window in
/// which acknowledged data can be lost; every other crash point recovers
/// to the last acknowledged operation.
///
/// # Concurrency
///
/// All operations take a single instance-wide lock; at most one executes
/// at a time. Sharing the same backing file between two queue instances
/// or processes is unsupported and corrupts the log.
///
/// # Example
///
/// ```no_run
/// use duraq_core::PersistentQueue;
///
/// let queue: PersistentQueue<String> = PersistentQueue::open("jobs.queue").unwrap();
/// queue.add("first".to_string()).unwrap();
/// assert_eq!(queue.remove().unwrap(), Some("first".to_string()));
/// ```
pub struct PersistentQueue<E, C = CborCodec<E>> {
    path: PathBuf,
    codec: C,
    compaction_threshold: usize,
    state: Mutex<QueueState<E>>,
}

impl<E> PersistentQueue<E, CborCodec<E>>
where
    E: Serialize + DeserializeOwned,
{
    /// Opens a queue at `path` with the default compaction threshold and
    /// the CBOR codec.
    ///
    /// If no file exists at `path`, an empty log is created. An existing
    /// file is replayed in full before the queue accepts operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created, or if
    /// replay encounters corruption (see [`EntryIter`] for the recovery
    /// policy).
    pub fn open(path: impl AsRef<Path>) -> QueueResult<Self> {
        Self::with_codec(path, DEFAULT_COMPACTION_THRESHOLD, CborCodec::new())
    }

    /// Opens a queue with an explicit compaction threshold.
    ///
    /// The threshold is the number of removes between compactions;
    /// `1` compacts on every remove, large values trade log growth for
    /// fewer rewrites.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidThreshold`] if `threshold` is zero,
    /// otherwise as [`Self::open`].
    pub fn open_with_threshold(
        path: impl AsRef<Path>,
        threshold: usize,
    ) -> QueueResult<Self> {
        Self::with_codec(path, threshold, CborCodec::new())
    }
}

impl<E, C> PersistentQueue<E, C>
where
    C: Codec<Item = E>,
{
    /// Opens a queue with an explicit threshold and codec.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidThreshold`] if `threshold` is zero,
    /// an I/O error if the log cannot be opened or created, or a
    /// corruption error if replay fails.
    pub fn with_codec(
        path: impl AsRef<Path>,
        threshold: usize,
        codec: C,
    ) -> QueueResult<Self> {
        if threshold == 0 {
            return Err(QueueError::InvalidThreshold { value: threshold });
        }

        let path = path.as_ref().to_path_buf();

        // Open-or-create, then replay whatever is there. The handle is
        // dropped before the queue accepts operations.
        let mut backend = FileBackend::open(&path)?;
        let mirror = Self::replay(&mut backend, &codec)?;
        drop(backend);

        debug!(
            path = %path.display(),
            live = mirror.len(),
            "opened persistent queue"
        );

        Ok(Self {
            path,
            codec,
            compaction_threshold: threshold,
            state: Mutex::new(QueueState {
                mirror,
                removes_since_compaction: 0,
            }),
        })
    }

    /// Rebuilds the mirror by applying every complete log entry in order.
    ///
    /// A torn trailing entry is cut off the file afterwards, so later
    /// appends land directly after the last good entry instead of behind
    /// bytes the next replay would stop at or mis-frame.
    fn replay(backend: &mut FileBackend, codec: &C) -> QueueResult<VecDeque<E>> {
        let mut mirror = VecDeque::new();

        let mut iter = EntryIter::new(&*backend)?;
        for result in iter.by_ref() {
            let (offset, entry) = result?;
            match entry {
                Entry::Record(payload) => {
                    let element = codec.decode(&payload).map_err(|e| {
                        QueueError::log_corruption(format!(
                            "undecodable record at offset {offset}: {e}"
                        ))
                    })?;
                    mirror.push_back(element);
                }
                Entry::Tombstone => {
                    if mirror.pop_front().is_none() {
                        return Err(QueueError::log_corruption(format!(
                            "tombstone at offset {offset} with no live record before it"
                        )));
                    }
                }
            }
        }

        let log_end = iter.offset();
        drop(iter);

        let file_size = backend.size()?;
        if log_end < file_size {
            debug!(
                discarded = file_size - log_end,
                offset = log_end,
                "truncating torn log tail"
            );
            backend.truncate(log_end)?;
        }

        Ok(mirror)
    }

    /// Appends an element to the tail of the queue.
    ///
    /// The element is serialized, appended to the log, and synced to
    /// stable storage before the in-memory queue changes. Adding never
    /// triggers compaction.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the durable append fails; the
    /// queue contents are unchanged in that case.
    pub fn add(&self, element: E) -> QueueResult<()> {
        let mut state = self.state.lock();

        let payload = self.codec.encode(&element)?;
        let entry = Entry::Record(payload);

        let mut backend = FileBackend::open(&self.path)?;
        append_entry(&mut backend, &entry)?;
        drop(backend);

        state.mirror.push_back(element);
        Ok(())
    }

    /// Removes and returns the head of the queue, or `None` if empty.
    ///
    /// The removal is made durable either by appending a tombstone entry
    /// or, every [`compaction_threshold`](Self::compaction_threshold)
    /// removes, by compacting the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable step fails. The element has
    /// already left the in-memory queue at that point; the log catches
    /// up on the next successful operation or on replay after reopening.
    pub fn remove(&self) -> QueueResult<Option<E>> {
        let mut state = self.state.lock();

        let Some(element) = state.mirror.pop_front() else {
            return Ok(None);
        };

        state.removes_since_compaction += 1;
        if state.removes_since_compaction >= self.compaction_threshold {
            self.rewrite_log(&state.mirror)?;
            state.removes_since_compaction = 0;
        } else {
            let mut backend = FileBackend::open(&self.path)?;
            append_entry(&mut backend, &Entry::Tombstone)?;
        }

        Ok(Some(element))
    }

    /// Returns a copy of the head of the queue without removing it, or
    /// `None` if the queue is empty. Performs no I/O.
    pub fn peek(&self) -> Option<E>
    where
        E: Clone,
    {
        self.state.lock().mirror.front().cloned()
    }

    /// Returns the number of elements in the queue. Performs no I/O.
    pub fn size(&self) -> usize {
        self.state.lock().mirror.len()
    }

    /// Returns true if the queue contains no elements. Performs no I/O.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes all elements and rewrites the log to an empty file.
    ///
    /// Resets the compaction counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails; the in-memory queue has
    /// already been emptied at that point.
    pub fn clear(&self) -> QueueResult<()> {
        let mut state = self.state.lock();

        state.mirror.clear();
        self.rewrite_log(&state.mirror)?;
        state.removes_since_compaction = 0;

        Ok(())
    }

    /// Rewrites the log to contain exactly the surviving elements, with
    /// no tombstones.
    ///
    /// The survivors are written to a temp file which is synced and
    /// closed, then swapped into place by deleting the original and
    /// renaming the temp file. A crash between those two steps loses the
    /// log; on rename failure the temp file is left behind and no
    /// rollback is attempted.
    fn rewrite_log(&self, mirror: &VecDeque<E>) -> QueueResult<()> {
        let temp_path = compact_path(&self.path);

        {
            let mut backend = FileBackend::create(&temp_path)?;
            for element in mirror {
                let payload = self.codec.encode(element)?;
                let bytes = Entry::Record(payload).encode()?;
                backend.append(&bytes)?;
            }
            backend.flush()?;
            backend.sync()?;
        }

        fs::remove_file(&self.path)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            live = mirror.len(),
            "compacted queue log"
        );

        Ok(())
    }

    /// Returns the path of the backing log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of removes between compactions.
    #[must_use]
    pub fn compaction_threshold(&self) -> usize {
        self.compaction_threshold
    }
}

impl<E, C> std::fmt::Debug for PersistentQueue<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentQueue")
            .field("path", &self.path)
            .field("compaction_threshold", &self.compaction_threshold)
            .finish_non_exhaustive()
    }
}

/// Returns the temp-file path used while compacting `path`.
fn compact_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(COMPACT_SUFFIX);
    PathBuf::from(name)
}
