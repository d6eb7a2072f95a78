//! Shared fixtures for resource cache integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use respool_cache::SizedResource;
use respool_common::ByteSize;

/// Counts creations and releases across every resource it produced.
#[derive(Debug, Default)]
pub struct Tracker {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl Tracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Resources created and not yet released.
    pub fn live(&self) -> usize {
        self.created() - self.released()
    }

    /// Factory producing a resource of `bytes` for any key.
    pub fn factory(
        self: &Arc<Self>,
        bytes: u64,
    ) -> impl FnOnce(&String) -> Result<TrackedResource, Infallible> {
        let tracker = Arc::clone(self);
        move |key: &String| Ok(TrackedResource::new(key, ByteSize::from_bytes(bytes), tracker))
    }
}

/// Resource that reports a fixed size and fails loudly if released twice.
#[derive(Debug)]
pub struct TrackedResource {
    key: String,
    size: ByteSize,
    releases: AtomicUsize,
    tracker: Arc<Tracker>,
}

impl TrackedResource {
    pub fn new(key: &str, size: ByteSize, tracker: Arc<Tracker>) -> Self {
        tracker.created.fetch_add(1, Ordering::SeqCst);
        Self { key: key.to_string(), size, releases: AtomicUsize::new(0), tracker }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_released(&self) -> bool {
        self.releases.load(Ordering::SeqCst) > 0
    }
}

impl SizedResource for TrackedResource {
    type Size = ByteSize;

    fn size(&self) -> ByteSize {
        self.size
    }

    fn release(&self) {
        let previous = self.releases.fetch_add(1, Ordering::SeqCst);
        assert_eq!(previous, 0, "resource {} released twice", self.key);
        self.tracker.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory sink for `capture_test_tracing` output.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
