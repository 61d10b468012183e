//! An in-memory file source.

use kiln_cache::{CacheError, FileSource};
use kiln_common::{CancelReason, CancelToken, Cancelled};
use kiln_source::{FileHandle, Uri};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// File contents held in memory, with hooks for simulated failures.
#[derive(Default)]
pub struct MemoryFiles {
    contents: Mutex<HashMap<Uri, Arc<[u8]>>>,
    failing: Mutex<HashSet<Uri>>,
    cancelling: Mutex<HashSet<Uri>>,
    fetches: AtomicUsize,
}

impl MemoryFiles {
    /// Creates an empty file source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the content of `uri`.
    pub fn set(&self, uri: Uri, content: &str) {
        self.contents
            .lock()
            .unwrap()
            .insert(uri, Arc::from(content.as_bytes()));
    }

    /// Makes every fetch of `uri` fail with a read error.
    pub fn fail(&self, uri: Uri) {
        self.failing.lock().unwrap().insert(uri);
    }

    /// Makes every fetch of `uri` cancel the requesting token.
    pub fn cancel_on(&self, uri: Uri) {
        self.cancelling.lock().unwrap().insert(uri);
    }

    /// Returns how many fetches have been made.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl FileSource for MemoryFiles {
    fn get_file(&self, uri: &Uri, cancel: &CancelToken) -> Result<FileHandle, CacheError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.cancelling.lock().unwrap().contains(uri) {
            cancel.cancel();
            return Err(CacheError::Cancelled(Cancelled {
                reason: CancelReason::Cancelled,
            }));
        }
        cancel.check()?;
        if self.failing.lock().unwrap().contains(uri) {
            return Err(CacheError::FileRead {
                uri: uri.clone(),
                reason: "simulated read failure".to_string(),
            });
        }
        let contents = self.contents.lock().unwrap();
        match contents.get(uri) {
            Some(content) => Ok(FileHandle::new(uri.clone(), Arc::clone(content))),
            None => Err(CacheError::FileRead {
                uri: uri.clone(),
                reason: "no such file".to_string(),
            }),
        }
    }
}
