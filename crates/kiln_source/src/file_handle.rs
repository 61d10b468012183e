//! Immutable snapshots of source file content.

use crate::uri::Uri;
use kiln_common::ContentHash;
use std::fmt;
use std::sync::Arc;

/// The stable identity of one version of a file: its name plus a fingerprint
/// of its content.
///
/// Two handles with equal identities have byte-identical content.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FileIdentity {
    /// The file's URI.
    pub uri: Uri,
    /// Hash of the file content.
    pub hash: ContentHash,
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.uri, self.hash)
    }
}

/// The content of one source file at one point in time.
///
/// Handles are obtained from the file source and never change afterwards;
/// an edit produces a new handle with a new identity.
#[derive(Clone)]
pub struct FileHandle {
    identity: FileIdentity,
    content: Arc<[u8]>,
}

impl FileHandle {
    /// Creates a handle for the given content, fingerprinting it.
    pub fn new(uri: Uri, content: impl Into<Arc<[u8]>>) -> Self {
        let content = content.into();
        let hash = ContentHash::from_bytes(&content);
        Self {
            identity: FileIdentity { uri, hash },
            content,
        }
    }

    /// Returns the file's URI.
    pub fn uri(&self) -> &Uri {
        &self.identity.uri
    }

    /// Returns the file's identity.
    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    /// Returns the raw file content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Returns the content as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("uri", &self.identity.uri)
            .field("hash", &self.identity.hash)
            .field("len", &self.content.len())
            .finish()
    }
}
