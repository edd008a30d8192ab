use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use registry_types::ContentHash;
use thiserror::Error;

/// The durable outcome of a `finish` call, cached so a retried `finish` (the
/// client never saw the first response) returns the same answer instead of
/// re-reading part blobs that have already been deleted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinishedUpload {
    pub blob_name: String,
    pub hash: ContentHash,
    pub size: u64,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum UploadError {
    #[error("upload {0} not found or already finished/aborted")]
    NotFound(String),
    #[error("upload {0} has expired")]
    Expired(String),
    #[error("part {part_number} already has a different committed hash")]
    PartMismatch { part_number: u32 },
    #[error("part size {size} is outside [{min}, {max}]")]
    PartSizeOutOfBounds { size: u64, min: u64, max: u64 },
    #[error("part number {0} meets or exceeds the maximum of {1} parts")]
    TooManyParts(u32, u32),
    #[error("finish supplied {supplied} part hashes but {committed} parts are committed")]
    PartCountMismatch { supplied: usize, committed: usize },
    #[error("finish part hash at index {index} does not match the committed part")]
    PartHashMismatch { index: usize },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartRecord {
    pub hash: ContentHash,
    pub size: u64,
}

#[derive(Clone)]
pub struct Upload {
    pub id: String,
    pub owner: String,
    pub min_part_size: u64,
    pub max_part_size: u64,
    pub max_parts: u32,
    pub expires_at: SystemTime,
}

struct Session {
    upload: Upload,
    parts: BTreeMap<u32, PartRecord>,
    finished: Option<FinishedUpload>,
    aborted: bool,
}

/// Tracks every in-flight multipart upload session. Shared by reference
/// between `ContentStore` and (indirectly) the GC worker, which needs the
/// set of still-referenced part keys.
pub struct MultipartUploadTable {
    sessions: Mutex<std::collections::HashMap<String, Session>>,
}

impl Default for MultipartUploadTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartUploadTable {
    pub fn new() -> Self {
        MultipartUploadTable {
            sessions: Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn create(
        &self,
        owner: String,
        expiry_secs: u64,
        min_part_size: u64,
        max_part_size: u64,
        max_parts: u32,
    ) -> Upload {
        let id = format!("{:032x}", rand::random::<u128>());
        let upload = Upload {
            id: id.clone(),
            owner,
            min_part_size,
            max_part_size,
            max_parts,
            expires_at: SystemTime::now() + Duration::from_secs(expiry_secs),
        };
        self.sessions.lock().insert(
            id,
            Session {
                upload: upload.clone(),
                parts: BTreeMap::new(),
                finished: None,
                aborted: false,
            },
        );
        upload
    }

    pub fn put_part(
        &self,
        upload_id: &str,
        part_number: u32,
        hash: ContentHash,
        size: u64,
    ) -> Result<(), UploadError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| UploadError::NotFound(upload_id.to_string()))?;
        if session.finished.is_some() || session.aborted {
            return Err(UploadError::NotFound(upload_id.to_string()));
        }
        if SystemTime::now() > session.upload.expires_at {
            return Err(UploadError::Expired(upload_id.to_string()));
        }
        if part_number >= session.upload.max_parts {
            return Err(UploadError::TooManyParts(part_number, session.upload.max_parts));
        }
        if size > session.upload.max_part_size {
            return Err(UploadError::PartSizeOutOfBounds {
                size,
                min: session.upload.min_part_size,
                max: session.upload.max_part_size,
            });
        }
        if let Some(existing) = session.parts.get(&part_number) {
            if existing.hash != hash || existing.size != size {
                return Err(UploadError::PartMismatch { part_number });
            }
            return Ok(());
        }
        session.parts.insert(part_number, PartRecord { hash, size });
        Ok(())
    }

    /// Validates the supplied hash list against the committed parts and
    /// returns them in order. Does not mutate session state; the caller
    /// marks the session finished only after the blob has actually been
    /// written, so a crash mid-concatenation leaves the session retryable.
    pub fn finish(
        &self,
        upload_id: &str,
        part_hashes: &[ContentHash],
    ) -> Result<Vec<(u32, PartRecord)>, UploadError> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(upload_id)
            .ok_or_else(|| UploadError::NotFound(upload_id.to_string()))?;
        if session.aborted {
            return Err(UploadError::NotFound(upload_id.to_string()));
        }

        let ordered: Vec<(u32, PartRecord)> = session
            .parts
            .iter()
            .map(|(n, r)| (*n, r.clone()))
            .collect();

        if ordered.len() != part_hashes.len() {
            return Err(UploadError::PartCountMismatch {
                supplied: part_hashes.len(),
                committed: ordered.len(),
            });
        }
        // Parts must be contiguous from 0 with no gaps (no rearrangement).
        for (expected_index, (part_number, record)) in ordered.iter().enumerate() {
            if *part_number as usize != expected_index {
                return Err(UploadError::PartCountMismatch {
                    supplied: part_hashes.len(),
                    committed: ordered.len(),
                });
            }
            if record.hash != part_hashes[expected_index] {
                return Err(UploadError::PartHashMismatch {
                    index: expected_index,
                });
            }
        }
        // Every part but the last must satisfy the minimum part size.
        for (index, (_, record)) in ordered.iter().enumerate() {
            let is_last = index + 1 == ordered.len();
            if !is_last && record.size < session.upload.min_part_size {
                return Err(UploadError::PartSizeOutOfBounds {
                    size: record.size,
                    min: session.upload.min_part_size,
                    max: session.upload.max_part_size,
                });
            }
        }
        Ok(ordered)
    }

    /// Returns the cached result of a previous `finish` call, if any, so a
    /// retried finish can skip re-reading (now-deleted) part blobs.
    pub fn finished_result(&self, upload_id: &str) -> Result<Option<FinishedUpload>, UploadError> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(upload_id)
            .ok_or_else(|| UploadError::NotFound(upload_id.to_string()))?;
        Ok(session.finished.clone())
    }

    pub fn mark_finished(&self, upload_id: &str, result: FinishedUpload) -> Result<(), UploadError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| UploadError::NotFound(upload_id.to_string()))?;
        session.finished = Some(result);
        Ok(())
    }

    /// Aborts a session, returning the part numbers that were committed so
    /// the caller can delete their backing blobs.
    pub fn abort(&self, upload_id: &str) -> Result<Vec<u32>, UploadError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| UploadError::NotFound(upload_id.to_string()))?;
        session.aborted = true;
        Ok(session.parts.keys().copied().collect())
    }

    /// All upload-ids not yet expired — part of the GC reference set
    /// (SPEC_FULL.md §4.1 GC).
    pub fn live_upload_ids(&self) -> Vec<String> {
        let sessions = self.sessions.lock();
        let now = SystemTime::now();
        sessions
            .values()
            .filter(|s| !s.aborted && s.finished.is_none() && s.upload.expires_at > now)
            .map(|s| s.upload.id.clone())
            .collect()
    }

    /// Upload-ids whose expiry has passed and which were never finished or
    /// aborted; their part blobs are orphans the GC worker should reclaim.
    pub fn expired_upload_ids(&self) -> Vec<String> {
        let sessions = self.sessions.lock();
        let now = SystemTime::now();
        sessions
            .values()
            .filter(|s| s.finished.is_none() && !s.aborted && s.upload.expires_at <= now)
            .map(|s| s.upload.id.clone())
            .collect()
    }

    /// Removes an expired session, returning the part numbers that were
    /// committed so the caller can delete their backing blobs (mirrors
    /// `abort`; an expired upload's parts are orphans just like an aborted
    /// one's).
    pub fn reap_expired(&self, upload_id: &str) -> Vec<u32> {
        match self.sessions.lock().remove(upload_id) {
            Some(session) => session.parts.keys().copied().collect(),
            None => Vec::new(),
        }
    }
}
