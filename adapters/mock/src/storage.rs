use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::Digest;
use trustvote_interface::services::storage::{ContentStorage, PhotoFile};
use trustvote_interface::ContentId;

use crate::MockError;

const MOCK_GATEWAY: &str = "https://gateway.mock";

#[derive(Debug, Default)]
struct StorageState {
    pinned: HashMap<ContentId, PhotoFile>,
    failing_uploads: HashSet<String>,
    failing_resolves: HashSet<ContentId>,
}

/// In-memory content-addressed storage. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    state: Arc<Mutex<StorageState>>,
    uploads: Arc<AtomicUsize>,
}

impl MockStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes uploads of files named `file_name` fail.
    pub fn fail_upload_of(&self, file_name: &str) {
        self.lock().failing_uploads.insert(file_name.to_string());
    }

    /// Lets uploads of `file_name` succeed again.
    pub fn heal_upload_of(&self, file_name: &str) {
        self.lock().failing_uploads.remove(file_name);
    }

    /// Makes resolution of `cid` fail.
    pub fn fail_resolve_of(&self, cid: &ContentId) {
        self.lock().failing_resolves.insert(cid.clone());
    }

    /// Number of upload attempts that reached the store, including failed ones.
    pub fn upload_attempts(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Number of distinct files pinned.
    pub fn pinned_count(&self) -> usize {
        self.lock().pinned.len()
    }

    /// The content address the store assigns to `bytes`.
    pub fn cid_for(bytes: &[u8]) -> ContentId {
        let digest = sha2::Sha256::digest(bytes);
        ContentId(format!("bafkmock{}", hex::encode(&digest[..16])))
    }

    fn lock(&self) -> MutexGuard<'_, StorageState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ContentStorage for MockStorage {
    type Error = MockError;

    async fn upload(&self, file: &PhotoFile) -> Result<ContentId, Self::Error> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.failing_uploads.contains(&file.file_name) {
            return Err(MockError::Upload(file.file_name.clone()));
        }
        let cid = Self::cid_for(&file.bytes);
        state.pinned.insert(cid.clone(), file.clone());
        tracing::debug!(%cid, file = %file.file_name, "Pinned file");
        Ok(cid)
    }

    async fn resolve_url(&self, cid: &ContentId) -> Result<String, Self::Error> {
        let state = self.lock();
        if cid.is_empty() || state.failing_resolves.contains(cid) {
            return Err(MockError::Resolve(cid.to_string()));
        }
        Ok(format!("{MOCK_GATEWAY}/ipfs/{cid}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_and_resolve() {
        let storage = MockStorage::new();
        let file = PhotoFile::new("ada.png", vec![1, 2, 3]);
        let cid = storage.upload(&file).await.unwrap();
        assert_eq!(cid, MockStorage::cid_for(&[1, 2, 3]));
        assert_eq!(
            storage.resolve_url(&cid).await.unwrap(),
            format!("https://gateway.mock/ipfs/{cid}")
        );
        assert_eq!(storage.pinned_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures() {
        let storage = MockStorage::new();
        storage.fail_upload_of("broken.png");
        let err = storage
            .upload(&PhotoFile::new("broken.png", vec![0]))
            .await
            .unwrap_err();
        assert_eq!(err, MockError::Upload("broken.png".to_string()));
        assert_eq!(storage.upload_attempts(), 1);
        assert_eq!(storage.pinned_count(), 0);

        assert!(storage
            .resolve_url(&ContentId(String::new()))
            .await
            .is_err());
        let cid = ContentId("bafkbad".to_string());
        storage.fail_resolve_of(&cid);
        assert!(storage.resolve_url(&cid).await.is_err());
    }
}
