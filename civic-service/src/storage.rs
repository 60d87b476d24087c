/// Blob storage boundary for post images
///
/// Uploads go under a generated key and come back with a durable retrieval
/// URL. The hosted bucket is reached through an adapter implementing
/// [`BlobStorage`]; [`MemoryBlobStorage`] is the reference implementation.
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Upload a file under a generated key and return its retrieval URL.
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<StoredBlob>;
}

struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

pub struct MemoryBlobStorage {
    base_url: String,
    objects: DashMap<String, StoredObject>,
}

impl Default for MemoryBlobStorage {
    fn default() -> Self {
        Self::new("https://storage.linkgov.rw")
    }
}

impl MemoryBlobStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: DashMap::new(),
        }
    }

    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        self.objects
            .get(key)
            .map(|object| (object.content_type.clone(), object.bytes.clone()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<StoredBlob> {
        let key = format!("uploads/{}", uuid::Uuid::new_v4());
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        self.objects.insert(
            key.clone(),
            StoredObject {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(StoredBlob { key, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_generates_key_and_durable_url() {
        let storage = MemoryBlobStorage::default();
        let blob = storage
            .upload("image/png", vec![0x89, 0x50, 0x4e, 0x47])
            .await
            .unwrap();

        assert!(blob.key.starts_with("uploads/"));
        assert_eq!(blob.url, format!("https://storage.linkgov.rw/{}", blob.key));

        let (content_type, bytes) = storage.object(&blob.key).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
